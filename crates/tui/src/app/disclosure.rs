//! Transient open/close state of a popover list, shared by every dropdown.

/// One selectable entry of a dropdown. An empty `value` clears the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

impl DropdownOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn any() -> Self {
        Self::new("", "(any)")
    }
}

#[derive(Debug, Clone)]
pub struct Disclosure<T> {
    options: Vec<T>,
    open: bool,
    highlighted: usize,
}

impl<T> Default for Disclosure<T> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            open: false,
            highlighted: 0,
        }
    }
}

impl<T: Clone> Disclosure<T> {
    /// Opens with fresh content; the highlight starts on the first option.
    pub fn open(&mut self, options: Vec<T>) {
        self.options = options;
        self.highlighted = 0;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Closes an open popover, or reopens it with the content it had.
    pub fn toggle(&mut self) {
        self.open = !self.open && !self.options.is_empty();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        (self.open && !self.options.is_empty()).then_some(self.highlighted)
    }

    pub fn highlight_next(&mut self) {
        if self.open && !self.options.is_empty() {
            self.highlighted = (self.highlighted + 1) % self.options.len();
        }
    }

    pub fn highlight_previous(&mut self) {
        if self.open && !self.options.is_empty() {
            let len = self.options.len();
            self.highlighted = (self.highlighted + len - 1) % len;
        }
    }

    /// Picks the highlighted option and closes.
    pub fn choose(&mut self) -> Option<T> {
        let index = self.highlighted_index()?;
        self.open = false;
        self.options.get(index).cloned()
    }

    /// Focus moved elsewhere: an open popover closes without a choice.
    pub fn focus_lost(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses() -> Vec<DropdownOption> {
        vec![
            DropdownOption::any(),
            DropdownOption::new("pending", "pending"),
            DropdownOption::new("approved", "approved"),
        ]
    }

    #[test]
    fn choose_returns_highlighted_and_closes() {
        let mut disclosure = Disclosure::default();
        disclosure.open(statuses());
        disclosure.highlight_next();
        disclosure.highlight_next();

        let chosen = disclosure.choose().unwrap();
        assert_eq!(chosen.value, "approved");
        assert!(!disclosure.is_open());
        assert!(disclosure.choose().is_none());
    }

    #[test]
    fn highlight_wraps_both_ways() {
        let mut disclosure = Disclosure::default();
        disclosure.open(statuses());
        disclosure.highlight_previous();
        assert_eq!(disclosure.highlighted_index(), Some(2));
        disclosure.highlight_next();
        assert_eq!(disclosure.highlighted_index(), Some(0));
    }

    #[test]
    fn focus_loss_closes_without_choosing() {
        let mut disclosure = Disclosure::default();
        disclosure.open(statuses());
        disclosure.focus_lost();
        assert!(!disclosure.is_open());
        assert_eq!(disclosure.highlighted_index(), None);

        disclosure.toggle();
        assert!(disclosure.is_open());
        disclosure.toggle();
        assert!(!disclosure.is_open());
    }

    #[test]
    fn empty_popover_never_opens_on_toggle() {
        let mut disclosure: Disclosure<DropdownOption> = Disclosure::default();
        disclosure.toggle();
        assert!(!disclosure.is_open());
        assert!(disclosure.choose().is_none());
    }
}
