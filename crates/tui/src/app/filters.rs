//! Filter bar of a list screen, driven by the screen's manifest.
use api_types::reference::{ReferenceKind, ReferenceOption};
use engine::{
    FilterManifest, FilterValue, Query,
    query::{FilterField, FilterKind},
};

use crate::app::disclosure::{Disclosure, DropdownOption};

/// What the bar wants the screen to do after a key.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEvent {
    None,
    Apply {
        key: &'static str,
        value: Option<FilterValue>,
    },
    /// The focused field needs its reference options loaded.
    LoadOptions(ReferenceKind),
}

#[derive(Debug)]
pub struct FilterBar {
    manifest: FilterManifest,
    active: bool,
    focus: usize,
    input: String,
    dropdown: Disclosure<DropdownOption>,
    error: Option<String>,
}

impl FilterBar {
    pub fn new(manifest: FilterManifest) -> Self {
        Self {
            manifest,
            active: false,
            focus: 0,
            input: String::new(),
            dropdown: Disclosure::default(),
            error: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn fields(&self) -> &'static [FilterField] {
        self.manifest.fields()
    }

    pub fn focused(&self) -> Option<&'static FilterField> {
        self.manifest.fields().get(self.focus)
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn dropdown(&self) -> &Disclosure<DropdownOption> {
        &self.dropdown
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Starts editing; returns `false` when the screen has no filters.
    pub fn open(&mut self, query: &Query) -> bool {
        if self.manifest.fields().is_empty() {
            return false;
        }
        self.active = true;
        self.load_input(query);
        true
    }

    pub fn close(&mut self) {
        self.active = false;
        self.dropdown.focus_lost();
        self.error = None;
    }

    /// Esc closes the popover first, then the bar.
    pub fn cancel(&mut self) {
        if self.dropdown.is_open() {
            self.dropdown.close();
        } else {
            self.close();
        }
    }

    pub fn focus_next(&mut self, query: &Query) {
        self.move_focus(1, query);
    }

    pub fn focus_previous(&mut self, query: &Query) {
        let len = self.manifest.fields().len();
        self.move_focus(len.saturating_sub(1), query);
    }

    pub fn up(&mut self, query: &Query) {
        if self.dropdown.is_open() {
            self.dropdown.highlight_previous();
        } else {
            self.focus_previous(query);
        }
    }

    pub fn down(&mut self, query: &Query) {
        if self.dropdown.is_open() {
            self.dropdown.highlight_next();
        } else {
            self.focus_next(query);
        }
    }

    pub fn type_char(&mut self, ch: char) {
        if self.takes_text() {
            self.input.push(ch);
            self.error = None;
        }
    }

    pub fn backspace(&mut self) {
        if self.takes_text() {
            self.input.pop();
            self.error = None;
        }
    }

    /// Enter: applies typed input, opens the option list, or picks from it.
    pub fn submit(&mut self) -> FilterEvent {
        let Some(field) = self.focused() else {
            return FilterEvent::None;
        };

        if self.dropdown.is_open() {
            let Some(option) = self.dropdown.choose() else {
                return FilterEvent::None;
            };
            self.input = option.value.clone();
            return self.parse(field, &option.value);
        }

        match field.kind {
            FilterKind::Choice(values) => {
                let mut options = vec![DropdownOption::any()];
                options.extend(values.iter().map(|value| DropdownOption::new(*value, *value)));
                self.dropdown.open(options);
                FilterEvent::None
            }
            FilterKind::Reference(kind) => FilterEvent::LoadOptions(kind),
            _ => {
                let raw = self.input.clone();
                self.parse(field, &raw)
            }
        }
    }

    /// Reference options arrived for the focused field.
    pub fn show_options(&mut self, kind: ReferenceKind, options: &[ReferenceOption]) {
        if !matches!(self.focused().map(|f| f.kind), Some(FilterKind::Reference(k)) if k == kind)
        {
            return;
        }
        let mut entries = vec![DropdownOption::any()];
        entries.extend(
            options
                .iter()
                .map(|option| DropdownOption::new(option.id.to_string(), option.name.clone())),
        );
        self.dropdown.open(entries);
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    fn parse(&mut self, field: &'static FilterField, raw: &str) -> FilterEvent {
        match self.manifest.parse(field.key, raw) {
            Ok(value) => {
                self.error = None;
                FilterEvent::Apply {
                    key: field.key,
                    value,
                }
            }
            Err(err) => {
                self.error = Some(err.to_string());
                FilterEvent::None
            }
        }
    }

    fn takes_text(&self) -> bool {
        !self.dropdown.is_open()
            && self.focused().is_some_and(|field| {
                !matches!(field.kind, FilterKind::Choice(_) | FilterKind::Reference(_))
            })
    }

    fn move_focus(&mut self, step: usize, query: &Query) {
        let len = self.manifest.fields().len();
        if len == 0 {
            return;
        }
        self.dropdown.focus_lost();
        self.focus = (self.focus + step) % len;
        self.error = None;
        self.load_input(query);
    }

    fn load_input(&mut self, query: &Query) {
        self.input = self
            .focused()
            .and_then(|field| query.filter(field.key))
            .map(FilterValue::to_param)
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use engine::resources;

    use super::*;

    fn bar() -> FilterBar {
        FilterBar::new(resources::ADJUSTMENTS.manifest)
    }

    fn focus_key(bar: &mut FilterBar, key: &str, query: &Query) {
        bar.open(query);
        for _ in 0..bar.fields().len() {
            if bar.focused().map(|f| f.key) == Some(key) {
                return;
            }
            bar.focus_next(query);
        }
        panic!("no filter named {key}");
    }

    #[test]
    fn typed_text_is_parsed_through_the_manifest() {
        let query = Query::default();
        let mut bar = bar();
        focus_key(&mut bar, "fromDate", &query);

        for ch in "2024-13-01".chars() {
            bar.type_char(ch);
        }
        assert_eq!(bar.submit(), FilterEvent::None);
        assert!(bar.error().is_some());

        bar.backspace();
        bar.backspace();
        bar.backspace();
        bar.backspace();
        bar.backspace();
        for ch in "03-01".chars() {
            bar.type_char(ch);
        }
        let FilterEvent::Apply { key, value } = bar.submit() else {
            panic!("expected a filter");
        };
        assert_eq!(key, "fromDate");
        assert_eq!(value.map(|v| v.to_param()).as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn choice_fields_pick_from_a_popover() {
        let query = Query::default();
        let mut bar = bar();
        focus_key(&mut bar, "status", &query);

        bar.type_char('x');
        assert_eq!(bar.input(), "");
        assert_eq!(bar.submit(), FilterEvent::None);
        assert!(bar.dropdown().is_open());

        bar.down(&query);
        let event = bar.submit();
        assert_eq!(
            event,
            FilterEvent::Apply {
                key: "status",
                value: Some(FilterValue::from("pending")),
            }
        );
        assert!(!bar.dropdown().is_open());
    }

    #[test]
    fn any_option_clears_the_filter() {
        let query = Query::default();
        let mut bar = bar();
        focus_key(&mut bar, "status", &query);
        bar.submit();
        assert_eq!(
            bar.submit(),
            FilterEvent::Apply {
                key: "status",
                value: None,
            }
        );
    }

    #[test]
    fn reference_fields_ask_for_options() {
        let query = Query::default();
        let mut bar = bar();
        focus_key(&mut bar, "areaOfficeId", &query);

        assert_eq!(
            bar.submit(),
            FilterEvent::LoadOptions(ReferenceKind::AreaOffices)
        );
        bar.show_options(
            ReferenceKind::AreaOffices,
            &[ReferenceOption {
                id: 4,
                name: "Ikeja".to_string(),
            }],
        );
        bar.down(&query);
        assert_eq!(
            bar.submit(),
            FilterEvent::Apply {
                key: "areaOfficeId",
                value: Some(FilterValue::Integer(4)),
            }
        );
    }

    #[test]
    fn moving_focus_closes_the_popover_and_loads_current_value() {
        let mut query = Query::default();
        query.set_filter("accountNumber", Some("0101".into()));
        let mut bar = bar();
        focus_key(&mut bar, "status", &query);
        bar.submit();
        assert!(bar.dropdown().is_open());

        // Up/Down move inside the open popover; Tab moves focus.
        bar.focus_next(&query);
        assert!(!bar.dropdown().is_open());

        focus_key(&mut bar, "accountNumber", &query);
        assert_eq!(bar.input(), "0101");
    }
}
