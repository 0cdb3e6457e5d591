use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

/// Converts a list of key hints into styled spans for rendering.
pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

/// Creates a separator span for dividing hint groups.
pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

/// Hint groups per screen mode.
pub mod common {
    use super::KeyHint;

    pub const LIST: &[KeyHint] = &[
        KeyHint::new("n/p", "page"),
        KeyHint::new("[/]", "size"),
        KeyHint::new("r", "refresh"),
        KeyHint::new("x", "reset"),
        KeyHint::new("/", "filter"),
        KeyHint::new("↑↓", "select"),
    ];

    pub const CREATE: &[KeyHint] = &[KeyHint::new("a", "add")];

    pub const CREATE_TWO: &[KeyHint] = &[KeyHint::new("a", "add role"), KeyHint::new("A", "add admin")];

    pub const EDIT: &[KeyHint] = &[KeyHint::new("e", "edit"), KeyHint::new("d d", "delete")];

    pub const FILTER: &[KeyHint] = &[
        KeyHint::new("Tab", "next"),
        KeyHint::new("Enter", "apply/pick"),
        KeyHint::new("Esc", "close"),
    ];

    pub const FORM: &[KeyHint] = &[
        KeyHint::new("Tab", "next"),
        KeyHint::new("Enter", "save/pick"),
        KeyHint::new("Esc", "back"),
    ];

    pub const FILES: &[KeyHint] = &[
        KeyHint::new("Tab", "field"),
        KeyHint::new("Space", "change"),
        KeyHint::new("Enter", "upload"),
        KeyHint::new("x", "reset"),
    ];
}
