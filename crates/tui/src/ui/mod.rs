pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::app::{AppState, FileFocus, Route, Section};

use components::hints::{KeyHint, common, hint_separator, hints_to_spans};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    let theme = Theme::default();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background).fg(theme.text)),
        area,
    );

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tab bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(frame, layout[1], state.section(), &theme);

    let content = layout[2];
    match state.route {
        Route::Form(_) => {
            if let Some(form) = &state.form {
                screens::form::render(frame, content, form);
            }
        }
        Route::Section(Section::Files) => screens::files::render(frame, content, &state.files),
        Route::Section(_) => {
            if let Some(screen) = state.active_list() {
                screens::list::render(frame, content, screen, &state.timezone);
            }
        }
    }

    render_bottom_bar(frame, layout[3], state, &theme);
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled("API", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("Route", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.location())),
        Span::styled("TZ", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}", state.timezone.name())),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = components::tabs::tab_shortcuts(theme);

    let context = context_hints(state);
    if !context.is_empty() {
        parts.push(hint_separator(theme));
        parts.extend(hints_to_spans(&context, theme));
    }

    parts.push(hint_separator(theme));
    parts.extend(hints_to_spans(&[KeyHint::new("q", "quit")], theme));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

/// Keyboard hints for the current screen and mode.
fn context_hints(state: &AppState) -> Vec<KeyHint> {
    match state.route {
        Route::Form(_) => common::FORM.to_vec(),
        Route::Section(Section::Files) => {
            let mut hints = common::FILES.to_vec();
            if state.files.focus == FileFocus::Path {
                hints.push(KeyHint::new("Esc", "leave path"));
            }
            hints
        }
        Route::Section(section) => {
            if state
                .active_list()
                .is_some_and(|screen| screen.filters.is_active())
            {
                return common::FILTER.to_vec();
            }
            let mut hints = common::LIST.to_vec();
            match section.forms().len() {
                0 => {}
                1 => hints.extend_from_slice(common::CREATE),
                _ => hints.extend_from_slice(common::CREATE_TWO),
            }
            if section.edit_form().is_some() {
                hints.extend_from_slice(common::EDIT);
            }
            hints
        }
    }
}
