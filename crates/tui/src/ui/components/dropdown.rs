use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};

use crate::{
    app::disclosure::{Disclosure, DropdownOption},
    ui::theme::Theme,
};

const MAX_VISIBLE: u16 = 10;

/// Draws an open popover just below `anchor`; a closed one draws nothing.
pub fn render(
    frame: &mut Frame<'_>,
    anchor: Rect,
    bounds: Rect,
    title: &str,
    disclosure: &Disclosure<DropdownOption>,
    theme: &Theme,
) {
    if !disclosure.is_open() {
        return;
    }

    let options = disclosure.options();
    let longest = options
        .iter()
        .map(|option| option.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(title.len()) as u16;
    let width = (longest + 6).min(bounds.width);
    let height = (options.len() as u16).min(MAX_VISIBLE) + 2;
    let y = (anchor.y + anchor.height).min(bounds.bottom().saturating_sub(height));
    let x = anchor.x.min(bounds.right().saturating_sub(width));
    let rect = Rect {
        x,
        y,
        width,
        height: height.min(bounds.height),
    };

    let items = options
        .iter()
        .map(|option| ListItem::new(Line::from(option.label.clone())))
        .collect::<Vec<_>>();
    let mut state = ListState::default();
    state.select(disclosure.highlighted_index());

    let list = List::new(items)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .style(Style::default().bg(theme.panel).fg(theme.text))
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    frame.render_widget(Clear, rect);
    frame.render_stateful_widget(list, rect, &mut state);
}
