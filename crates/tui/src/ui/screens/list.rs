use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use engine::query::FilterKind;

use crate::{
    app::{ListScreen, list::TableSnapshot},
    ui::{components::dropdown, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, screen: &ListScreen, tz: &chrono_tz::Tz) {
    let theme = Theme::default();
    let snapshot = screen.snapshot(tz);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, layout[0], screen, &snapshot, &theme);
    render_table(frame, layout[1], screen, &snapshot, &theme);
    render_pagination(frame, layout[2], &snapshot, &theme);

    if let Some(field) = screen.filters.focused() {
        dropdown::render(
            frame,
            layout[0],
            area,
            field.label,
            screen.filters.dropdown(),
            &theme,
        );
    }
}

fn render_header(
    frame: &mut Frame<'_>,
    area: Rect,
    screen: &ListScreen,
    snapshot: &TableSnapshot,
    theme: &Theme,
) {
    let mut title = vec![Span::styled(
        screen.resource.title,
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if snapshot.loading {
        title.push(Span::styled(" loading…", Style::default().fg(theme.warning)));
    }
    if screen.is_polling() {
        title.push(Span::styled(" ⟳ live", Style::default().fg(theme.dim)));
    }

    let line = if screen.filters.is_active() {
        filter_editor_line(screen, theme)
    } else if let Some(error) = &snapshot.error {
        Line::from(Span::styled(
            format!("⚠ {error}"),
            Style::default().fg(theme.error),
        ))
    } else {
        applied_filters_line(snapshot, theme)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Line::from(title));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn applied_filters_line(snapshot: &TableSnapshot, theme: &Theme) -> Line<'static> {
    if snapshot.filters.is_empty() {
        return Line::from(Span::styled(
            "No filters. Press / to filter.",
            Style::default().fg(theme.dim),
        ));
    }
    let mut spans = Vec::new();
    for (key, value) in &snapshot.filters {
        spans.push(Span::styled(format!("{key}="), Style::default().fg(theme.dim)));
        spans.push(Span::raw(format!("{value}  ")));
    }
    Line::from(spans)
}

fn filter_editor_line(screen: &ListScreen, theme: &Theme) -> Line<'static> {
    let bar = &screen.filters;
    let query = screen.query();
    let mut spans = Vec::new();

    for (i, field) in bar.fields().iter().enumerate() {
        let focused = i == bar.focus_index();
        let picked = matches!(field.kind, FilterKind::Choice(_) | FilterKind::Reference(_));
        let value = if focused && !picked {
            format!("{}▏", bar.input())
        } else {
            query
                .filter(field.key)
                .map(|value| value.to_param())
                .unwrap_or_else(|| "any".to_string())
        };
        let label_style = if focused {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim)
        };
        spans.push(Span::styled(format!("{}: ", field.label), label_style));
        spans.push(Span::raw(format!("{value}   ")));
    }

    if let Some(error) = bar.error() {
        spans.push(Span::styled(error.to_string(), Style::default().fg(theme.error)));
    }
    Line::from(spans)
}

fn render_table(
    frame: &mut Frame<'_>,
    area: Rect,
    screen: &ListScreen,
    snapshot: &TableSnapshot,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    if snapshot.rows.is_empty() {
        let message = if snapshot.idle || snapshot.loading {
            "Loading…"
        } else if snapshot.error.is_some() {
            "Nothing loaded yet. Press r to retry."
        } else {
            "No records match."
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                message,
                Style::default().fg(theme.dim),
            )))
            .block(block),
            area,
        );
        return;
    }

    // Stale rows stay visible, dimmed, while a newer request is out.
    let row_style = if snapshot.loading || snapshot.error.is_some() {
        Style::default().fg(theme.dim)
    } else {
        Style::default().fg(theme.text)
    };

    let header = Row::new(
        snapshot
            .headers
            .iter()
            .map(|title| Cell::from(*title))
            .collect::<Vec<_>>(),
    )
    .style(
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    );
    let rows = snapshot
        .rows
        .iter()
        .map(|cells| Row::new(cells.iter().cloned().map(Cell::from)).style(row_style));
    let widths = snapshot.headers.iter().map(|_| Constraint::Fill(1));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    let mut state = TableState::default();
    state.select(Some(screen.selected.min(snapshot.rows.len() - 1)));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_pagination(frame: &mut Frame<'_>, area: Rect, snapshot: &TableSnapshot, theme: &Theme) {
    let mut spans = vec![Span::styled(
        format!(
            " Page {}/{} · {} rows · {} per page   ",
            snapshot.current_page,
            snapshot.total_pages.max(1),
            snapshot.total_count,
            snapshot.page_size
        ),
        Style::default().fg(theme.dim),
    )];

    for entry in &snapshot.window {
        match entry {
            Some(page) if *page == snapshot.current_page => spans.push(Span::styled(
                format!("[{page}] "),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Some(page) => spans.push(Span::raw(format!("{page} "))),
            None => spans.push(Span::styled("… ", Style::default().fg(theme.dim))),
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
