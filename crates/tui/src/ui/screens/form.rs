use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use engine::forms::FieldKind;

use crate::{
    app::FormScreen,
    ui::{components::dropdown, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, form: &FormScreen) {
    let theme = Theme::default();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let field_area = render_fields(frame, columns[0], form, &theme);
    render_issues(frame, columns[1], form, &theme);

    if let (Some(field), Some(anchor)) = (form.focused(), field_area) {
        dropdown::render(frame, anchor, area, field.label, form.dropdown(), &theme);
    }
}

/// Draws every field; returns the row of the focused one for the popover.
fn render_fields(
    frame: &mut Frame<'_>,
    area: Rect,
    form: &FormScreen,
    theme: &Theme,
) -> Option<Rect> {
    let view = form.view();
    let mut lines = Vec::new();
    let mut focused_row = None;

    for (i, field) in view.fields().iter().enumerate() {
        let focused = i == form.focus_index();
        if focused {
            focused_row = Some(lines.len() as u16);
        }

        let marker = if focused { "» " } else { "  " };
        let required = if field.required { "*" } else { "" };
        let label_style = if focused {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim)
        };

        let mut value = form.display(field);
        match field.kind {
            FieldKind::Choice(_) | FieldKind::Reference(_) => {
                if value.is_empty() {
                    value = "(press Enter to choose)".to_string();
                }
            }
            FieldKind::Date if value.is_empty() && !focused => value = "YYYY-MM-DD".to_string(),
            _ if focused => value.push('▏'),
            _ => {}
        }

        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{}{required}: ", field.label), label_style),
            Span::styled(value, Style::default().fg(theme.text)),
        ]));
        for issue in view.field_issues(field.key) {
            lines.push(Line::from(Span::styled(
                format!("    {issue}"),
                Style::default().fg(theme.error),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(submit_line(form, theme));
    if let Some(failure) = form.failure() {
        lines.push(Line::from(Span::styled(
            failure.to_string(),
            Style::default().fg(theme.error),
        )));
    }

    let block = Block::default()
        .title(form.heading())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));
    frame.render_widget(Paragraph::new(lines).block(block), area);

    focused_row.map(|row| Rect {
        x: area.x + 2,
        y: area.y + 1 + row,
        width: area.width.saturating_sub(4),
        height: 1,
    })
}

fn submit_line(form: &FormScreen, theme: &Theme) -> Line<'static> {
    let view = form.view();
    if view.is_submitting() {
        Line::from(Span::styled("Saving…", Style::default().fg(theme.warning)))
    } else if view.can_submit() {
        Line::from(Span::styled(
            "Ready: press Enter on a text field to save",
            Style::default().fg(theme.positive),
        ))
    } else {
        Line::from(Span::styled(
            "Save is disabled until every issue is fixed",
            Style::default().fg(theme.dim),
        ))
    }
}

fn render_issues(frame: &mut Frame<'_>, area: Rect, form: &FormScreen, theme: &Theme) {
    let summary = form.view().summary();
    let lines: Vec<Line<'static>> = if summary.is_empty() {
        vec![Line::from(Span::styled(
            "No issues.",
            Style::default().fg(theme.positive),
        ))]
    } else {
        summary
            .into_iter()
            .map(|issue| {
                Line::from(Span::styled(
                    format!("• {issue}"),
                    Style::default().fg(theme.error),
                ))
            })
            .collect()
    };

    let block = Block::default()
        .title("Issues")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}
