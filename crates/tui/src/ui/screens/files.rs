use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use engine::UploadState;

use crate::{
    app::{FileFocus, FileScreen},
    ui::{components::money::styled_progress_bar, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, files: &FileScreen) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    render_inputs(frame, layout[0], files, &theme);
    render_progress(frame, layout[1], files, &theme);
}

fn field_line(
    label: &'static str,
    value: String,
    focused: bool,
    theme: &Theme,
) -> Line<'static> {
    let style = if focused {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.dim)
    };
    Line::from(vec![
        Span::raw(if focused { "» " } else { "  " }),
        Span::styled(format!("{label}: "), style),
        Span::raw(value),
    ])
}

fn render_inputs(frame: &mut Frame<'_>, area: Rect, files: &FileScreen, theme: &Theme) {
    let path = if files.focus == FileFocus::Path {
        format!("{}▏", files.path)
    } else if files.path.is_empty() {
        "(type a .csv or .tsv path)".to_string()
    } else {
        files.path.clone()
    };
    let confirm = if files.confirm {
        "queue for processing".to_string()
    } else {
        "preview only".to_string()
    };

    let lines = vec![
        field_line("File", path, files.focus == FileFocus::Path, theme),
        field_line(
            "Purpose",
            format!("‹ {} ›", files.purpose().label()),
            files.focus == FileFocus::Purpose,
            theme,
        ),
        field_line("Mode", confirm, files.focus == FileFocus::Confirm, theme),
    ];

    let block = Block::default()
        .title("Bulk upload")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_progress(frame: &mut Frame<'_>, area: Rect, files: &FileScreen, theme: &Theme) {
    let state = files.state();
    let mut lines = vec![Line::from(vec![
        Span::styled("State: ", Style::default().fg(theme.dim)),
        Span::styled(
            state.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];

    match &state {
        UploadState::Idle if files.is_running() => {
            lines.push(Line::from("Reading file…"));
        }
        UploadState::ColumnsExtracted { columns } => {
            lines.push(Line::from(format!("Columns: {}", columns.join(", "))));
        }
        UploadState::IntentCreated { file_id } => {
            lines.push(Line::from(format!("File id: {file_id}")));
        }
        UploadState::Uploading { percent } => {
            lines.push(Line::from(styled_progress_bar(
                u64::from(*percent),
                100,
                30,
                theme,
            )));
        }
        UploadState::Finalized { object_key, .. } => {
            lines.push(Line::from(format!("Stored as {object_key}")));
        }
        UploadState::Processed { queued } => {
            let message = if *queued {
                "Queued. Follow progress under CSV jobs."
            } else {
                "Preview returned; nothing was queued."
            };
            lines.push(Line::from(Span::styled(
                message,
                Style::default().fg(theme.positive),
            )));
        }
        UploadState::Failed { stage, message } => {
            lines.push(Line::from(Span::styled(
                format!("Failed while {}: {message}", stage.label()),
                Style::default().fg(theme.error),
            )));
            if let Some(object_key) = files.object_key() {
                lines.push(Line::from(format!(
                    "The file is stored as {object_key} and can be reprocessed."
                )));
            }
            lines.push(Line::from(Span::styled(
                "Press x to start over.",
                Style::default().fg(theme.dim),
            )));
        }
        UploadState::Idle => {}
    }

    if !files.columns().is_empty() && !matches!(state, UploadState::ColumnsExtracted { .. }) {
        lines.push(Line::from(Span::styled(
            format!("Columns: {}", files.columns().join(", ")),
            Style::default().fg(theme.dim),
        )));
    }

    let block = Block::default()
        .title("Progress")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}
