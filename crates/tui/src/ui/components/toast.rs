//! Transient status message above the bottom bar.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
};

use crate::{
    app::{ToastLevel, ToastState},
    ui::theme::Theme,
};

/// Widest a toast gets; server messages longer than this wrap.
const MAX_WIDTH: u16 = 56;
/// Borders plus one column of padding on each side.
const CHROME: u16 = 4;

pub fn render(frame: &mut Frame<'_>, area: Rect, toast: Option<&ToastState>) {
    let Some(toast) = toast else {
        return;
    };
    let theme = Theme::default();
    let rect = placement(area, &toast.message);
    if rect.width <= CHROME || rect.height < 3 {
        return;
    }

    let color = match toast.level {
        ToastLevel::Info => theme.text,
        ToastLevel::Success => theme.positive,
        ToastLevel::Error => theme.error,
    };
    let style = Style::default().fg(color);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .padding(Padding::horizontal(1))
        .title(Span::styled(
            format!(" {} ", label(toast.level)),
            style.add_modifier(Modifier::BOLD),
        ));
    let content = Paragraph::new(toast.message.as_str())
        .style(style)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(Clear, rect);
    frame.render_widget(content, rect);
}

fn label(level: ToastLevel) -> &'static str {
    match level {
        ToastLevel::Info => "note",
        ToastLevel::Success => "done",
        ToastLevel::Error => "error",
    }
}

/// Bottom-right box sized to the wrapped message, kept inside `area` and
/// clear of its last row.
fn placement(area: Rect, message: &str) -> Rect {
    let inner_max = usize::from(MAX_WIDTH.min(area.width).saturating_sub(CHROME).max(1));
    let inner = message.chars().count().clamp(1, inner_max);
    let lines = wrapped_lines(message, inner);

    let width = (inner as u16 + CHROME).min(area.width);
    let height = (lines.min(usize::from(u16::MAX)) as u16 + 2).min(area.height.saturating_sub(1));
    Rect {
        x: area.x + area.width.saturating_sub(width),
        y: area.y + area.height.saturating_sub(height + 1),
        width,
        height,
    }
}

/// Rows `message` takes when word-wrapped at `width` columns.
fn wrapped_lines(message: &str, width: usize) -> usize {
    let mut lines = 1;
    let mut used = 0;
    for word in message.split_whitespace() {
        let len = word.chars().count();
        if used == 0 {
            used = len;
        } else if used + 1 + len <= width {
            used += 1 + len;
        } else {
            lines += 1;
            used = len;
        }
        // Words longer than a row break mid-word.
        while used > width {
            lines += 1;
            used -= width;
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 120,
        height: 40,
    };

    #[test]
    fn short_messages_fit_on_one_row() {
        let rect = placement(SCREEN, "Role saved");
        assert_eq!(rect.width, 14);
        assert_eq!(rect.height, 3);
        assert_eq!(rect.x, 106);
        assert_eq!(rect.y, 36);
    }

    #[test]
    fn long_server_messages_wrap() {
        let message = "Account number 0112233445 does not exist in the selected area office \
                       and cannot receive an adjustment";
        let rect = placement(SCREEN, message);
        assert_eq!(rect.width, MAX_WIDTH);
        assert!(rect.height > 3);
        assert_eq!(rect.y + rect.height, SCREEN.height - 1);
    }

    #[test]
    fn narrow_terminals_keep_the_toast_inside() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 20,
            height: 6,
        };
        let rect = placement(area, "Session expired or token missing.");
        assert!(rect.x + rect.width <= area.width);
        assert!(rect.y + rect.height < area.height);
    }

    #[test]
    fn long_words_break() {
        assert_eq!(wrapped_lines("abcdefghij", 4), 3);
        assert_eq!(wrapped_lines("one two three", 7), 2);
        assert_eq!(wrapped_lines("", 10), 1);
    }
}
