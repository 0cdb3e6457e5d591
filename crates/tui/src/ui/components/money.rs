use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// Two decimals with thousands separators, e.g. `-1,500.00`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

/// Creates a simple text-based progress bar for inline use.
///
/// Returns a string like `████████░░ 80%`, or an empty track when the total
/// is still unknown.
#[must_use]
pub fn inline_progress_bar(done: u64, total: u64, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }
    let ratio = (done as f64 / total as f64).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64) as usize).min(width);
    let empty = width.saturating_sub(filled);
    let percentage = (ratio * 100.0) as u16;

    format!("{}{} {}%", "█".repeat(filled), "░".repeat(empty), percentage)
}

#[must_use]
pub fn styled_progress_bar(done: u64, total: u64, width: usize, theme: &Theme) -> Span<'static> {
    let color = if total > 0 && done >= total {
        theme.positive
    } else {
        theme.accent
    };
    Span::styled(inline_progress_bar(done, total, width), Style::default().fg(color))
}
