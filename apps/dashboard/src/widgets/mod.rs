//! Reusable dashboard widgets.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use auditbook_shared::{Phase, Score, Verdict};

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

/// Background color of the phase badge.
pub(crate) fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Complete => Color::Green,
        Phase::Collectors | Phase::QualityGate => Color::Magenta,
        Phase::Remediation => Color::Yellow,
        _ => Color::Blue,
    }
}

/// Phase label on a colored background.
pub(crate) fn phase_badge(phase: Phase) -> Span<'static> {
    Span::styled(
        format!(" {} ", phase.label()),
        Style::default()
            .bg(phase_color(phase))
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
}

/// Score color: green from 75 %, yellow from 50 %, red below.
pub(crate) fn score_color(score: Score) -> Color {
    let pct = score.percent();
    if pct >= 75.0 {
        Color::Green
    } else if pct >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// `value/max` in its score color, a dim `--` when absent.
pub(crate) fn score_span(score: Option<Score>) -> Span<'static> {
    match score {
        Some(score) => Span::styled(score.to_string(), Style::default().fg(score_color(score))),
        None => Span::styled("--", Style::default().add_modifier(Modifier::DIM)),
    }
}

/// Quality gate verdict with its rubric total, e.g. `PASS 21/25`.
pub(crate) fn verdict_span(verdict: Verdict, total: u32) -> Span<'static> {
    let color = match verdict {
        Verdict::Pass => Color::Green,
        Verdict::Fail => Color::Red,
        Verdict::Unknown => Color::DarkGray,
    };
    Span::styled(
        format!("{verdict} {total}/{}", auditbook_shared::ReviewEntry::RUBRIC_MAX),
        Style::default().fg(color),
    )
}

/// Horizontal bar of `width` cells filled in proportion to `value / max`.
pub(crate) fn format_bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return " ".repeat(width);
    }
    let filled = (value.min(max) * width) / max;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
