//! Dashboard rendering.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use auditbook_core::status::{AgentRow, Snapshot};
use auditbook_shared::{AgentStatus, ModelTier, Phase};

use crate::app::App;
use crate::widgets::{format_bar, phase_badge, score_span, status_bar, verdict_span};

const LABEL: Style = Style::new().add_modifier(Modifier::DIM);
const VALUE: Style = Style::new().fg(Color::White);
const GOOD: Style = Style::new().fg(Color::Green);
const BAD: Style = Style::new().fg(Color::Red);
const HEADING: Style = Style::new().add_modifier(Modifier::BOLD);

pub(crate) fn draw(f: &mut Frame, app: &App, now: DateTime<Utc>) {
    let Some(snap) = &app.snapshot else {
        draw_waiting(f, app);
        return;
    };

    let overview = overview_lines(snap, app.elapsed(now));
    let summary = summary_lines(snap);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                             // Header
            Constraint::Length(overview.len() as u16 + 1),     // Overview
            Constraint::Min(3),                                // Agents
            Constraint::Length(summary.len() as u16),          // Summary
            Constraint::Length(1),                             // Watching
            Constraint::Length(1),                             // Status bar
        ])
        .split(f.area());

    f.render_widget(header(&snap.domain), chunks[0]);
    f.render_widget(Paragraph::new(overview), chunks[1]);

    if snap.agents.is_empty() {
        let empty = Paragraph::new(Line::styled("  No agent reports yet...", LABEL));
        f.render_widget(empty, chunks[2]);
    } else {
        f.render_widget(agent_table(&snap.agents), chunks[2]);
    }

    f.render_widget(Paragraph::new(summary), chunks[3]);

    let watching = Paragraph::new(Line::styled(
        format!("  Watching: {}", app.dir.display()),
        LABEL,
    ));
    f.render_widget(watching, chunks[4]);
    f.render_widget(status_bar(&app.status), chunks[5]);
}

fn draw_waiting(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    let msg = Paragraph::new(format!("Scanning {}...", app.dir.display()))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" auditbook "));
    f.render_widget(msg, chunks[0]);
    f.render_widget(status_bar(&app.status), chunks[1]);
}

fn header(domain: &str) -> Paragraph<'_> {
    Paragraph::new(Line::from(vec![
        Span::styled(" MARKETING AUDIT", HEADING),
        Span::raw(" · "),
        Span::styled(domain, VALUE),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    )
}

fn overview_lines(snap: &Snapshot, elapsed: Duration) -> Vec<Line<'static>> {
    let secs = elapsed.as_secs();
    let mut lines = vec![
        Line::from(vec![
            Span::styled("  Phase:    ", LABEL),
            phase_badge(snap.phase),
        ]),
        labeled("Elapsed:", format!("{:02}:{:02}", secs / 60, secs % 60), VALUE),
    ];

    if let Some(btype) = &snap.business_type {
        lines.push(labeled("Type:", btype.clone(), VALUE));
    }
    if let Some(industry) = &snap.industry {
        lines.push(labeled("Industry:", industry.clone(), VALUE));
    }
    if let Some(crawl) = snap.crawl {
        lines.push(labeled(
            "Crawled:",
            format!("{} pages ({} lines)", crawl.pages, thousands(crawl.lines)),
            GOOD,
        ));
    }
    match snap.collectors_lines {
        Some(count) => lines.push(labeled(
            "Collect:",
            format!("done ({} lines)", thousands(count)),
            GOOD,
        )),
        None if snap.phase == Phase::Collectors => {
            lines.push(labeled("Collect:", "running...".to_string(), Style::new().fg(Color::Yellow)));
        }
        None => {}
    }
    lines
}

fn labeled(label: &str, value: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<10}"), LABEL),
        Span::styled(value, style),
    ])
}

fn agent_table(agents: &[AgentRow]) -> Table<'static> {
    let header = Row::new(["", "Agent", "Model", "Score", "Size", "Gate"]).style(HEADING);

    let rows = agents.iter().map(|agent| {
        let truncated = agent.status == AgentStatus::Truncated;
        let dot_style = if truncated { BAD } else { GOOD };
        let model_style = match agent.model {
            ModelTier::Haiku => Style::new().fg(Color::Cyan),
            ModelTier::Sonnet => Style::new().fg(Color::Magenta),
        };

        let kb = agent.size_bytes as f64 / 1024.0;
        let size = if truncated {
            Span::styled(format!("{kb:.1}KB ⚠"), BAD)
        } else {
            Span::styled(format!("{kb:.1}KB"), GOOD)
        };
        let gate = agent
            .gate
            .map(|g| verdict_span(g.verdict, g.total))
            .unwrap_or_default();

        Row::new(vec![
            Cell::from(Span::styled("●", dot_style)),
            Cell::from(agent.name.clone()),
            Cell::from(Span::styled(agent.model.as_str(), model_style)),
            Cell::from(score_span(agent.score)),
            Cell::from(size),
            Cell::from(gate),
        ])
    });

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(26),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::TOP | Borders::BOTTOM))
}

fn summary_lines(snap: &Snapshot) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if !snap.agents.is_empty() {
        let mut spans = vec![
            Span::styled("  Agents: ", LABEL),
            Span::styled(format!("{} complete", snap.complete_count()), GOOD),
        ];
        let truncated = snap.truncated_count();
        if truncated > 0 {
            spans.push(Span::styled(format!(" {truncated} truncated"), BAD));
        }
        spans.push(Span::styled("  |  Avg Score: ", LABEL));
        spans.push(Span::styled(
            format!("{:.0}", snap.average_score().unwrap_or(0.0)),
            VALUE,
        ));
        lines.push(Line::from(spans));
        lines.push(Line::default());
    }

    if snap.handoffs.any() {
        lines.push(Line::styled("  Warm Handoffs", HEADING));
        if snap.handoffs.batch1 {
            lines.push(ready("Batch 1 → 2+3 handoff ready"));
        }
        if snap.handoffs.batch23 {
            lines.push(ready("Batch 2+3 → 4 handoff ready"));
        }
        lines.push(Line::default());
    }

    if let Some(gate) = snap.gate {
        lines.push(Line::styled("  Quality Gate", HEADING));
        if let Some(rate) = gate.pass_rate() {
            lines.push(Line::from(vec![
                Span::styled(format!("  PASS: {}", gate.passed), GOOD),
                Span::styled(format!("  FAIL: {}", gate.failed), BAD),
                Span::raw(format!(
                    "  ({}/{} = {rate:.0}%)  ",
                    gate.passed,
                    gate.total()
                )),
                Span::styled(format_bar(gate.passed, gate.total(), 20), GOOD),
            ]));
        }
        lines.push(Line::default());
    }

    if let Some(report) = &snap.report {
        lines.push(Line::from(Span::styled(
            "  REPORT READY ",
            Style::new()
                .bg(Color::Green)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::styled(
            format!(
                "  {} ({:.1}KB)",
                report.path.display(),
                report.size_bytes as f64 / 1024.0
            ),
            GOOD,
        ));
    }

    lines
}

fn ready(text: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled("  ● ", GOOD), Span::raw(text)])
}

/// `12345` → `12,345`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use ratatui::backend::TestBackend;

    use auditbook_core::review::GateSummary;
    use auditbook_core::status::{CrawlStats, Handoffs, ReportFile};
    use auditbook_shared::{AppConfig, ReviewEntry, Score, Verdict};

    fn agent(name: &str, model: ModelTier, score: Option<Score>, size: u64) -> AgentRow {
        AgentRow {
            name: name.into(),
            model,
            score,
            status: AgentStatus::from_size(size, 200),
            size_bytes: size,
            modified: None,
            gate: None,
        }
    }

    fn snapshot() -> Snapshot {
        let mut seo = agent("seo-audit", ModelTier::Sonnet, Some(Score::new(62, 100)), 4096);
        seo.gate = Some(ReviewEntry {
            verdict: Verdict::Pass,
            total: 21,
        });
        Snapshot {
            dir: PathBuf::from("/tmp/marketing-audit-watch.test"),
            domain: "watch.test".into(),
            phase: Phase::QualityGate,
            started_at: None,
            business_type: Some("B2B SaaS".into()),
            industry: Some("Analytics".into()),
            crawl: Some(CrawlStats {
                pages: 12,
                lines: 4821,
            }),
            collectors_lines: Some(310),
            agents: vec![
                agent("geo-audit", ModelTier::Haiku, None, 80),
                seo,
            ],
            handoffs: Handoffs {
                batch1: true,
                batch23: false,
            },
            gate: Some(GateSummary { passed: 3, failed: 1 }),
            report: None,
        }
    }

    fn app_with(snapshot: Option<Snapshot>) -> (App, DateTime<Utc>) {
        let mut app = App::new(
            PathBuf::from("/tmp/marketing-audit-watch.test"),
            AppConfig::default(),
        );
        app.snapshot = snapshot;
        let now = app.started_at + chrono::Duration::seconds(605);
        (app, now)
    }

    fn render(app: &App, now: DateTime<Utc>) -> (String, ratatui::buffer::Buffer) {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, app, now)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        (text, buffer)
    }

    #[test]
    fn draws_full_snapshot() {
        let (app, now) = app_with(Some(snapshot()));
        let (text, _) = render(&app, now);

        assert!(text.contains("MARKETING AUDIT · watch.test"));
        assert!(text.contains("QUALITY GATE"));
        assert!(text.contains("Elapsed:  10:05"));
        assert!(text.contains("B2B SaaS"));
        assert!(text.contains("12 pages (4,821 lines)"));
        assert!(text.contains("done (310 lines)"));
        assert!(text.contains("seo-audit"));
        assert!(text.contains("62/100"));
        assert!(text.contains("PASS 21/25"));
        assert!(text.contains("4.0KB"));
        assert!(text.contains("1 complete 1 truncated"));
        assert!(text.contains("Avg Score: 62"));
        assert!(text.contains("Batch 1 → 2+3 handoff ready"));
        assert!(!text.contains("Batch 2+3 → 4"));
        assert!(text.contains("(3/4 = 75%)"));
        assert!(!text.contains("REPORT READY"));
        assert!(text.contains("Watching: /tmp/marketing-audit-watch.test"));
    }

    #[test]
    fn phase_badge_uses_phase_color() {
        let (app, now) = app_with(Some(snapshot()));
        let (_, buffer) = render(&app, now);
        assert!(
            buffer
                .content()
                .iter()
                .any(|c| c.symbol() == "Q" && c.bg == Color::Magenta)
        );
    }

    #[test]
    fn report_banner_when_complete() {
        let mut snap = snapshot();
        snap.phase = Phase::Complete;
        snap.report = Some(ReportFile {
            path: PathBuf::from("/tmp/marketing-audit-watch.test/FULL-REPORT.md"),
            size_bytes: 2048,
        });
        let (app, now) = app_with(Some(snap));
        let (text, _) = render(&app, now);
        assert!(text.contains("COMPLETE"));
        assert!(text.contains("REPORT READY"));
        assert!(text.contains("FULL-REPORT.md (2.0KB)"));
    }

    #[test]
    fn empty_audit_shows_placeholder() {
        let mut snap = snapshot();
        snap.agents.clear();
        snap.gate = None;
        snap.collectors_lines = None;
        snap.phase = Phase::Collectors;
        let (app, now) = app_with(Some(snap));
        let (text, _) = render(&app, now);
        assert!(text.contains("No agent reports yet..."));
        assert!(text.contains("running..."));
        assert!(!text.contains("Avg Score"));
    }

    #[test]
    fn scanning_before_first_snapshot() {
        let (app, now) = app_with(None);
        let (text, _) = render(&app, now);
        assert!(text.contains("Scanning /tmp/marketing-audit-watch.test..."));
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
