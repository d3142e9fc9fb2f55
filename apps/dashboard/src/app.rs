//! Dashboard state and event loop.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing::{debug, info, warn};

use auditbook_core::audit::{CONTEXT_FILE, modified_at};
use auditbook_core::status::Snapshot;
use auditbook_shared::AppConfig;

use crate::view;

/// Interval between checks while waiting for the audit directory.
const WAIT_INTERVAL: Duration = Duration::from_millis(500);

const WATCHING: &str = "Watching — press r to refresh, q to quit";

/// Application state.
pub(crate) struct App {
    /// Audit directory being watched.
    pub dir: PathBuf,
    pub config: AppConfig,
    /// Session start: `context.md` mtime at launch, else launch time.
    pub started_at: DateTime<Utc>,
    /// Latest snapshot; `None` until the first successful refresh.
    pub snapshot: Option<Snapshot>,
    /// Status message shown in bottom bar.
    pub status: String,
    last_refresh: Option<Instant>,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    pub(crate) fn new(dir: PathBuf, config: AppConfig) -> Self {
        let started_at = modified_at(&dir.join(CONTEXT_FILE)).unwrap_or_else(Utc::now);
        Self {
            dir,
            config,
            started_at,
            snapshot: None,
            status: WATCHING.to_string(),
            last_refresh: None,
            should_quit: false,
        }
    }

    /// Re-read the audit directory. Returns whether the snapshot was updated.
    pub(crate) fn refresh(&mut self) -> bool {
        let result = Snapshot::capture(&self.dir, &self.config.dashboard, &self.config.models);
        self.last_refresh = Some(Instant::now());
        self.apply(result)
    }

    fn apply(&mut self, result: auditbook_shared::Result<Snapshot>) -> bool {
        match result {
            Ok(snapshot) => {
                debug!(phase = %snapshot.phase, agents = snapshot.agents.len(), "snapshot refreshed");
                self.snapshot = Some(snapshot);
                self.status = WATCHING.to_string();
                true
            }
            Err(e) => {
                warn!(error = %e, "snapshot refresh failed");
                self.status = format!("Refresh failed: {e}");
                false
            }
        }
    }

    /// True when no refresh happened within `refresh_ms`.
    pub(crate) fn refresh_due(&self) -> bool {
        self.last_refresh
            .is_none_or(|t| t.elapsed() >= self.config.dashboard.refresh_interval())
    }

    /// Time since session start, clamped at zero.
    pub(crate) fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).to_std().unwrap_or_default()
    }
}

/// Block until `dir` exists.
pub(crate) fn wait_for_dir(dir: &Path) {
    if dir.is_dir() {
        return;
    }
    println!("Waiting for {}...", dir.display());
    while !dir.is_dir() {
        std::thread::sleep(WAIT_INTERVAL);
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) fn run(dir: PathBuf, config: AppConfig) -> Result<()> {
    wait_for_dir(&dir);
    info!(dir = %dir.display(), "dashboard started");

    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, App::new(dir, config));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    println!("Dashboard closed.");
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        if app.refresh_due() {
            app.refresh();
        }

        terminal.draw(|f| view::draw(f, &app, Utc::now()))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key.code, key.modifiers);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

pub(crate) fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Char('r') => {
            if app.refresh() {
                app.status = "Refreshed".to_string();
            }
        }
        _ => {}
    }
}
