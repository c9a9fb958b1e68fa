//! gh-notify-tui: a GitHub notification counter for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────────────── poll thread ────────────────────────┐
//! │ scheduler.rs ──► source/ (fetch) ──► reconcile.rs           │
//! │      ▲   backoff.rs                        │                │
//! │      │                                     ▼                │
//! │   Command                            sink.rs (ChannelSink)  │
//! └──────┼─────────────────────────────────────┼────────────────┘
//!        │ SchedulerHandle                     │ PollMsg
//! ┌──────┴──────┐   handle_key_event()   ┌─────▼────┐  draw()  ┌────────┐
//! │  watch.rs   │       input.rs ──────► │  app.rs  │ ───────► │ ui.rs  │
//! │ (settings)  │                        │ (state)  │          │        │
//! └─────────────┘                        └──────────┘          └────────┘
//! ```
//!
//! * **`source/`**: the `NotificationSource` trait and the GitHub fetcher.
//! * **`backoff`**: pure delay computation.
//! * **`scheduler`**: the polling state machine (no I/O).
//! * **`poll`**: runs the scheduler on its own thread and runtime.
//! * **`reconcile`**: turns outcomes into display state and alerts.
//! * **`sink`**: outbound traits (display, alert, browser).
//! * **`config`** / **`watch`**: settings file and its watcher.
//! * **`app`** / **`ui`** / **`input`**: the terminal front end.
//! * **`main`**: wires everything together: parse args, set up logging
//!   and the terminal, and run the event loop.

mod app;
mod backoff;
mod config;
mod error;
mod input;
mod poll;
mod reconcile;
mod scheduler;
mod sink;
mod source;
mod ui;
mod watch;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Settings;
use input::Action;
use poll::SchedulerHandle;
use reconcile::DisplayState;
use scheduler::Scheduler;
use sink::{Browser, ChannelSink, SystemBrowser};
use source::{GithubSource, NotificationSource};
use watch::SettingsWatcher;

#[derive(Debug, Parser)]
#[command(name = "gh-notify-tui", version, about)]
struct Cli {
    /// Settings file (TOML).  Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file.  Defaults to the platform state directory.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before printing a panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("gh-notify-tui").join("gh-notify-tui.log"))
}

/// Log to a file: the terminal belongs to the UI.  `RUST_LOG` overrides the
/// default `info` level.
fn init_logging(path: Option<PathBuf>) -> Result<WorkerGuard> {
    let path = path
        .or_else(default_log_path)
        .context("no log directory available; pass --log-file")?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory '{}'", dir.display()))?;
    let file_name = path.file_name().context("log path has no file name")?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn load_settings(path: &Path) -> Result<Settings> {
    Ok(Settings::load(path)?.with_env_token(std::env::var("GITHUB_TOKEN").ok()))
}

/// Re-read the settings file and hand the new snapshots to the scheduler.
/// A broken file keeps the previous settings.
fn reload_settings(path: &Path, handle: &SchedulerHandle, app: &mut App) {
    match load_settings(path) {
        Ok(settings) => {
            let config = settings.poll_config();
            app.web_url = config.web_url();
            handle.settings_changed(config, settings.display_flags());
        }
        Err(e) => {
            tracing::warn!(event = "config.reload_failed", error = %format!("{e:#}"));
            app.status = format!("Settings error: {e:#}");
        }
    }
}

fn perform(action: Action, app: &App, handle: &SchedulerHandle, config_path: &Path) {
    let browser = SystemBrowser;
    match action {
        Action::OpenBrowser => browser.open(&app.web_url),
        Action::OpenSettings => browser.open(&config_path.display().to_string()),
        Action::Refresh => handle.refresh(),
        Action::Pause => handle.disable(),
        Action::Resume => handle.enable(),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    install_panic_hook();
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file)?;

    // -- settings ------------------------------------------------------------
    let config_path = cli
        .config
        .or_else(config::default_config_path)
        .context("cannot determine the settings path; pass --config")?;
    let settings = load_settings(&config_path)?;
    let poll_config = settings.poll_config();
    let flags = settings.display_flags();
    tracing::info!(
        event = "app.starting",
        config = %config_path.display(),
        domain = %poll_config.domain,
        base_interval = poll_config.base_interval,
    );

    // -- start background polling --------------------------------------------
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);
    let source: Arc<dyn NotificationSource> = Arc::new(GithubSource::new()?);
    let mut app = App::new(poll_config.web_url(), DisplayState::initial(&flags));
    let (handle, poller) =
        poll::spawn(source, Scheduler::new(poll_config, flags), sink.clone(), sink)?;
    handle.enable();

    let watcher = SettingsWatcher::new(&config_path);

    // -- terminal setup (Drop restores on exit or panic) ---------------------
    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // ~10 fps.  Each iteration drains poller messages, checks the settings
    // file, renders, then waits up to one tick for a key.
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = rx.try_recv() {
            app.apply(msg);
        }

        if watcher.as_ref().is_some_and(SettingsWatcher::has_pending_changes) {
            reload_settings(&config_path, &handle, &mut app);
        }

        guard.terminal.draw(|f| ui::draw(&app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = input::handle_key_event(&mut app, key) {
                    perform(action, &app, &handle, &config_path);
                }
            }
        }

        if app.quit {
            break;
        }
    }

    handle.disable();
    handle.shutdown();
    drop(guard);
    if poller.join().is_err() {
        tracing::error!(event = "app.poller_panicked");
    }
    tracing::info!(event = "app.stopped");
    Ok(())
}
