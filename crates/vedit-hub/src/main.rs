mod app;
mod config;
mod help_popup;
mod input;
mod paths;
mod storage;
mod syntax;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vedit_core::{AppState, TextBuffer};

use app::App;
use config::ConfigWatcher;
use syntax::PlainText;

fn main() -> Result<()> {
    init_logging()?;

    let file = std::env::args_os().nth(1).map(PathBuf::from);
    let buffer = match &file {
        Some(path) => storage::open_buffer(path)?,
        None => TextBuffer::default(),
    };

    // A missing home directory only disables the user config
    let config_path = paths::config_path().ok();
    let watcher = ConfigWatcher::new(config_path);
    let state = AppState::new(buffer).with_config(Arc::new(watcher.load()));

    let mut app = App::new(state, watcher, Box::new(PlainText));
    info!(file = ?file, "vedit started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Send tracing output to the log file; the terminal belongs to the editor.
/// Verbosity comes from `VEDIT_LOG` (e.g. `VEDIT_LOG=debug`).
fn init_logging() -> Result<()> {
    let path = paths::log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_env("VEDIT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(50);

    loop {
        terminal.draw(|frame| {
            app.render(frame);
        })?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(TICK_RATE)? {
            let ev = event::read()?;
            app.handle_event(ev);
        }

        // Config reload and debounced highlighting
        app.tick(Instant::now());
    }
}
