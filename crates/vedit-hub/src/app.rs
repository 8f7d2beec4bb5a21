use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{Event, KeyEvent, KeyEventKind};
use ratatui::Frame;
use tracing::{debug, info, warn};
use vedit_core::{AppState, EditorRequest, handle_keystroke};

use crate::config::ConfigWatcher;
use crate::input;
use crate::storage;
use crate::syntax::{Highlighter, SyntaxDebounce};
use crate::ui::{self, Viewport};

/// The main application state.
pub struct App {
    /// Current editor snapshot.
    pub state: AppState,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Scroll positions of the text view and the help popup.
    pub viewport: Viewport,
    config_watcher: ConfigWatcher,
    debounce: SyntaxDebounce,
    highlighter: Box<dyn Highlighter>,
}

impl App {
    pub fn new(
        state: AppState,
        config_watcher: ConfigWatcher,
        highlighter: Box<dyn Highlighter>,
    ) -> Self {
        Self {
            state,
            should_quit: false,
            viewport: Viewport::default(),
            config_watcher,
            debounce: SyntaxDebounce::default(),
            highlighter,
        }
    }

    /// Handle a terminal event.
    pub fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if input::is_force_quit(&key) {
            info!("ctrl+c, quitting");
            self.should_quit = true;
            return;
        }

        let Some((name, modifiers)) = input::translate_key(key) else {
            return;
        };

        // j/k scroll the help popup while it is open
        if self.state.modal.show_help_menu && !modifiers.ctrl && !modifiers.meta {
            match name.as_str() {
                "j" | "down" => {
                    self.viewport.help_scroll = self.viewport.help_scroll.saturating_add(1);
                    return;
                }
                "k" | "up" => {
                    self.viewport.help_scroll = self.viewport.help_scroll.saturating_sub(1);
                    return;
                }
                _ => {}
            }
        }

        self.state = handle_keystroke(&self.state, &name, modifiers);
        if !self.state.modal.show_help_menu {
            self.viewport.help_scroll = 0;
        }

        let (state, request) = self.state.take_request();
        self.state = state;
        if let Some(request) = request {
            self.process_request(request);
        }
    }

    fn process_request(&mut self, request: EditorRequest) {
        debug!(?request, "editor request");
        match request {
            EditorRequest::Write => {
                self.write();
            }
            EditorRequest::WriteQuit => {
                if self.write() {
                    self.should_quit = true;
                }
            }
            EditorRequest::Quit { force } => {
                info!(force, "quitting");
                self.should_quit = true;
            }
        }
    }

    /// Save the buffer, reporting the outcome on the status line.
    fn write(&mut self) -> bool {
        match storage::save_buffer(&self.state.buffer) {
            Ok(saved) => {
                let name = saved
                    .file_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                let lines = saved.line_count();
                self.state = self
                    .state
                    .with_buffer(saved)
                    .with_message(format!("\"{name}\" {lines}L written"));
                true
            }
            Err(err) => {
                warn!("write failed: {err:#}");
                self.state = self.state.with_message(format!("{err:#}"));
                false
            }
        }
    }

    /// Called every tick: picks up config changes and runs the debounced
    /// highlighter.
    pub fn tick(&mut self, now: Instant) {
        if let Some(config) = self.config_watcher.poll() {
            self.state = self
                .state
                .with_config(Arc::new(config))
                .with_message("Config reloaded");
        }

        self.debounce.observe(self.state.buffer.revision, now);
        if self.debounce.fire(now) {
            let buffer = &self.state.buffer;
            let tokens = self.highlighter.highlight(
                &buffer.text(),
                buffer.file_path.as_deref(),
                &buffer.language,
            );
            debug!(tokens = tokens.len(), revision = buffer.revision, "highlighted");
            self.state = self.state.with_syntax(tokens);
        }
    }

    /// Render the full UI.
    pub fn render(&mut self, frame: &mut Frame) {
        ui::render(frame, &self.state, &mut self.viewport);
    }
}
