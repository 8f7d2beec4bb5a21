use std::sync::Arc;

use tracing::{debug, trace};

use crate::buffer::TextBuffer;
use crate::command::{self, Command};
use crate::config::Config;
use crate::keybinds::{Keystroke, Modifiers, canonical_key};
use crate::modal::{EditorMode, ModalState};
use crate::selection::{Position, Range, Selection};

/// A highlighted span produced by an external syntax highlighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    pub range: Range,
    /// Token class, e.g. `"keyword"` or `"string"`.
    pub kind: String,
}

/// Work the host must do on the editor's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorRequest {
    /// Persist the buffer to its file.
    Write,
    /// Leave the editor. `force` discards unsaved changes.
    Quit { force: bool },
    /// Persist, then leave.
    WriteQuit,
}

/// Everything the editor knows after a keystroke.
///
/// Each keystroke produces a new `AppState`; snapshots are never mutated.
/// Config and syntax tokens are shared behind `Arc`s and treated as read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub buffer: TextBuffer,
    pub modal: ModalState,
    /// Present exactly when the mode is one of the visual modes.
    pub selection: Option<Selection>,
    pub clipboard: String,
    pub config: Arc<Config>,
    pub syntax: Arc<[SyntaxToken]>,
    /// Pending request for the host, see [`AppState::take_request`].
    pub request: Option<EditorRequest>,
    /// Status line message from the last command.
    pub message: Option<String>,
}

impl AppState {
    pub fn new(buffer: TextBuffer) -> Self {
        Self {
            buffer,
            modal: ModalState::new(),
            selection: None,
            clipboard: String::new(),
            config: Arc::new(Config::default()),
            syntax: Arc::from(Vec::new()),
            request: None,
            message: None,
        }
    }

    /// Swap in a new config. Takes effect on the next keystroke.
    pub fn with_config(&self, config: Arc<Config>) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// Store tokens from the external highlighter.
    pub fn with_syntax(&self, tokens: Vec<SyntaxToken>) -> Self {
        Self {
            syntax: Arc::from(tokens),
            ..self.clone()
        }
    }

    /// Replace the buffer, e.g. after the host saved it.
    pub fn with_buffer(&self, buffer: TextBuffer) -> Self {
        let cursor = crate::selection::clamp_cursor_position(self.modal.cursor_position, &buffer);
        Self {
            buffer,
            modal: self.modal.with_cursor(cursor),
            ..self.clone()
        }
    }

    pub fn with_message(&self, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..self.clone()
        }
    }

    /// Split off the pending host request.
    pub fn take_request(&self) -> (Self, Option<EditorRequest>) {
        let next = Self {
            request: None,
            ..self.clone()
        };
        (next, self.request)
    }

    pub fn mode(&self) -> EditorMode {
        self.modal.current_mode
    }

    pub fn cursor(&self) -> Position {
        self.modal.cursor_position
    }
}

/// Turn one key press into the next state.
///
/// Resolution order: `Escape` closes an open help overlay; otherwise the
/// current mode's keybind table is searched in order; otherwise a printable
/// character is inserted (Insert mode) or appended to the command line
/// (Command mode). Anything else returns the state unchanged.
pub fn handle_keystroke(state: &AppState, key: &str, modifiers: Modifiers) -> AppState {
    let keystroke = Keystroke::new(key, modifiers);
    let cleared = || without_message(state);

    if state.modal.show_help_menu && canonical_key(&keystroke.key) == "escape" {
        return command::execute(&Command::CloseHelp, &cleared(), &keystroke);
    }

    let mode = state.modal.current_mode;
    let table = state.config.keybindings.table_for(mode);
    if let Some(name) = table.find_command(&keystroke.key, keystroke.modifiers) {
        let command = Command::from_name(name);
        debug!(?mode, key = %keystroke.key, command = command.name(), "keystroke resolved");
        return command::execute(&command, &cleared(), &keystroke);
    }

    if let Some(c) = keystroke.printable_char() {
        match mode {
            EditorMode::Insert => return command::insert_char(&cleared(), c),
            EditorMode::Command => return command::push_command_char(&cleared(), c),
            _ => {}
        }
    }

    trace!(?mode, key = %keystroke.key, "unmatched keystroke");
    state.clone()
}

/// The state with the previous keystroke's status message dropped.
fn without_message(state: &AppState) -> AppState {
    AppState {
        message: None,
        ..state.clone()
    }
}
