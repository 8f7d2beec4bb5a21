use tracing::{debug, warn};

use crate::selection::Position;

/// Editing modes, modeled after vim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditorMode {
    /// Default mode. Navigation and actions via keybinds.
    #[default]
    Normal,
    /// Text input mode. Entered with `i`, `a`, `o`. Exited with `Esc`.
    Insert,
    /// Character-wise selection (`v`).
    Visual,
    /// Line-wise selection (`V`).
    VisualLine,
    /// Rectangular selection (`Ctrl-v`).
    VisualBlock,
    /// Command-line mode. Entered with `:`.
    Command,
}

impl EditorMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Visual => "VISUAL",
            Self::VisualLine => "V-LINE",
            Self::VisualBlock => "V-BLOCK",
            Self::Command => "COMMAND",
        }
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Visual | Self::VisualLine | Self::VisualBlock)
    }
}

/// One legal mode change and the default key that triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: EditorMode,
    pub to: EditorMode,
    pub trigger: &'static str,
}

const fn tr(from: EditorMode, to: EditorMode, trigger: &'static str) -> Transition {
    Transition { from, to, trigger }
}

use EditorMode::{Command, Insert, Normal, Visual, VisualBlock, VisualLine};

/// Every legal mode change.
pub const TRANSITIONS: &[Transition] = &[
    tr(Normal, Insert, "i"),
    tr(Normal, Insert, "a"),
    tr(Normal, Insert, "o"),
    tr(Normal, Visual, "v"),
    tr(Normal, VisualLine, "shift+v"),
    tr(Normal, VisualBlock, "ctrl+v"),
    tr(Normal, Command, ":"),
    tr(Insert, Normal, "escape"),
    tr(Visual, Normal, "escape"),
    tr(VisualLine, Normal, "escape"),
    tr(VisualBlock, Normal, "escape"),
    tr(Command, Normal, "escape"),
    tr(Command, Normal, "enter"),
    tr(Visual, Normal, "d"),
    tr(Visual, Normal, "y"),
    tr(VisualLine, Normal, "d"),
    tr(VisualLine, Normal, "y"),
    tr(VisualBlock, Normal, "d"),
    tr(VisualBlock, Normal, "y"),
    tr(Visual, VisualLine, "shift+v"),
    tr(Visual, VisualBlock, "ctrl+v"),
    tr(VisualLine, Visual, "v"),
    tr(VisualLine, VisualBlock, "ctrl+v"),
    tr(VisualBlock, Visual, "v"),
    tr(VisualBlock, VisualLine, "shift+v"),
];

/// Whether the transition table allows moving from `from` to `to`.
pub fn is_legal_transition(from: EditorMode, to: EditorMode) -> bool {
    TRANSITIONS.iter().any(|t| t.from == from && t.to == to)
}

/// Modal editor state: mode, command line, cursor and help overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalState {
    pub current_mode: EditorMode,
    pub previous_mode: EditorMode,
    /// Command-line input typed after `:`.
    pub command_buffer: String,
    pub cursor_position: Position,
    /// Help overlay, independent of the mode.
    pub show_help_menu: bool,
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `mode`.
    ///
    /// Entering the current mode is a no-op, except `Insert` which may be
    /// re-entered. Transitions missing from [`TRANSITIONS`] are refused.
    /// Every transition clears the command buffer.
    pub fn enter_mode(&self, mode: EditorMode) -> ModalState {
        let from = self.current_mode;
        if from == mode {
            if mode != EditorMode::Insert {
                return self.clone();
            }
            return Self {
                command_buffer: String::new(),
                ..self.clone()
            };
        }
        if !is_legal_transition(from, mode) {
            warn!(?from, to = ?mode, "refusing illegal mode transition");
            return self.clone();
        }
        debug!(?from, to = ?mode, "mode transition");
        Self {
            current_mode: mode,
            previous_mode: from,
            command_buffer: String::new(),
            ..self.clone()
        }
    }

    /// Return to the previous mode.
    pub fn exit_mode(&self) -> ModalState {
        if self.current_mode == self.previous_mode {
            return self.clone();
        }
        debug!(from = ?self.current_mode, to = ?self.previous_mode, "exit mode");
        Self {
            current_mode: self.previous_mode,
            previous_mode: self.current_mode,
            command_buffer: String::new(),
            ..self.clone()
        }
    }

    pub fn with_cursor(&self, cursor_position: Position) -> ModalState {
        Self {
            cursor_position,
            ..self.clone()
        }
    }

    pub fn toggle_help(&self) -> ModalState {
        Self {
            show_help_menu: !self.show_help_menu,
            ..self.clone()
        }
    }

    pub fn close_help(&self) -> ModalState {
        Self {
            show_help_menu: false,
            ..self.clone()
        }
    }

    pub fn push_command_char(&self, c: char) -> ModalState {
        let mut command_buffer = self.command_buffer.clone();
        command_buffer.push(c);
        Self {
            command_buffer,
            ..self.clone()
        }
    }

    pub fn pop_command_char(&self) -> ModalState {
        let mut command_buffer = self.command_buffer.clone();
        command_buffer.pop();
        Self {
            command_buffer,
            ..self.clone()
        }
    }
}
