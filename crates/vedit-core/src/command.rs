use tracing::{debug, trace};

use crate::buffer::TextBuffer;
use crate::keybinds::Keystroke;
use crate::modal::EditorMode;
use crate::selection::{
    Position, Range, clamp_cursor_position, extract_selection_text, initial_selection,
    normalize_selection, update_selection,
};
use crate::state::{AppState, EditorRequest};

/// The closed catalog of editor commands that keybinds can name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Mode entry
    EnterInsert,
    EnterVisual,
    EnterVisualLine,
    EnterVisualBlock,
    EnterCommand,
    EnterNormal,
    ExitVisual,
    ExitCommand,
    Append,
    OpenLineBelow,

    // Navigation
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,

    // Editing
    DeleteChar,
    DeleteCharForward,
    InsertNewline,
    DeleteSelection,
    YankSelection,
    Paste,

    // Command line
    ExecuteCommand,
    DeleteCommandChar,

    // Overlay
    ToggleHelp,
    CloseHelp,

    /// A name that is not in the catalog. Executing it does nothing.
    Unknown(String),
}

impl Command {
    pub fn from_name(name: &str) -> Command {
        match name {
            "enter_insert" => Self::EnterInsert,
            "enter_visual" => Self::EnterVisual,
            "enter_visual_line" => Self::EnterVisualLine,
            "enter_visual_block" => Self::EnterVisualBlock,
            "enter_command" => Self::EnterCommand,
            "enter_normal" => Self::EnterNormal,
            "exit_visual" => Self::ExitVisual,
            "exit_command" => Self::ExitCommand,
            "append" => Self::Append,
            "open_line_below" => Self::OpenLineBelow,
            "move_left" => Self::MoveLeft,
            "move_right" => Self::MoveRight,
            "move_up" => Self::MoveUp,
            "move_down" => Self::MoveDown,
            "delete_char" => Self::DeleteChar,
            "delete_char_forward" => Self::DeleteCharForward,
            "insert_newline" => Self::InsertNewline,
            "delete_selection" => Self::DeleteSelection,
            "yank_selection" => Self::YankSelection,
            "paste" => Self::Paste,
            "execute_command" => Self::ExecuteCommand,
            "delete_command_char" => Self::DeleteCommandChar,
            "toggle_help" => Self::ToggleHelp,
            "close_help" => Self::CloseHelp,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::EnterInsert => "enter_insert",
            Self::EnterVisual => "enter_visual",
            Self::EnterVisualLine => "enter_visual_line",
            Self::EnterVisualBlock => "enter_visual_block",
            Self::EnterCommand => "enter_command",
            Self::EnterNormal => "enter_normal",
            Self::ExitVisual => "exit_visual",
            Self::ExitCommand => "exit_command",
            Self::Append => "append",
            Self::OpenLineBelow => "open_line_below",
            Self::MoveLeft => "move_left",
            Self::MoveRight => "move_right",
            Self::MoveUp => "move_up",
            Self::MoveDown => "move_down",
            Self::DeleteChar => "delete_char",
            Self::DeleteCharForward => "delete_char_forward",
            Self::InsertNewline => "insert_newline",
            Self::DeleteSelection => "delete_selection",
            Self::YankSelection => "yank_selection",
            Self::Paste => "paste",
            Self::ExecuteCommand => "execute_command",
            Self::DeleteCommandChar => "delete_command_char",
            Self::ToggleHelp => "toggle_help",
            Self::CloseHelp => "close_help",
            Self::Unknown(name) => name,
        }
    }

    /// Human-readable description for the help overlay.
    pub fn description(&self) -> &'static str {
        match self {
            Self::EnterInsert => "Enter Insert mode",
            Self::EnterVisual => "Visual mode",
            Self::EnterVisualLine => "Visual line mode",
            Self::EnterVisualBlock => "Visual block mode",
            Self::EnterCommand => "Command mode",
            Self::EnterNormal => "Back to Normal mode",
            Self::ExitVisual => "Leave visual mode",
            Self::ExitCommand => "Cancel command",
            Self::Append => "Append after cursor",
            Self::OpenLineBelow => "Open line below",
            Self::MoveLeft => "Move left",
            Self::MoveRight => "Move right",
            Self::MoveUp => "Move up",
            Self::MoveDown => "Move down",
            Self::DeleteChar => "Delete previous character",
            Self::DeleteCharForward => "Delete character under cursor",
            Self::InsertNewline => "New line",
            Self::DeleteSelection => "Delete selection",
            Self::YankSelection => "Yank selection",
            Self::Paste => "Paste clipboard",
            Self::ExecuteCommand => "Run command",
            Self::DeleteCommandChar => "Delete command character",
            Self::ToggleHelp => "Toggle this help",
            Self::CloseHelp => "Close help",
            Self::Unknown(_) => "(unknown command)",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// Run a command against the current state and return the next state.
///
/// `ctx` is the key press that triggered the command.
pub fn execute(command: &Command, state: &AppState, ctx: &Keystroke) -> AppState {
    trace!(command = command.name(), key = %ctx.key, "execute");
    match command {
        Command::EnterInsert => enter_mode(state, EditorMode::Insert),
        Command::EnterVisual => enter_mode(state, EditorMode::Visual),
        Command::EnterVisualLine => enter_mode(state, EditorMode::VisualLine),
        Command::EnterVisualBlock => enter_mode(state, EditorMode::VisualBlock),
        Command::EnterCommand => enter_mode(state, EditorMode::Command),
        Command::EnterNormal => enter_mode(state, EditorMode::Normal),
        Command::ExitVisual => exit_visual(state),
        Command::ExitCommand => exit_command(state),
        Command::Append => append(state),
        Command::OpenLineBelow => open_line_below(state),
        Command::MoveLeft => move_cursor(state, |p| Position::new(p.line, p.column.saturating_sub(1))),
        Command::MoveRight => move_cursor(state, |p| Position::new(p.line, p.column + 1)),
        Command::MoveUp => move_cursor(state, |p| Position::new(p.line.saturating_sub(1), p.column)),
        Command::MoveDown => move_cursor(state, |p| Position::new(p.line + 1, p.column)),
        Command::DeleteChar => delete_char(state),
        Command::DeleteCharForward => delete_char_forward(state),
        Command::InsertNewline => insert_newline(state),
        Command::DeleteSelection => delete_selection(state),
        Command::YankSelection => yank_selection(state),
        Command::Paste => paste(state),
        Command::ExecuteCommand => execute_command(state),
        Command::DeleteCommandChar => delete_command_char(state),
        Command::ToggleHelp => AppState {
            modal: state.modal.toggle_help(),
            ..state.clone()
        },
        Command::CloseHelp => AppState {
            modal: state.modal.close_help(),
            ..state.clone()
        },
        Command::Unknown(name) => {
            debug!(name = %name, "ignoring unknown command");
            state.clone()
        }
    }
}

// ── Mode changes ─────────────────────────────────────────────────────

/// Change mode, keeping the selection invariant: visual modes always have a
/// selection and every other mode has none.
fn enter_mode(state: &AppState, mode: EditorMode) -> AppState {
    let modal = state.modal.enter_mode(mode);
    if modal == state.modal {
        return state.clone();
    }
    let cursor = modal.cursor_position;
    let selection = if mode.is_visual() {
        let sel = match state.selection {
            Some(sel) if state.modal.current_mode.is_visual() => {
                update_selection(mode, sel, cursor, &state.buffer)
            }
            _ => initial_selection(mode, cursor, &state.buffer),
        };
        Some(sel)
    } else {
        None
    };
    AppState {
        modal,
        selection,
        ..state.clone()
    }
}

fn exit_visual(state: &AppState) -> AppState {
    if !state.modal.current_mode.is_visual() {
        return state.clone();
    }
    enter_mode(state, EditorMode::Normal)
}

fn exit_command(state: &AppState) -> AppState {
    if state.modal.current_mode != EditorMode::Command {
        return state.clone();
    }
    AppState {
        modal: state.modal.exit_mode(),
        selection: None,
        ..state.clone()
    }
}

fn append(state: &AppState) -> AppState {
    let cursor = state.modal.cursor_position;
    let moved = clamp_cursor_position(Position::new(cursor.line, cursor.column + 1), &state.buffer);
    let state = AppState {
        modal: state.modal.with_cursor(moved),
        ..state.clone()
    };
    enter_mode(&state, EditorMode::Insert)
}

fn open_line_below(state: &AppState) -> AppState {
    let line = state.modal.cursor_position.line;
    let eol = Position::new(line, state.buffer.line_len(line));
    let buffer = state.buffer.insert_text(eol, "\n");
    let state = with_edit(state, buffer, Position::new(line + 1, 0));
    enter_mode(&state, EditorMode::Insert)
}

// ── Navigation ───────────────────────────────────────────────────────

fn move_cursor(state: &AppState, step: impl FnOnce(Position) -> Position) -> AppState {
    let cursor = clamp_cursor_position(step(state.modal.cursor_position), &state.buffer);
    let mode = state.modal.current_mode;
    let selection = match state.selection {
        Some(sel) if mode.is_visual() => Some(update_selection(mode, sel, cursor, &state.buffer)),
        other => other,
    };
    AppState {
        modal: state.modal.with_cursor(cursor),
        selection,
        ..state.clone()
    }
}

// ── Editing ──────────────────────────────────────────────────────────

/// Replace the buffer and move the cursor, clamped against the new buffer.
fn with_edit(state: &AppState, buffer: TextBuffer, cursor: Position) -> AppState {
    let cursor = clamp_cursor_position(cursor, &buffer);
    AppState {
        buffer,
        modal: state.modal.with_cursor(cursor),
        ..state.clone()
    }
}

/// Insert a typed character at the cursor.
pub(crate) fn insert_char(state: &AppState, c: char) -> AppState {
    let cursor = state.modal.cursor_position;
    let mut encoded = [0u8; 4];
    let buffer = state.buffer.insert_text(cursor, c.encode_utf8(&mut encoded));
    with_edit(state, buffer, Position::new(cursor.line, cursor.column + 1))
}

/// Append a typed character to the command line.
pub(crate) fn push_command_char(state: &AppState, c: char) -> AppState {
    AppState {
        modal: state.modal.push_command_char(c),
        ..state.clone()
    }
}

/// Backspace. At column 0 the line is merged into the previous one.
fn delete_char(state: &AppState) -> AppState {
    let cursor = state.modal.cursor_position;
    let target = if cursor.column > 0 {
        Position::new(cursor.line, cursor.column - 1)
    } else if cursor.line > 0 {
        Position::new(cursor.line - 1, state.buffer.line_len(cursor.line - 1))
    } else {
        return state.clone();
    };
    let buffer = state.buffer.delete_range(Range::new(target, cursor));
    with_edit(state, buffer, target)
}

/// Delete the character under the cursor. At the end of a line the next line
/// is joined.
fn delete_char_forward(state: &AppState) -> AppState {
    let cursor = state.modal.cursor_position;
    let end = if cursor.column < state.buffer.line_len(cursor.line) {
        Position::new(cursor.line, cursor.column + 1)
    } else if cursor.line + 1 < state.buffer.line_count() {
        Position::new(cursor.line + 1, 0)
    } else {
        return state.clone();
    };
    let buffer = state.buffer.delete_range(Range::new(cursor, end));
    with_edit(state, buffer, cursor)
}

fn insert_newline(state: &AppState) -> AppState {
    let cursor = state.modal.cursor_position;
    let buffer = state.buffer.insert_text(cursor, "\n");
    with_edit(state, buffer, Position::new(cursor.line + 1, 0))
}

fn delete_selection(state: &AppState) -> AppState {
    let mode = state.modal.current_mode;
    let Some(sel) = state.selection.filter(|_| mode.is_visual()) else {
        return state.clone();
    };
    let range = normalize_selection(&sel);
    let buffer = state.buffer.delete_range(range);
    let cursor = clamp_cursor_position(range.start, &buffer);
    AppState {
        buffer,
        modal: state.modal.enter_mode(EditorMode::Normal).with_cursor(cursor),
        selection: None,
        ..state.clone()
    }
}

fn yank_selection(state: &AppState) -> AppState {
    let mode = state.modal.current_mode;
    let Some(sel) = state.selection.filter(|_| mode.is_visual()) else {
        return state.clone();
    };
    let clipboard = extract_selection_text(&state.buffer, &sel);
    let cursor = clamp_cursor_position(sel.start(), &state.buffer);
    AppState {
        modal: state.modal.enter_mode(EditorMode::Normal).with_cursor(cursor),
        selection: None,
        clipboard,
        ..state.clone()
    }
}

/// Insert the clipboard at the cursor.
///
/// The cursor column advances by the clipboard length in chars, newlines
/// included, then gets clamped. A multi-line paste therefore leaves the cursor
/// on the line it started on.
fn paste(state: &AppState) -> AppState {
    if state.clipboard.is_empty() {
        return state.clone();
    }
    let cursor = state.modal.cursor_position;
    let buffer = state.buffer.insert_text(cursor, &state.clipboard);
    let advanced = Position::new(cursor.line, cursor.column + state.clipboard.chars().count());
    with_edit(state, buffer, advanced)
}

// ── Command line ─────────────────────────────────────────────────────

fn execute_command(state: &AppState) -> AppState {
    if state.modal.current_mode != EditorMode::Command {
        return state.clone();
    }
    let input = state.modal.command_buffer.trim().to_string();
    let base = AppState {
        modal: state.modal.exit_mode(),
        ..state.clone()
    };
    debug!(command = %input, "execute command line");
    match input.as_str() {
        "" => base,
        "w" | "write" => with_request(base, EditorRequest::Write),
        "q" | "quit" if base.buffer.is_dirty => AppState {
            message: Some("No write since last change (add ! to override)".to_string()),
            ..base
        },
        "q" | "quit" => with_request(base, EditorRequest::Quit { force: false }),
        "q!" | "quit!" => with_request(base, EditorRequest::Quit { force: true }),
        "wq" | "x" => with_request(base, EditorRequest::WriteQuit),
        "h" | "help" => {
            let modal = if base.modal.show_help_menu {
                base.modal.clone()
            } else {
                base.modal.toggle_help()
            };
            AppState { modal, ..base }
        }
        other => AppState {
            message: Some(format!("Not an editor command: {other}")),
            ..base
        },
    }
}

fn with_request(state: AppState, request: EditorRequest) -> AppState {
    AppState {
        request: Some(request),
        ..state
    }
}

/// Backspace on the command line. An empty command line leaves Command mode.
fn delete_command_char(state: &AppState) -> AppState {
    if state.modal.command_buffer.is_empty() {
        return exit_command(state);
    }
    AppState {
        modal: state.modal.pop_command_char(),
        ..state.clone()
    }
}
