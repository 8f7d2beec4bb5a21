//! Editing core for vedit.
//!
//! A pure state machine: [`handle_keystroke`] takes the current [`AppState`]
//! and one key press and returns the next state. No terminal, file or clock
//! access happens here; the host crate owns all of that.

pub mod buffer;
pub mod command;
pub mod config;
pub mod help;
pub mod keybinds;
pub mod modal;
pub mod selection;
pub mod state;

pub use crate::buffer::TextBuffer;
pub use crate::command::Command;
pub use crate::config::{Config, UiConfig};
pub use crate::keybinds::{KeybindConfig, KeybindTable, Keystroke, Modifiers};
pub use crate::modal::{EditorMode, ModalState};
pub use crate::selection::{Position, Range, Selection};
pub use crate::state::{AppState, EditorRequest, SyntaxToken, handle_keystroke};
