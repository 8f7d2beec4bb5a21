//! Editor configuration.
//!
//! The core never reads files: the host deserializes a [`Config`] (TOML in
//! practice) and hands it over behind an `Arc`. Every field has a default, so a
//! partial file only overrides what it names.
//!
//! ```toml
//! [keybindings.normal]
//! "h" = "move_left"
//! "ctrl+p" = "toggle_help"
//!
//! [ui]
//! selection_bg = "#44447a"
//! ```

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::keybinds::{KeybindConfig, canonical_key, parse_keybind};
use crate::modal::EditorMode;

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-mode keybind tables. A table given in the file replaces the
    /// default table for that mode entirely.
    pub keybindings: KeybindConfig,
    pub ui: UiConfig,
}

/// Colour names understood by the renderer: named colours (`"yellow"`) or
/// hex (`"#44447a"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub normal_mode: String,
    pub insert_mode: String,
    pub visual_mode: String,
    pub command_mode: String,
    pub selection_bg: String,
    pub gutter: String,
    pub current_line_number: String,
    pub help_border: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            normal_mode: "blue".to_string(),
            insert_mode: "green".to_string(),
            visual_mode: "magenta".to_string(),
            command_mode: "yellow".to_string(),
            selection_bg: "#44447a".to_string(),
            gutter: "darkgray".to_string(),
            current_line_number: "yellow".to_string(),
            help_border: "cyan".to_string(),
        }
    }
}

impl UiConfig {
    /// Badge colour for the status bar.
    pub fn mode_color(&self, mode: EditorMode) -> &str {
        match mode {
            EditorMode::Normal => &self.normal_mode,
            EditorMode::Insert => &self.insert_mode,
            EditorMode::Visual | EditorMode::VisualLine | EditorMode::VisualBlock => {
                &self.visual_mode
            }
            EditorMode::Command => &self.command_mode,
        }
    }
}

impl Config {
    /// Problems worth reporting to the user. The core still accepts a config
    /// with warnings: unknown commands are no-ops and shadowed patterns never
    /// match.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (section, table) in self.keybindings.sections() {
            let section = section.to_lowercase();
            let mut seen: Vec<(String, bool, bool, bool)> = Vec::new();
            for (pattern, command) in table.iter() {
                let bind = parse_keybind(pattern);
                if bind.key.is_empty() {
                    warnings.push(format!("keybindings.{section}: empty key pattern"));
                    continue;
                }
                if !Command::from_name(command).is_known() {
                    warnings.push(format!(
                        "keybindings.{section}: `{pattern}` maps to unknown command `{command}`"
                    ));
                }
                let signature = (canonical_key(&bind.key), bind.ctrl, bind.shift, bind.meta);
                if seen.contains(&signature) {
                    warnings.push(format!(
                        "keybindings.{section}: `{pattern}` is shadowed by an earlier binding"
                    ));
                } else {
                    seen.push(signature);
                }
            }
        }
        warnings
    }
}
