use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::modal::EditorMode;

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        meta: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        meta: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
        meta: false,
    };
}

/// A physical key press as delivered by the host.
///
/// `key` is either a single character (`"h"`, `"V"`, `":"`) or a key name
/// (`"escape"`, `"enter"`, `"up"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystroke {
    pub key: String,
    pub modifiers: Modifiers,
}

impl Keystroke {
    /// Build a keystroke, normalizing shift for single characters: an
    /// uppercase letter always carries shift and any other character never
    /// does, since terminals disagree on whether `:` arrives shifted.
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        let key = key.into();
        let mut modifiers = modifiers;
        if let Some(c) = single_char(&key) {
            if c.is_alphabetic() {
                if c.is_uppercase() {
                    modifiers.shift = true;
                }
            } else {
                modifiers.shift = false;
            }
        }
        Self { key, modifiers }
    }

    pub fn char(c: char) -> Self {
        Self::new(c.to_string(), Modifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(c.to_string(), Modifiers::CTRL)
    }

    pub fn named(name: &str) -> Self {
        Self::new(name, Modifiers::NONE)
    }

    /// The character to insert if this key press is plain text input.
    pub fn printable_char(&self) -> Option<char> {
        if self.modifiers.ctrl || self.modifiers.meta {
            return None;
        }
        single_char(&self.key).filter(|c| !c.is_control())
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// A parsed keybind pattern such as `ctrl+p` or `shift+v`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keybind {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Parse a pattern: split on `+`, lower-case, treat `ctrl`/`shift`/`meta`
/// tokens as modifiers and the remaining token as the key. A literal `+` key
/// is written `+` or `ctrl++`.
pub fn parse_keybind(pattern: &str) -> Keybind {
    let mut bind = Keybind::default();
    if pattern.is_empty() {
        return bind;
    }
    let lowered = pattern.to_lowercase();
    for token in lowered.split('+') {
        match token {
            "ctrl" | "control" => bind.ctrl = true,
            "shift" => bind.shift = true,
            "meta" | "alt" => bind.meta = true,
            "" => bind.key = "+".to_string(),
            key => bind.key = key.to_string(),
        }
    }
    bind
}

/// Canonical name of a key, resolving aliases.
pub fn canonical_key(key: &str) -> String {
    if key == " " {
        return "space".to_string();
    }
    let lowered = key.to_lowercase();
    let canonical = match lowered.as_str() {
        "esc" | "escape" => "escape",
        "return" | "enter" | "cr" => "enter",
        "backspace" | "bs" => "backspace",
        "tab" => "tab",
        "delete" | "del" => "delete",
        "space" => "space",
        "arrowup" => "up",
        "arrowdown" => "down",
        "arrowleft" => "left",
        "arrowright" => "right",
        other => return other.to_string(),
    };
    canonical.to_string()
}

/// Whether a key press matches a pattern. Keys are compared after alias
/// resolution; modifiers must match exactly.
pub fn matches_keybind(pattern: &str, key: &str, modifiers: Modifiers) -> bool {
    let bind = parse_keybind(pattern);
    !bind.key.is_empty()
        && canonical_key(&bind.key) == canonical_key(key)
        && bind.ctrl == modifiers.ctrl
        && bind.shift == modifiers.shift
        && bind.meta == modifiers.meta
}

/// Render a pattern for display, e.g. `ctrl+p` → `Ctrl+P`.
pub fn format_keybind(pattern: &str) -> String {
    let bind = parse_keybind(pattern);
    let has_modifier = bind.ctrl || bind.shift || bind.meta;
    let mut out = String::new();
    if bind.ctrl {
        out.push_str("Ctrl+");
    }
    if bind.meta {
        out.push_str("Meta+");
    }
    if bind.shift {
        out.push_str("Shift+");
    }
    let key = canonical_key(&bind.key);
    match key.as_str() {
        "escape" => out.push_str("Esc"),
        "enter" => out.push_str("Enter"),
        "backspace" => out.push_str("Backspace"),
        "delete" => out.push_str("Del"),
        "tab" => out.push_str("Tab"),
        "space" => out.push_str("Space"),
        "up" => out.push('↑'),
        "down" => out.push('↓'),
        "left" => out.push('←'),
        "right" => out.push('→'),
        _ if has_modifier => out.push_str(&key.to_uppercase()),
        _ => out.push_str(&key),
    }
    out
}

// ── Tables ───────────────────────────────────────────────────────────

/// Keybinds for one mode, kept in declaration order.
///
/// Lookup returns the first matching pattern, so order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeybindTable {
    bindings: Vec<(String, String)>,
}

impl KeybindTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `pattern` to `command`. Rebinding an existing pattern keeps its
    /// original position.
    pub fn bind(mut self, pattern: impl Into<String>, command: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let command = command.into();
        match self.bindings.iter_mut().find(|(p, _)| *p == pattern) {
            Some(entry) => entry.1 = command,
            None => self.bindings.push((pattern, command)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The command bound to a key press, first match in table order.
    pub fn find_command(&self, key: &str, modifiers: Modifiers) -> Option<&str> {
        self.iter()
            .find(|(pattern, _)| matches_keybind(pattern, key, modifiers))
            .map(|(_, command)| command)
    }

    /// Display rows for the help overlay: (formatted key, command name).
    pub fn help_rows(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(pattern, command)| (format_keybind(pattern), command.to_string()))
            .collect()
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for KeybindTable {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |table, (p, c)| table.bind(p, c))
    }
}

impl Serialize for KeybindTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.bindings.len()))?;
        for (pattern, command) in &self.bindings {
            map.serialize_entry(pattern, command)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeybindTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = KeybindTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of key patterns to command names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = KeybindTable::new();
                while let Some((pattern, command)) = access.next_entry::<String, String>()? {
                    table = table.bind(pattern, command);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// Look up the command for a key press in a table.
pub fn find_command<'a>(table: &'a KeybindTable, key: &str, modifiers: Modifiers) -> Option<&'a str> {
    table.find_command(key, modifiers)
}

/// Keybind tables for every mode. The visual table serves all three visual
/// modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    pub normal: KeybindTable,
    pub insert: KeybindTable,
    pub visual: KeybindTable,
    pub command: KeybindTable,
}

impl KeybindConfig {
    pub fn table_for(&self, mode: EditorMode) -> &KeybindTable {
        match mode {
            EditorMode::Normal => &self.normal,
            EditorMode::Insert => &self.insert,
            EditorMode::Visual | EditorMode::VisualLine | EditorMode::VisualBlock => &self.visual,
            EditorMode::Command => &self.command,
        }
    }

    /// Tables with their section names, in display order.
    pub fn sections(&self) -> [(&'static str, &KeybindTable); 4] {
        [
            ("Normal", &self.normal),
            ("Insert", &self.insert),
            ("Visual", &self.visual),
            ("Command", &self.command),
        ]
    }
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self {
            normal: [
                ("i", "enter_insert"),
                ("a", "append"),
                ("o", "open_line_below"),
                ("v", "enter_visual"),
                ("shift+v", "enter_visual_line"),
                ("ctrl+v", "enter_visual_block"),
                (":", "enter_command"),
                ("h", "move_left"),
                ("j", "move_down"),
                ("k", "move_up"),
                ("l", "move_right"),
                ("left", "move_left"),
                ("down", "move_down"),
                ("up", "move_up"),
                ("right", "move_right"),
                ("p", "paste"),
                ("x", "delete_char_forward"),
                ("ctrl+p", "toggle_help"),
            ]
            .into_iter()
            .collect(),
            insert: [
                ("escape", "enter_normal"),
                ("enter", "insert_newline"),
                ("backspace", "delete_char"),
                ("left", "move_left"),
                ("down", "move_down"),
                ("up", "move_up"),
                ("right", "move_right"),
                ("ctrl+p", "toggle_help"),
            ]
            .into_iter()
            .collect(),
            visual: [
                ("escape", "exit_visual"),
                ("v", "enter_visual"),
                ("shift+v", "enter_visual_line"),
                ("ctrl+v", "enter_visual_block"),
                ("h", "move_left"),
                ("j", "move_down"),
                ("k", "move_up"),
                ("l", "move_right"),
                ("left", "move_left"),
                ("down", "move_down"),
                ("up", "move_up"),
                ("right", "move_right"),
                ("d", "delete_selection"),
                ("x", "delete_selection"),
                ("y", "yank_selection"),
                ("ctrl+p", "toggle_help"),
            ]
            .into_iter()
            .collect(),
            command: [
                ("escape", "exit_command"),
                ("enter", "execute_command"),
                ("backspace", "delete_command_char"),
            ]
            .into_iter()
            .collect(),
        }
    }
}
