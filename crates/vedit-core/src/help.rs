use crate::command::Command;
use crate::keybinds::KeybindConfig;

/// A single entry in the help overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// The key combination as displayed (e.g., "Ctrl+P", "h").
    pub key: String,
    /// Human-readable description (e.g., "Move left").
    pub description: String,
    /// Section header this entry belongs to.
    pub section: Option<String>,
}

impl HelpEntry {
    pub fn with_section(
        section: impl Into<String>,
        key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            section: Some(section.into()),
        }
    }
}

/// Help entries for the live keybind tables, one section per mode.
pub fn editor_help_entries(keybindings: &KeybindConfig) -> Vec<HelpEntry> {
    let mut entries = Vec::new();
    for (section, table) in keybindings.sections() {
        for (key, command_name) in table.help_rows() {
            let command = Command::from_name(&command_name);
            let description = if command.is_known() {
                command.description().to_string()
            } else {
                command_name
            };
            entries.push(HelpEntry::with_section(section, key, description));
        }
    }
    entries.push(HelpEntry::with_section("Command line", ":w", "Write file"));
    entries.push(HelpEntry::with_section("Command line", ":q / :q!", "Quit / force quit"));
    entries.push(HelpEntry::with_section("Command line", ":wq", "Write and quit"));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_follow_tables() {
        let entries = editor_help_entries(&KeybindConfig::default());
        let first = &entries[0];
        assert_eq!(first.section.as_deref(), Some("Normal"));
        assert_eq!(first.key, "i");
        assert_eq!(first.description, "Enter Insert mode");
        assert!(
            entries
                .iter()
                .any(|e| e.key == "Ctrl+P" && e.description == "Toggle this help")
        );
    }

    #[test]
    fn test_unknown_command_shows_raw_name() {
        let mut keybindings = KeybindConfig::default();
        keybindings.command = keybindings.command.clone().bind("ctrl+r", "history_search");
        let entries = editor_help_entries(&keybindings);
        assert!(
            entries
                .iter()
                .any(|e| e.key == "Ctrl+R" && e.description == "history_search")
        );
    }

    #[test]
    fn test_every_entry_has_a_section() {
        let entries = editor_help_entries(&KeybindConfig::default());
        assert!(entries.iter().all(|e| e.section.is_some()));
    }
}
