use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};
use vedit_core::Config;

/// Errors that can occur when loading the config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load a config file. A missing file is not an error and yields `None`.
pub fn load_config(path: &Path) -> Result<Option<Config>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&text)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a config file, falling back to defaults on any problem. Problems are
/// logged as warnings and never stop the editor.
pub fn load_or_default(path: &Path) -> Config {
    match load_config(path) {
        Ok(Some(config)) => {
            for warning in config.validate() {
                warn!(path = %path.display(), "{warning}");
            }
            config
        }
        Ok(None) => Config::default(),
        Err(err) => {
            warn!("{err}; using default config");
            Config::default()
        }
    }
}

/// Watches the config file for changes by polling its modification time.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: Option<PathBuf>,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: Option<PathBuf>) -> Self {
        let last_modified = path.as_deref().and_then(modified);
        Self {
            path,
            last_modified,
        }
    }

    /// The config as it is on disk right now.
    pub fn load(&self) -> Config {
        match &self.path {
            Some(path) => load_or_default(path),
            None => Config::default(),
        }
    }

    /// Returns a freshly loaded config if the file changed since the last
    /// poll (including being created or deleted).
    pub fn poll(&mut self) -> Option<Config> {
        let path = self.path.as_deref()?;
        let current = modified(path);
        if current == self.last_modified {
            return None;
        }
        self.last_modified = current;
        info!(path = %path.display(), "config changed, reloading");
        Some(load_or_default(path))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vedit-{}-{name}.toml", std::process::id()))
    }

    #[test]
    fn test_missing_file_is_none() {
        let path = scratch_path("missing");
        assert!(matches!(load_config(&path), Ok(None)));
        assert_eq!(load_or_default(&path), Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let path = scratch_path("partial");
        std::fs::write(&path, "[ui]\ngutter = \"white\"\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.ui.gutter, "white");
        assert_eq!(config.keybindings, Config::default().keybindings);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_parse_error_falls_back_to_default() {
        let path = scratch_path("broken");
        std::fs::write(&path, "[ui\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(load_or_default(&path), Config::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_watcher_without_path() {
        let mut watcher = ConfigWatcher::new(None);
        assert_eq!(watcher.poll(), None);
        assert_eq!(watcher.load(), Config::default());
    }

    #[test]
    fn test_watcher_sees_new_file() {
        let path = scratch_path("watched");
        let _ = std::fs::remove_file(&path);
        let mut watcher = ConfigWatcher::new(Some(path.clone()));
        assert_eq!(watcher.poll(), None);
        std::fs::write(&path, "[ui]\nhelp_border = \"red\"\n").unwrap();
        let reloaded = watcher.poll().expect("file appeared");
        assert_eq!(reloaded.ui.help_border, "red");
        assert_eq!(watcher.poll(), None);
        std::fs::remove_file(&path).unwrap();
    }
}
