use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "vedit").context("Could not determine home directory")
}

/// Returns the path to the user config file.
/// Location: `~/.config/vedit/config.toml` (XDG-compliant)
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Returns the path to the log file, creating its directory.
/// Location: `~/.local/share/vedit/vedit.log`
pub fn log_path() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("vedit.log"))
}
