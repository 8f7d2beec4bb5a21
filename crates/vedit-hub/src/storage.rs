use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use vedit_core::TextBuffer;

/// Open a file as a buffer. A file that does not exist yet opens as an empty
/// buffer bound to that path.
pub fn open_buffer(path: &Path) -> Result<TextBuffer> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "new file");
            String::new()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    let buffer = TextBuffer::with_path(path, &text);
    info!(
        path = %path.display(),
        lines = buffer.line_count(),
        language = %buffer.language,
        "opened buffer"
    );
    Ok(buffer)
}

/// Write a buffer to its file and return the saved (clean) snapshot.
pub fn save_buffer(buffer: &TextBuffer) -> Result<TextBuffer> {
    let path = buffer.file_path.as_deref().context("No file name")?;
    std::fs::write(path, buffer.text())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = buffer.text().len(), "wrote buffer");
    Ok(buffer.mark_saved())
}
