use std::path::{Path, PathBuf};

use ropey::Rope;
use uuid::Uuid;

use crate::selection::{Position, Range};

/// An immutable text document.
///
/// Content lives in a rope, so cloning a buffer is cheap and every edit
/// returns a new `TextBuffer` while the original stays untouched. Positions
/// are (line, column) pairs where the column counts `char`s, not bytes.
/// Lines are separated by `\n` only: `"a\n"` has two lines, `""` has one.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBuffer {
    pub id: Uuid,
    pub file_path: Option<PathBuf>,
    pub language: String,
    /// Whether the buffer has been modified since last save.
    pub is_dirty: bool,
    /// Bumped on every content change. Hosts compare it to notice edits.
    pub revision: u64,
    content: Rope,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl TextBuffer {
    /// Create an unnamed buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_path: None,
            language: "plaintext".to_string(),
            is_dirty: false,
            revision: 0,
            content: Rope::from_str(text),
        }
    }

    /// Create a buffer bound to a file path. The language is guessed from the
    /// extension.
    pub fn with_path(path: impl Into<PathBuf>, text: &str) -> Self {
        let path = path.into();
        Self {
            language: detect_language(&path).to_string(),
            file_path: Some(path),
            ..Self::from_text(text)
        }
    }

    /// Get the full text as a single string.
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.content.len_chars()
    }

    /// Number of lines in the buffer. Always at least one.
    pub fn line_count(&self) -> usize {
        self.content.len_lines()
    }

    /// Length of a line in chars, excluding its newline. Zero for lines past
    /// the end of the buffer.
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.line_count() {
            return 0;
        }
        let slice = self.content.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Get a line without its trailing newline.
    pub fn line(&self, line: usize) -> Option<String> {
        if line >= self.line_count() {
            return None;
        }
        let len = self.line_len(line);
        Some(self.content.line(line).slice(..len).to_string())
    }

    /// Get the character at a position, or `None` past the end of the text.
    pub fn char_at(&self, pos: Position) -> Option<char> {
        let offset = self.offset_of(pos);
        if offset >= self.content.len_chars() {
            None
        } else {
            Some(self.content.char(offset))
        }
    }

    /// Text covered by a half-open range. An inverted range yields "".
    pub fn substring(&self, range: Range) -> String {
        let (start, end) = self.span_of(range);
        self.content.slice(start..end).to_string()
    }

    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.line < self.line_count() && pos.column <= self.line_len(pos.line)
    }

    /// Convert a position to a char offset: the start of `pos.line` plus the
    /// column, clamped to the length of the text. A column past the end of its
    /// line spills into the following lines.
    pub fn offset_of(&self, pos: Position) -> usize {
        let len = self.content.len_chars();
        if pos.line >= self.line_count() {
            return len;
        }
        self.content
            .line_to_char(pos.line)
            .saturating_add(pos.column)
            .min(len)
    }

    fn span_of(&self, range: Range) -> (usize, usize) {
        let start = self.offset_of(range.start);
        let end = self.offset_of(range.end).max(start);
        (start, end)
    }

    // ── Edits ────────────────────────────────────────────────────────

    /// Insert text at a position. Inserting nothing returns the buffer
    /// unchanged, dirty flag and revision included.
    pub fn insert_text(&self, pos: Position, text: &str) -> TextBuffer {
        if text.is_empty() {
            return self.clone();
        }
        let offset = self.offset_of(pos);
        let mut content = self.content.clone();
        content.insert(offset, text);
        self.edited(content)
    }

    /// Delete the text in a half-open range. Callers normalize the range
    /// first; an empty or inverted range deletes nothing and leaves the
    /// buffer clean.
    pub fn delete_range(&self, range: Range) -> TextBuffer {
        let (start, end) = self.span_of(range);
        if start == end {
            return self.clone();
        }
        let mut content = self.content.clone();
        content.remove(start..end);
        self.edited(content)
    }

    /// Replace the text in a half-open range.
    pub fn replace_range(&self, range: Range, text: &str) -> TextBuffer {
        let (start, end) = self.span_of(range);
        if start == end && text.is_empty() {
            return self.clone();
        }
        let mut content = self.content.clone();
        content.remove(start..end);
        content.insert(start, text);
        self.edited(content)
    }

    /// Replace the whole content.
    pub fn update_content(&self, text: &str) -> TextBuffer {
        self.edited(Rope::from_str(text))
    }

    /// Clear the dirty flag after the host has persisted the buffer.
    pub fn mark_saved(&self) -> TextBuffer {
        Self {
            is_dirty: false,
            ..self.clone()
        }
    }

    fn edited(&self, content: Rope) -> TextBuffer {
        Self {
            id: self.id,
            file_path: self.file_path.clone(),
            language: self.language.clone(),
            is_dirty: true,
            revision: self.revision + 1,
            content,
        }
    }
}

/// Guess a language tag from a file extension.
pub fn detect_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("rs") => "rust",
        Some("ts" | "tsx") => "typescript",
        Some("js" | "jsx" | "mjs") => "javascript",
        Some("py") => "python",
        Some("md" | "markdown") => "markdown",
        Some("toml") => "toml",
        Some("json") => "json",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> Position {
        Position::new(line, column)
    }

    #[test]
    fn test_new_buffer() {
        let buf = TextBuffer::from_text("");
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_len(0), 0);
        assert!(!buf.is_dirty);
    }

    #[test]
    fn test_from_text() {
        let buf = TextBuffer::from_text("Hello\nWorld\nTest");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line(1).as_deref(), Some("World"));
        assert_eq!(buf.line(3), None);
        assert_eq!(buf.line_len(0), 5);
    }

    #[test]
    fn test_trailing_newline_counts_as_line() {
        let buf = TextBuffer::from_text("a\n");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.line(1).as_deref(), Some(""));
    }

    #[test]
    fn test_insert_is_pure() {
        let buf = TextBuffer::from_text("Hello");
        let edited = buf.insert_text(pos(0, 2), "XYZ");
        assert_eq!(edited.text(), "HeXYZllo");
        assert_eq!(buf.text(), "Hello");
        assert!(edited.is_dirty);
        assert!(!buf.is_dirty);
        assert_eq!(edited.revision, buf.revision + 1);
        assert_eq!(edited.id, buf.id);
    }

    #[test]
    fn test_insert_second_line() {
        let buf = TextBuffer::from_text("Hello\nWorld");
        let edited = buf.insert_text(pos(1, 0), ">");
        assert_eq!(edited.text(), "Hello\n>World");
    }

    #[test]
    fn test_offset_clamps_past_end() {
        let buf = TextBuffer::from_text("ab\ncd");
        assert_eq!(buf.offset_of(pos(9, 0)), 5);
        assert_eq!(buf.offset_of(pos(1, 40)), 5);
        // A column past the line end spills into the next line.
        assert_eq!(buf.offset_of(pos(0, 4)), 4);
    }

    #[test]
    fn test_delete_range() {
        let buf = TextBuffer::from_text("Hello\nWorld\nTest");
        let edited = buf.delete_range(Range::new(pos(0, 3), pos(1, 2)));
        assert_eq!(edited.text(), "Helrld\nTest");
    }

    #[test]
    fn test_delete_inverted_range_is_noop() {
        let buf = TextBuffer::from_text("Hello");
        let edited = buf.delete_range(Range::new(pos(0, 4), pos(0, 1)));
        assert_eq!(edited.text(), "Hello");
    }

    #[test]
    fn test_empty_edits_keep_buffer_clean() {
        let buf = TextBuffer::from_text("Hello");
        assert_eq!(buf.delete_range(Range::new(pos(0, 2), pos(0, 2))), buf);
        assert_eq!(buf.delete_range(Range::new(pos(0, 4), pos(0, 1))), buf);
        assert_eq!(buf.replace_range(Range::new(pos(0, 3), pos(0, 3)), ""), buf);
        assert_eq!(buf.insert_text(pos(0, 1), ""), buf);
        assert!(!buf.delete_range(Range::new(pos(0, 2), pos(0, 2))).is_dirty);

        let replaced = buf.replace_range(Range::new(pos(0, 3), pos(0, 3)), "p");
        assert_eq!(replaced.text(), "Helplo");
        assert!(replaced.is_dirty);
    }

    #[test]
    fn test_replace_range() {
        let buf = TextBuffer::from_text("Hello World");
        let edited = buf.replace_range(Range::new(pos(0, 6), pos(0, 11)), "Rust");
        assert_eq!(edited.text(), "Hello Rust");
    }

    #[test]
    fn test_char_at() {
        let buf = TextBuffer::from_text("ab\ncd");
        assert_eq!(buf.char_at(pos(0, 1)), Some('b'));
        assert_eq!(buf.char_at(pos(0, 2)), Some('\n'));
        assert_eq!(buf.char_at(pos(1, 2)), None);
    }

    #[test]
    fn test_substring_multiline() {
        let buf = TextBuffer::from_text("Hello\nWorld\nTest");
        assert_eq!(buf.substring(Range::new(pos(0, 4), pos(2, 1))), "o\nWorld\nT");
    }

    #[test]
    fn test_unicode_columns() {
        let buf = TextBuffer::from_text("héllo");
        assert_eq!(buf.line_len(0), 5);
        assert_eq!(buf.char_at(pos(0, 1)), Some('é'));
        let edited = buf.delete_range(Range::new(pos(0, 1), pos(0, 2)));
        assert_eq!(edited.text(), "hllo");
    }

    #[test]
    fn test_is_valid_position() {
        let buf = TextBuffer::from_text("ab\ncd");
        assert!(buf.is_valid_position(pos(1, 2)));
        assert!(!buf.is_valid_position(pos(1, 3)));
        assert!(!buf.is_valid_position(pos(2, 0)));
    }

    #[test]
    fn test_mark_saved_and_update_content() {
        let buf = TextBuffer::from_text("one");
        let edited = buf.update_content("two");
        assert!(edited.is_dirty);
        assert_eq!(edited.text(), "two");
        let saved = edited.mark_saved();
        assert!(!saved.is_dirty);
        assert_eq!(saved.text(), "two");
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("main.rs")), "rust");
        assert_eq!(detect_language(Path::new("notes.MD")), "markdown");
        assert_eq!(detect_language(Path::new("Makefile")), "plaintext");
        let buf = TextBuffer::with_path("lib.py", "");
        assert_eq!(buf.language, "python");
        assert_eq!(buf.file_path.as_deref(), Some(Path::new("lib.py")));
    }
}
