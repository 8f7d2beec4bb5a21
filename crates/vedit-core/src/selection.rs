use crate::buffer::TextBuffer;
use crate::modal::EditorMode;

/// A position within a text buffer. Zero-based; the column counts `char`s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// The origin position (0, 0).
    pub const ZERO: Position = Position { line: 0, column: 0 };

    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open span `[start, end)`. `start` need not precede `end` until the
/// range is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A visual-mode selection.
///
/// `anchor` is fixed when the selection begins and `active` follows the
/// cursor. Which end comes first in the text is computed on demand by
/// [`normalize_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    pub const fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// An empty selection at a single point.
    pub const fn collapsed(pos: Position) -> Self {
        Self {
            anchor: pos,
            active: pos,
        }
    }

    pub fn start(&self) -> Position {
        normalize_selection(self).start
    }

    pub fn end(&self) -> Position {
        normalize_selection(self).end
    }
}

/// Order the two ends of a selection. Ties resolve to anchor-as-start.
pub fn normalize_selection(sel: &Selection) -> Range {
    if sel.anchor <= sel.active {
        Range::new(sel.anchor, sel.active)
    } else {
        Range::new(sel.active, sel.anchor)
    }
}

/// Clamp a position to the nearest valid coordinate in the buffer.
///
/// Every cursor movement goes through here.
pub fn clamp_cursor_position(pos: Position, buffer: &TextBuffer) -> Position {
    let last_line = buffer.line_count().saturating_sub(1);
    let line = pos.line.min(last_line);
    let column = pos.column.min(buffer.line_len(line));
    Position { line, column }
}

/// Text covered by a selection, read line by line.
///
/// A single-line selection slices that line. A multi-line selection joins the
/// tail of the first line, every interior line, and the head of the last line
/// with `\n`.
pub fn extract_selection_text(buffer: &TextBuffer, sel: &Selection) -> String {
    let Range { start, end } = normalize_selection(sel);
    let line_text = |n: usize| buffer.line(n).unwrap_or_default();

    if start.line == end.line {
        return char_slice(&line_text(start.line), start.column, end.column);
    }

    let mut parts = Vec::with_capacity(end.line - start.line + 1);
    parts.push(char_slice(&line_text(start.line), start.column, usize::MAX));
    for n in start.line + 1..end.line {
        parts.push(line_text(n));
    }
    parts.push(char_slice(&line_text(end.line), 0, end.column));
    parts.join("\n")
}

/// Selection a visual mode starts with when entered at `cursor`.
pub fn initial_selection(mode: EditorMode, cursor: Position, buffer: &TextBuffer) -> Selection {
    update_selection(mode, Selection::collapsed(cursor), cursor, buffer)
}

/// Reshape a selection after the cursor moved to `new_cursor` (already
/// clamped).
///
/// - `Visual`: the active end follows the cursor.
/// - `VisualLine`: recomputed as whole lines, from column 0 of the anchor
///   line to the end of the cursor line. Horizontal moves leave it unchanged.
/// - `VisualBlock`: folded to the (min, max) corners of the rectangle spanned
///   by the anchor and the cursor. Which corner was the original anchor is
///   not kept.
///
/// Other modes have no selection and return it untouched.
pub fn update_selection(
    mode: EditorMode,
    selection: Selection,
    new_cursor: Position,
    buffer: &TextBuffer,
) -> Selection {
    let anchor = selection.anchor;
    match mode {
        EditorMode::Visual => Selection::new(anchor, new_cursor),
        EditorMode::VisualLine => Selection::new(
            Position::new(anchor.line, 0),
            Position::new(new_cursor.line, buffer.line_len(new_cursor.line)),
        ),
        EditorMode::VisualBlock => Selection::new(
            Position::new(
                anchor.line.min(new_cursor.line),
                anchor.column.min(new_cursor.column),
            ),
            Position::new(
                anchor.line.max(new_cursor.line),
                anchor.column.max(new_cursor.column),
            ),
        ),
        EditorMode::Normal | EditorMode::Insert | EditorMode::Command => selection,
    }
}

/// Slice a string by char indices, clamping both ends.
fn char_slice(s: &str, from: usize, to: usize) -> String {
    if to <= from {
        return String::new();
    }
    s.chars().skip(from).take(to - from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> Position {
        Position::new(line, column)
    }

    #[test]
    fn test_normalize_forward_and_backward() {
        let forward = Selection::new(pos(0, 1), pos(2, 3));
        let backward = Selection::new(pos(2, 3), pos(0, 1));
        assert_eq!(normalize_selection(&forward), Range::new(pos(0, 1), pos(2, 3)));
        assert_eq!(normalize_selection(&forward), normalize_selection(&backward));
    }

    #[test]
    fn test_normalize_same_line() {
        let sel = Selection::new(pos(1, 5), pos(1, 2));
        assert_eq!(sel.start(), pos(1, 2));
        assert_eq!(sel.end(), pos(1, 5));
    }

    #[test]
    fn test_clamp_cursor() {
        let buf = TextBuffer::from_text("Hello\nWo");
        assert_eq!(clamp_cursor_position(pos(0, 3), &buf), pos(0, 3));
        assert_eq!(clamp_cursor_position(pos(1, 9), &buf), pos(1, 2));
        assert_eq!(clamp_cursor_position(pos(7, 4), &buf), pos(1, 2));
        assert_eq!(clamp_cursor_position(pos(0, 5), &buf), pos(0, 5));
    }

    #[test]
    fn test_clamp_empty_buffer() {
        let buf = TextBuffer::from_text("");
        assert_eq!(clamp_cursor_position(pos(3, 3), &buf), Position::ZERO);
    }

    #[test]
    fn test_extract_single_line() {
        let buf = TextBuffer::from_text("Hello\nWorld");
        let sel = Selection::new(pos(0, 0), pos(0, 2));
        assert_eq!(extract_selection_text(&buf, &sel), "He");
    }

    #[test]
    fn test_extract_multi_line() {
        let buf = TextBuffer::from_text("Hello\nWorld\nTest");
        let sel = Selection::new(pos(2, 2), pos(0, 3));
        assert_eq!(extract_selection_text(&buf, &sel), "lo\nWorld\nTe");
    }

    #[test]
    fn test_visual_update_moves_active_only() {
        let buf = TextBuffer::from_text("Hello\nWorld");
        let sel = Selection::collapsed(pos(0, 1));
        let next = update_selection(EditorMode::Visual, sel, pos(1, 3), &buf);
        assert_eq!(next, Selection::new(pos(0, 1), pos(1, 3)));
    }

    #[test]
    fn test_visual_line_covers_full_lines() {
        let buf = TextBuffer::from_text("Hello\nWorld!\nTest");
        let sel = initial_selection(EditorMode::VisualLine, pos(0, 3), &buf);
        assert_eq!(sel, Selection::new(pos(0, 0), pos(0, 5)));
        let down = update_selection(EditorMode::VisualLine, sel, pos(1, 2), &buf);
        assert_eq!(down, Selection::new(pos(0, 0), pos(1, 6)));
        // Horizontal movement keeps the shape.
        let right = update_selection(EditorMode::VisualLine, down, pos(1, 3), &buf);
        assert_eq!(right, down);
    }

    #[test]
    fn test_visual_block_folds_corners() {
        let buf = TextBuffer::from_text("Hello\nWorld\nTest");
        let sel = Selection::collapsed(pos(1, 3));
        let next = update_selection(EditorMode::VisualBlock, sel, pos(0, 1), &buf);
        assert_eq!(next, Selection::new(pos(0, 1), pos(1, 3)));
    }

    #[test]
    fn test_range_is_empty() {
        assert!(Range::new(pos(1, 1), pos(1, 1)).is_empty());
        assert!(!Range::new(pos(0, 0), pos(0, 1)).is_empty());
    }
}
