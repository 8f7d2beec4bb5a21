use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;
use vedit_core::help::editor_help_entries;
use vedit_core::selection::normalize_selection;
use vedit_core::{AppState, EditorMode, Selection, SyntaxToken};

use crate::help_popup;

/// Scroll positions kept between frames.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First buffer line on screen.
    pub top_line: usize,
    /// First line of the help popup on screen.
    pub help_scroll: u16,
}

/// Render the whole editor screen.
pub fn render(frame: &mut Frame, state: &AppState, viewport: &mut Viewport) {
    let area = frame.area();
    let [text_area, status_area, command_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_buffer(frame, text_area, state, &mut viewport.top_line);
    render_status_bar(frame, status_area, state);
    render_command_line(frame, command_area, state);

    if state.modal.show_help_menu {
        let entries = editor_help_entries(&state.config.keybindings);
        let border = parse_color(&state.config.ui.help_border);
        viewport.help_scroll =
            help_popup::render(frame, area, &entries, border, viewport.help_scroll);
    }
}

/// Parse a colour name or `#rrggbb` string; unknown values fall back to the
/// terminal default.
pub fn parse_color(value: &str) -> Color {
    value.parse().unwrap_or(Color::Reset)
}

/// Move `top_line` only as far as needed to keep the cursor on screen.
pub fn scroll_to_cursor(top_line: usize, cursor_line: usize, height: usize) -> usize {
    if cursor_line < top_line {
        cursor_line
    } else if height > 0 && cursor_line >= top_line + height {
        cursor_line + 1 - height
    } else {
        top_line
    }
}

fn render_buffer(frame: &mut Frame, area: Rect, state: &AppState, top_line: &mut usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let buffer = &state.buffer;
    let ui = &state.config.ui;
    let cursor = state.cursor();
    let mode = state.mode();

    let line_count = buffer.line_count();
    let gutter_width: u16 = line_count.to_string().len() as u16 + 2;
    let gutter_area = Rect {
        width: gutter_width.min(area.width),
        ..area
    };
    let text_area = Rect {
        x: area.x + gutter_area.width,
        width: area.width.saturating_sub(gutter_area.width),
        ..area
    };

    let visible_lines = area.height as usize;
    let scroll_offset = scroll_to_cursor(*top_line, cursor.line, visible_lines);
    *top_line = scroll_offset;

    let gutter_style = Style::default().fg(parse_color(&ui.gutter));
    let current_style = Style::default().fg(parse_color(&ui.current_line_number));
    let selection_style = Style::default().bg(parse_color(&ui.selection_bg));
    let number_width = gutter_width as usize - 2;

    let mut gutter_lines: Vec<Line> = Vec::new();
    let mut text_lines: Vec<Line> = Vec::new();

    for i in scroll_offset..line_count.min(scroll_offset + visible_lines) {
        let style = if i == cursor.line {
            current_style
        } else {
            gutter_style
        };
        gutter_lines.push(Line::from(Span::styled(
            format!("{:>number_width$} ", i + 1),
            style,
        )));

        let text = buffer.line(i).unwrap_or_default();
        let selected = state
            .selection
            .as_ref()
            .and_then(|sel| highlight_columns(mode, sel, i, text.chars().count()));
        text_lines.push(styled_line(
            &text,
            i,
            &state.syntax,
            selected,
            selection_style,
        ));
    }

    for _ in line_count.saturating_sub(scroll_offset)..visible_lines {
        gutter_lines.push(Line::from(Span::styled(
            format!("{:>number_width$} ", "~"),
            gutter_style,
        )));
        text_lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(gutter_lines), gutter_area);
    frame.render_widget(Paragraph::new(text_lines), text_area);

    if mode != EditorMode::Command {
        let line_text = buffer.line(cursor.line).unwrap_or_default();
        let prefix: String = line_text.chars().take(cursor.column).collect();
        let cursor_x = text_area.x + prefix.width() as u16;
        let cursor_y = text_area.y + (cursor.line - scroll_offset) as u16;
        if cursor_x < text_area.x + text_area.width && cursor_y < text_area.y + text_area.height {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }
}

/// Half-open column span of `line` covered by the selection, if any. Visual
/// and line-wise selections show the span that `d` and `y` act on.
pub fn highlight_columns(
    mode: EditorMode,
    sel: &Selection,
    line: usize,
    line_len: usize,
) -> Option<(usize, usize)> {
    let (start, end) = match mode {
        EditorMode::Visual | EditorMode::VisualLine => {
            let range = normalize_selection(sel);
            if line < range.start.line || line > range.end.line {
                return None;
            }
            let start = if line == range.start.line {
                range.start.column
            } else {
                0
            };
            let end = if line == range.end.line {
                range.end.column
            } else {
                line_len
            };
            (start, end)
        }
        EditorMode::VisualBlock => {
            let first = sel.anchor.line.min(sel.active.line);
            let last = sel.anchor.line.max(sel.active.line);
            if line < first || line > last {
                return None;
            }
            (
                sel.anchor.column.min(sel.active.column),
                sel.anchor.column.max(sel.active.column),
            )
        }
        _ => return None,
    };

    let (start, end) = (start.min(line_len), end.min(line_len));
    (start < end).then_some((start, end))
}

/// Build one display line, colouring syntax tokens and the selected span.
fn styled_line(
    text: &str,
    line: usize,
    tokens: &[SyntaxToken],
    selected: Option<(usize, usize)>,
    selection_style: Style,
) -> Line<'static> {
    let chars: Vec<char> = text.chars().collect();
    let mut styles = vec![Style::default(); chars.len()];

    for token in tokens {
        let range = token.range;
        if range.start.line > line || range.end.line < line {
            continue;
        }
        let start = if range.start.line == line {
            range.start.column
        } else {
            0
        };
        let end = if range.end.line == line {
            range.end.column
        } else {
            chars.len()
        };
        let color = token_color(&token.kind);
        for style in styles
            .iter_mut()
            .take(end.min(chars.len()))
            .skip(start)
        {
            *style = style.fg(color);
        }
    }

    if let Some((start, end)) = selected {
        for style in styles.iter_mut().take(end).skip(start) {
            *style = style.patch(selection_style);
        }
    }

    // Merge runs of equally styled chars into spans
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    for (c, style) in chars.into_iter().zip(styles) {
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(c);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }

    Line::from(spans)
}

fn token_color(kind: &str) -> Color {
    match kind {
        "keyword" => Color::Magenta,
        "string" => Color::Green,
        "comment" => Color::DarkGray,
        "number" | "constant" => Color::Cyan,
        "type" => Color::Yellow,
        "function" => Color::Blue,
        _ => Color::Reset,
    }
}

/// Render the bottom status bar: mode badge, file, dirty marker, message and
/// cursor position.
fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let mode = state.mode();
    let badge_style = Style::default()
        .bg(parse_color(state.config.ui.mode_color(mode)))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);

    let file_name = state
        .buffer
        .file_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "[No Name]".to_string());
    let dirty = if state.buffer.is_dirty { " [+]" } else { "" };

    let cursor = state.cursor();
    let position = format!(" {}:{} ", cursor.line + 1, cursor.column + 1);

    let mut spans = vec![
        Span::styled(format!(" {} ", mode.label()), badge_style),
        Span::raw(" "),
        Span::styled(
            format!("{file_name}{dirty}"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(message) = &state.message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    let [left_area, right_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(position.len() as u16),
    ])
    .areas(area);

    frame.render_widget(Paragraph::new(Line::from(spans)), left_area);
    frame.render_widget(
        Paragraph::new(position).style(Style::default().add_modifier(Modifier::REVERSED)),
        right_area,
    );
}

/// Render the command-line input at the bottom while in Command mode.
fn render_command_line(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.mode() != EditorMode::Command {
        return;
    }

    let input = &state.modal.command_buffer;
    let line = Line::from(vec![
        Span::styled(":", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(input.clone()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + 1 + input.width() as u16;
    if cursor_x < area.x + area.width {
        frame.set_cursor_position((cursor_x, area.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use vedit_core::{Modifiers, Position, Range, TextBuffer, handle_keystroke};

    fn sel(anchor: (usize, usize), active: (usize, usize)) -> Selection {
        Selection::new(
            Position::new(anchor.0, anchor.1),
            Position::new(active.0, active.1),
        )
    }

    fn screen_text(state: &AppState) -> String {
        screen_text_with(state, &mut Viewport::default(), 40, 8)
    }

    fn screen_text_with(
        state: &AppState,
        viewport: &mut Viewport,
        width: u16,
        height: u16,
    ) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, state, viewport)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("blue"), Color::Blue);
        assert_eq!(parse_color("#44447a"), Color::Rgb(0x44, 0x44, 0x7a));
        assert_eq!(parse_color("not-a-colour"), Color::Reset);
    }

    #[test]
    fn test_visual_columns_span_lines() {
        let s = sel((2, 3), (0, 1));
        assert_eq!(highlight_columns(EditorMode::Visual, &s, 0, 5), Some((1, 5)));
        assert_eq!(highlight_columns(EditorMode::Visual, &s, 1, 4), Some((0, 4)));
        assert_eq!(highlight_columns(EditorMode::Visual, &s, 2, 5), Some((0, 3)));
        assert_eq!(highlight_columns(EditorMode::Visual, &s, 3, 5), None);
    }

    #[test]
    fn test_visual_line_shows_normalized_span() {
        // Downward: anchor at column 0, active at the end of the cursor line
        let down = sel((0, 0), (1, 3));
        assert_eq!(highlight_columns(EditorMode::VisualLine, &down, 0, 7), Some((0, 7)));
        assert_eq!(highlight_columns(EditorMode::VisualLine, &down, 1, 3), Some((0, 3)));
        assert_eq!(highlight_columns(EditorMode::VisualLine, &down, 2, 3), None);

        // Upward: the span starts at the end of the top line
        let up = sel((2, 0), (0, 2));
        assert_eq!(highlight_columns(EditorMode::VisualLine, &up, 0, 2), None);
        assert_eq!(highlight_columns(EditorMode::VisualLine, &up, 1, 3), Some((0, 3)));
        assert_eq!(highlight_columns(EditorMode::VisualLine, &up, 2, 4), None);
    }

    #[test]
    fn test_scroll_to_cursor() {
        assert_eq!(scroll_to_cursor(0, 3, 6), 0);
        assert_eq!(scroll_to_cursor(0, 10, 6), 5);
        // Inside the window: the view stays put
        assert_eq!(scroll_to_cursor(5, 7, 6), 5);
        assert_eq!(scroll_to_cursor(5, 5, 6), 5);
        assert_eq!(scroll_to_cursor(5, 2, 6), 2);
        assert_eq!(scroll_to_cursor(4, 9, 0), 4);
    }

    #[test]
    fn test_viewport_persists_between_frames() {
        let text: Vec<String> = (1..=20).map(|n| format!("line{n}")).collect();
        let mut state = AppState::new(TextBuffer::from_text(&text.join("\n")));
        let mut viewport = Viewport::default();

        for _ in 0..10 {
            state = handle_keystroke(&state, "j", Modifiers::NONE);
        }
        screen_text_with(&state, &mut viewport, 40, 8);
        // 6 text rows: line 11 is the bottom row
        assert_eq!(viewport.top_line, 5);

        state = handle_keystroke(&state, "k", Modifiers::NONE);
        state = handle_keystroke(&state, "k", Modifiers::NONE);
        let screen = screen_text_with(&state, &mut viewport, 40, 8);
        assert_eq!(viewport.top_line, 5);
        assert!(screen.contains("line6"));
        assert!(!screen.contains("line5 "));
    }

    #[test]
    fn test_help_popup_scrolls_to_footer() {
        let state = handle_keystroke(
            &AppState::new(TextBuffer::from_text("")),
            "p",
            Modifiers::CTRL,
        );

        let mut viewport = Viewport::default();
        let top = screen_text_with(&state, &mut viewport, 80, 24);
        assert!(top.contains("Normal"));
        assert!(!top.contains("Esc  close"));

        viewport.help_scroll = u16::MAX;
        let bottom = screen_text_with(&state, &mut viewport, 80, 24);
        assert!(bottom.contains("Command line"));
        assert!(bottom.contains(":wq"));
        assert!(bottom.contains("Esc  close"));
        assert!(viewport.help_scroll > 0 && viewport.help_scroll < u16::MAX);
    }

    #[test]
    fn test_block_columns_are_clamped() {
        let s = sel((0, 4), (2, 1));
        assert_eq!(highlight_columns(EditorMode::VisualBlock, &s, 1, 10), Some((1, 4)));
        assert_eq!(highlight_columns(EditorMode::VisualBlock, &s, 2, 2), Some((1, 2)));
        assert_eq!(highlight_columns(EditorMode::VisualBlock, &s, 0, 1), None);
    }

    #[test]
    fn test_no_highlight_outside_visual() {
        let s = sel((0, 0), (0, 3));
        assert_eq!(highlight_columns(EditorMode::Normal, &s, 0, 5), None);
    }

    #[test]
    fn test_styled_line_merges_runs() {
        let tokens = vec![SyntaxToken {
            range: Range::new(Position::new(0, 0), Position::new(0, 2)),
            kind: "keyword".to_string(),
        }];
        let line = styled_line("fn main", 0, &tokens, None, Style::default());
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "fn");
        assert_eq!(line.spans[0].style.fg, Some(Color::Magenta));
        assert_eq!(line.spans[1].content, " main");
    }

    #[test]
    fn test_styled_line_selection_overlays_tokens() {
        let tokens = vec![SyntaxToken {
            range: Range::new(Position::new(0, 0), Position::new(1, 0)),
            kind: "comment".to_string(),
        }];
        let selection = Style::default().bg(Color::Blue);
        let line = styled_line("// hi", 0, &tokens, Some((3, 5)), selection);
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[1].content, "hi");
        assert_eq!(line.spans[1].style.fg, Some(Color::DarkGray));
        assert_eq!(line.spans[1].style.bg, Some(Color::Blue));
    }

    #[test]
    fn test_screen_shows_text_and_mode() {
        let state = AppState::new(TextBuffer::from_text("hello\nworld"));
        let screen = screen_text(&state);
        assert!(screen.contains("hello"));
        assert!(screen.contains("world"));
        assert!(screen.contains("NORMAL"));
        assert!(screen.contains("[No Name]"));
        assert!(screen.contains("1:1"));
    }

    #[test]
    fn test_screen_shows_command_line() {
        let mut state = AppState::new(TextBuffer::from_text("x"));
        for key in [":", "w", "q"] {
            state = handle_keystroke(&state, key, Modifiers::NONE);
        }
        let screen = screen_text(&state);
        assert!(screen.contains("COMMAND"));
        assert!(screen.contains(":wq"));
    }

    #[test]
    fn test_screen_shows_help_popup() {
        let state = handle_keystroke(
            &AppState::new(TextBuffer::from_text("")),
            "p",
            Modifiers::CTRL,
        );
        assert!(state.modal.show_help_menu);
        assert!(screen_text(&state).contains("Keybindings"));
    }
}
