use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use vedit_core::help::HelpEntry;

/// Render the help popup centered on screen, starting `scroll` lines down.
///
/// Returns the scroll offset actually used, clamped so the last line stays at
/// the bottom of the popup.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    entries: &[HelpEntry],
    border: Color,
    scroll: u16,
) -> u16 {
    if entries.is_empty() {
        return 0;
    }

    let lines = build_lines(entries);

    let popup_width = (area.width.saturating_sub(8)).min(60);
    let popup_height = (area.height.saturating_sub(4)).min(lines.len() as u16 + 2);
    let popup_area = centered_rect(popup_width, popup_height, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let scroll = scroll.min(max_scroll(lines.len(), popup_height));

    let paragraph = Paragraph::new(lines).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, popup_area);
    scroll
}

/// Largest useful scroll offset for `line_count` lines in a bordered popup.
fn max_scroll(line_count: usize, popup_height: u16) -> u16 {
    (line_count as u16).saturating_sub(popup_height.saturating_sub(2))
}

/// Build display lines from entries, inserting section headers.
fn build_lines(entries: &[HelpEntry]) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current_section: Option<&str> = None;

    for entry in entries {
        if let Some(section) = entry.section.as_deref() {
            if current_section != Some(section) {
                if !lines.is_empty() {
                    lines.push(Line::from(""));
                }
                lines.push(Line::from(Span::styled(
                    format!(" {section}"),
                    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                )));
                current_section = Some(section);
            }
        }

        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:>12} ", entry.key),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled("  ", Style::default().add_modifier(Modifier::DIM)),
            Span::raw(entry.description.clone()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Esc  close    j/k  scroll",
        Style::default().add_modifier(Modifier::DIM),
    )));

    lines
}

/// Helper to create a centered rect within a given area.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
