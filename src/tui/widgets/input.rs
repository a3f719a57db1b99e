//! Input widget for the TUI.
//!
//! Provides the question field with cursor support. The field is disabled
//! while the session is not ready.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Returns the number of characters to skip from the start of the text.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Input bar widget.
pub struct InputBar<'a> {
    text: &'a str,
    cursor: usize,
    focused: bool,
    enabled: bool,
}

impl<'a> InputBar<'a> {
    pub fn new(text: &'a str, cursor: usize, focused: bool, enabled: bool) -> Self {
        Self {
            text,
            cursor,
            focused,
            enabled,
        }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Ask about your database ");

        let prompt_style = if self.enabled {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        // Border left (1) + prompt "> " (2) + border right (1) + cursor space (1) = 5
        let available_width = area.width.saturating_sub(5) as usize;
        let scroll_offset = calculate_scroll_offset(self.cursor, available_width);
        let visible_text: String = self.text.chars().skip(scroll_offset).collect();

        let body = if self.text.is_empty() && !self.enabled {
            Span::styled(
                "Connect from the sidebar first",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
        } else {
            Span::raw(visible_text)
        };

        let line = Line::from(vec![Span::styled("> ", prompt_style), body]);
        Paragraph::new(line).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_offset_cursor_within_width() {
        assert_eq!(calculate_scroll_offset(5, 20), 0);
        assert_eq!(calculate_scroll_offset(20, 20), 0);
    }

    #[test]
    fn test_scroll_offset_cursor_beyond_width() {
        assert_eq!(calculate_scroll_offset(25, 20), 5);
        assert_eq!(calculate_scroll_offset(50, 20), 30);
    }

    #[test]
    fn test_disabled_placeholder() {
        let area = Rect::new(0, 0, 50, 3);
        let mut buf = Buffer::empty(area);
        InputBar::new("", 0, false, false).render(area, &mut buf);

        let row: String = (0..50).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(row.contains("> Connect from the sidebar first"));
    }
}
