//! Header widget for the TUI.
//!
//! Displays the application name, the model in use, and the database
//! connection status.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    connection_info: &'a str,
    model_info: &'a str,
    is_connected: bool,
}

impl<'a> Header<'a> {
    pub fn new(connection_info: &'a str, model_info: &'a str, is_connected: bool) -> Self {
        Self {
            connection_info,
            model_info,
            is_connected,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_text = format!(
            " SQLFlow v{}  [model: {}]",
            env!("CARGO_PKG_VERSION"),
            self.model_info
        );
        buf.set_span(area.x, area.y, &Span::styled(left_text, style), area.width);

        // Right side: status dot and connection info
        let status_dot = if self.is_connected { "●" } else { "○" };
        let status_color = if self.is_connected {
            Color::Green
        } else {
            Color::Gray
        };
        let status_style = Style::default().bg(Color::Blue).fg(status_color);

        let db_text = format!(" [db: {}] ", self.connection_info);
        let right_width = db_text.chars().count() as u16 + 2;
        if right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, status_dot, status_style);
            buf.set_string(right_x + 2, area.y, &db_text, style);
        }
    }
}
