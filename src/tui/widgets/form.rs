//! Connection form widget for the TUI sidebar.
//!
//! Shows the connection fields with secrets masked, the selected field, and
//! the outcome of the last Connect press.

use crate::tui::app::{ConfigForm, FormField, FormStatus};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Rows each field takes: label, value, spacer.
pub const FIELD_HEIGHT: u16 = 3;

/// Rows above the first field: the backend line and a spacer.
pub const FIELDS_TOP: u16 = 2;

/// Sidebar form widget.
pub struct FormPanel<'a> {
    form: &'a ConfigForm,
    focused: bool,
}

impl<'a> FormPanel<'a> {
    pub fn new(form: &'a ConfigForm, focused: bool) -> Self {
        Self { form, focused }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Backend: ", Style::default().fg(Color::Gray)),
                Span::raw(self.form.backend.to_string()),
            ]),
            Line::from(""),
        ];

        for (i, field) in FormField::ALL.iter().enumerate() {
            let selected = i == self.form.selected;
            let marker = if selected && self.focused { "▸ " } else { "  " };
            let label_style = if selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };

            lines.push(Line::from(Span::styled(
                format!("{marker}{}", field.label(self.form.backend)),
                label_style,
            )));
            lines.push(Line::from(format!("  {}", self.form.display_value(*field))));
            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled(
            "Enter: Connect",
            Style::default().fg(Color::DarkGray),
        )));

        match self.form.status {
            Some(FormStatus::Connected) => lines.push(Line::from(Span::styled(
                "Connected to database!",
                Style::default().fg(Color::Green),
            ))),
            Some(FormStatus::Failed) => lines.push(Line::from(Span::styled(
                "Connection failed",
                Style::default().fg(Color::Red),
            ))),
            None => {}
        }

        lines
    }
}

impl Widget for FormPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Connection ");

        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_form_masks_secrets() {
        let form = ConfigForm::from_config(&Configuration {
            password: "hunter2".to_string(),
            api_key: "abc".to_string(),
            ..Default::default()
        });
        let area = Rect::new(0, 0, 30, 26);
        let mut buf = Buffer::empty(area);
        FormPanel::new(&form, true).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("▸ Host"));
        assert!(text.contains("localhost"));
        assert!(text.contains("•••••••"));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("abc"));
        assert!(text.contains("Enter: Connect"));
    }

    #[test]
    fn test_form_shows_status() {
        let mut form = ConfigForm::from_config(&Configuration::default());
        form.status = Some(FormStatus::Connected);
        let area = Rect::new(0, 0, 30, 26);
        let mut buf = Buffer::empty(area);
        FormPanel::new(&form, false).render(area, &mut buf);
        assert!(buffer_text(&buf).contains("Connected to database!"));
    }
}
