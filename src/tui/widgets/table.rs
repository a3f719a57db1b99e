//! Result grid widget for the TUI.
//!
//! Renders a row set as a box-drawn grid with column headers, auto-sized
//! columns and styled NULL values. A row set with columns but no rows still
//! renders its header.

use crate::db::{RowSet, Value};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Widget for rendering a row set as a grid.
pub struct ResultTable<'a> {
    rows: &'a RowSet,
}

impl<'a> ResultTable<'a> {
    pub fn new(rows: &'a RowSet) -> Self {
        Self { rows }
    }

    /// Calculates the optimal width for each column.
    fn calculate_column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .rows
            .columns
            .iter()
            .map(|col| col.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in &self.rows.rows {
            for (width, value) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }

        widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates a string to `max_width` characters, adding an ellipsis if needed.
    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let head: String = s.chars().take(max_width - 3).collect();
            format!("{head}...")
        }
    }

    /// Renders the grid to lines for embedding in other widgets.
    pub fn render_to_lines(&self, available_width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        if self.rows.columns.is_empty() {
            lines.push(Line::from(Span::styled(
                "(empty result)",
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        }

        let widths = self.calculate_column_widths();

        // Borders and padding
        let total_width: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
        let scale_factor = if total_width > available_width && available_width > 0 {
            available_width as f64 / total_width as f64
        } else {
            1.0
        };

        let widths: Vec<usize> = widths
            .iter()
            .map(|&w| ((w as f64 * scale_factor) as usize).max(MIN_COLUMN_WIDTH))
            .collect();

        lines.push(Self::render_border(&widths, '┌', '┬', '┐'));
        lines.push(self.render_header_row(&widths));
        lines.push(Self::render_border(&widths, '├', '┼', '┤'));
        for row in &self.rows.rows {
            lines.push(Self::render_data_row(row, &widths));
        }
        lines.push(Self::render_border(&widths, '└', '┴', '┘'));

        let count = self.rows.len();
        lines.push(Line::from(Span::styled(
            format!("{} row{} returned", count, if count == 1 { "" } else { "s" }),
            Style::default().fg(Color::DarkGray),
        )));

        lines
    }

    fn render_border(widths: &[usize], left: char, mid: char, right: char) -> Line<'static> {
        let segments: Vec<String> = widths.iter().map(|&w| "─".repeat(w + 2)).collect();
        let border = format!("{left}{}{right}", segments.join(&mid.to_string()));
        Line::from(Span::styled(border, Style::default().fg(Color::DarkGray)))
    }

    fn render_header_row(&self, widths: &[usize]) -> Line<'static> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (col, &width) in self.rows.columns.iter().zip(widths) {
            spans.push(Span::styled(
                format!(" {:width$} ", Self::truncate(col, width), width = width),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }

    fn render_data_row(row: &[Value], widths: &[usize]) -> Line<'static> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (i, &width) in widths.iter().enumerate() {
            let value = row.get(i).unwrap_or(&Value::Null);
            let display = Self::truncate(&value.to_display_string(), width);

            let style = if value.is_null() {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };

            spans.push(Span::styled(
                format!(" {:width$} ", display, width = width),
                style,
            ));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }
}

impl Widget for ResultTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.render_to_lines(area.width as usize);

        for (i, line) in lines.iter().take(area.height as usize).enumerate() {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}
