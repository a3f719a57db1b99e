//! Chat panel widget for the TUI.
//!
//! Displays the conversation, generated SQL and query results. While the
//! session is not ready, a warning is pinned to the top of the panel.

use super::table::ResultTable;
use crate::tui::app::ChatEntry;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Chat panel widget.
pub struct ChatPanel<'a> {
    entries: &'a [ChatEntry],
    warning: Option<&'a str>,
    scroll: u16,
    focused: bool,
}

impl<'a> ChatPanel<'a> {
    pub fn new(
        entries: &'a [ChatEntry],
        warning: Option<&'a str>,
        scroll: u16,
        focused: bool,
    ) -> Self {
        Self {
            entries,
            warning,
            scroll,
            focused,
        }
    }
}

/// Word-wraps `text` to `width` columns. Words longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            if current_len > 0 && current_len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn text_lines(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    wrap_text(text, width.saturating_sub(2))
        .into_iter()
        .map(|line| Line::from(Span::styled(format!("  {line}"), style)))
        .collect()
}

/// Renders the entries to lines for a panel `width` columns wide.
pub fn entry_lines(entries: &[ChatEntry], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for entry in entries {
        if let Some(label) = entry.label() {
            let color = match entry {
                ChatEntry::Human(_) => Color::Green,
                ChatEntry::Sql(_) => Color::Yellow,
                _ => Color::Blue,
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
        }

        match entry {
            ChatEntry::Human(text) | ChatEntry::Ai(text) => {
                lines.extend(text_lines(text, width, Style::default()));
            }
            ChatEntry::Sql(sql) => {
                lines.extend(text_lines(sql, width, Style::default().fg(Color::Cyan)));
            }
            ChatEntry::Rows(rows) => {
                lines.extend(ResultTable::new(rows).render_to_lines(width));
            }
            ChatEntry::Affected(count) => {
                lines.push(Line::from(Span::styled(
                    format!("✅ Query executed successfully. {count} rows affected."),
                    Style::default().fg(Color::Green),
                )));
            }
            ChatEntry::QueryFailed(explanation) => {
                lines.push(Line::from(Span::styled(
                    "  ❌ Query failed.",
                    Style::default().fg(Color::Red),
                )));
                lines.extend(text_lines(explanation, width, Style::default()));
            }
            ChatEntry::Error(message) => {
                lines.extend(text_lines(message, width, Style::default().fg(Color::Red)));
            }
        }

        lines.push(Line::from(""));
    }

    lines
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Chat ");

        let inner = block.inner(area);
        let width = inner.width as usize;

        let mut visible = Vec::new();
        if let Some(warning) = self.warning {
            visible.extend(text_lines(
                &format!("⚠ {warning}"),
                width,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            visible.push(Line::from(""));
        }

        // Newest lines stay at the bottom; `scroll` moves the window up.
        let lines = entry_lines(self.entries, width);
        let height = (inner.height as usize).saturating_sub(visible.len());
        let max_scroll = lines.len().saturating_sub(height);
        let scroll = (self.scroll as usize).min(max_scroll);
        let start = lines.len().saturating_sub(height + scroll);
        visible.extend(lines.into_iter().skip(start).take(height));

        Paragraph::new(visible).block(block).render(area, buf);
    }
}
