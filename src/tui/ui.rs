//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{chat, form, header, input};
use crate::session::Readiness;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, content
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    // Content layout: form sidebar (30%) and conversation (70%)
    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_layout[1]);

    // Conversation: chat above the input bar
    let conversation = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(content_layout[1]);

    render_header(frame, main_layout[0], app);
    render_form(frame, content_layout[0], app);
    render_chat(frame, conversation[0], app);
    render_input(frame, conversation[1], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = header::Header::new(&app.connection_info, &app.model_info, app.is_connected);
    frame.render_widget(widget, area);
}

fn render_form(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Form;
    frame.render_widget(form::FormPanel::new(&app.form, focused), area);

    if focused {
        // Border (1) + value indent (2); the value sits below the label.
        let cursor_x = area.x + 1 + 2 + app.form.cursor() as u16;
        let cursor_y = area.y
            + 1
            + form::FIELDS_TOP
            + app.form.selected as u16 * form::FIELD_HEIGHT
            + 1;
        if cursor_x < area.right() && cursor_y < area.bottom() {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Chat;
    let widget = chat::ChatPanel::new(
        &app.entries,
        app.readiness.prompt(),
        app.chat_scroll,
        focused,
    );
    frame.render_widget(widget, area);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let enabled = app.readiness == Readiness::Ready;
    let widget = input::InputBar::new(&app.input.text, app.input.cursor, focused, enabled);
    frame.render_widget(widget, area);

    if focused {
        // Account for border (1) and prompt "> " (2)
        let available = area.width.saturating_sub(5) as usize;
        let visible_cursor =
            app.input.cursor - input::calculate_scroll_offset(app.input.cursor, available);
        let cursor_x = area.x + 1 + 2 + visible_cursor as u16;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}
