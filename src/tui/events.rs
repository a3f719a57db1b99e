//! Event handling for the TUI.
//!
//! Processes keyboard and terminal events using crossterm.

use crate::error::{Result, SqlFlowError};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// No input arrived within the tick rate.
    Tick,
}

/// Handles terminal events.
pub struct EventHandler {
    /// Timeout for polling events.
    tick_rate: Duration,
}

impl EventHandler {
    /// Creates a new event handler with default tick rate.
    pub fn new() -> Self {
        Self::with_tick_rate(Duration::from_millis(250))
    }

    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Polls for the next event.
    ///
    /// Returns [`Event::Tick`] if no event is available within the tick rate.
    /// Key releases are reported as ticks.
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)
            .map_err(|e| SqlFlowError::internal(format!("Failed to poll events: {e}")))?
        {
            return Ok(Event::Tick);
        }

        let event = event::read()
            .map_err(|e| SqlFlowError::internal(format!("Failed to read event: {e}")))?;

        Ok(match event {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Event::Key(key),
            CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
            _ => Event::Tick,
        })
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
