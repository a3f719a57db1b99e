//! Terminal User Interface for SQLFlow.
//!
//! Provides the main TUI loop using ratatui and crossterm. Session work runs
//! inline in the key handler, so the screen redraws once a turn finishes.

pub mod app;
mod events;
mod ui;
pub mod widgets;

pub use app::App;
pub use events::{Event, EventHandler};

use crate::error::{Result, SqlFlowError};
use crate::session::SessionContext;
use app::Action;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{debug, info, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
    session: SessionContext,
    restored: bool,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new(session: SessionContext) -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
            session,
            restored: false,
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| SqlFlowError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(|e| {
            SqlFlowError::internal(format!("Failed to enter alternate screen: {e}"))
        })?;

        Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| SqlFlowError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        disable_raw_mode()
            .map_err(|e| SqlFlowError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .map_err(|e| SqlFlowError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| SqlFlowError::internal(format!("Failed to show cursor: {e}")))
    }

    /// Runs the event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        // Restore the terminal if anything panics
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        let mut app_state = App::new(&self.session);
        let result = self.run_event_loop(&mut app_state).await;

        let _ = panic::take_hook();
        self.restore_terminal()?;
        info!("Exiting");
        result
    }

    async fn run_event_loop(&mut self, app_state: &mut App) -> Result<()> {
        while app_state.running {
            self.terminal
                .draw(|frame| ui::render(frame, app_state))
                .map_err(|e| SqlFlowError::internal(format!("Failed to draw: {e}")))?;

            match self.event_handler.next()? {
                Event::Key(key) => {
                    if let Some(action) = app_state.handle_key(key) {
                        self.perform(action, app_state).await;
                    }
                }
                Event::Resize(width, height) => {
                    debug!("Terminal resized to {width}x{height}");
                }
                Event::Tick => {}
            }
        }
        Ok(())
    }

    /// Runs an action against the session and records the outcome.
    async fn perform(&mut self, action: Action, app_state: &mut App) {
        match action {
            Action::Connect(config) => {
                let result = self.session.submit_configuration(config).await;
                app_state.apply_connect(result);
            }
            Action::Ask(question) => {
                let result = self.session.ask(&question).await;
                if let Err(e) = &result {
                    warn!("Turn failed: {e}");
                }
                app_state.apply_turn(&question, result);
            }
        }
        app_state.refresh(&self.session);
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.restore_terminal() {
            warn!("Failed to restore terminal: {e}");
        }
    }
}
