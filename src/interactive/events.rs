//! Event handling for the interactive board

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::time::Duration;

use crate::error::Result;

/// Polls the keyboard; the poll timeout doubles as the board's tick
pub struct EventHandler {
    timeout: Duration,
}

impl EventHandler {
    pub fn new(tick: Duration) -> Self {
        Self { timeout: tick }
    }

    /// Next key press, or `None` when the tick elapsed without one
    pub fn next(&self) -> Result<Option<KeyEvent>> {
        if event::poll(self.timeout)? {
            if let Event::Key(key_event) = event::read()? {
                // Some terminals report releases as well
                if key_event.kind == KeyEventKind::Press {
                    return Ok(Some(key_event));
                }
            }
        }
        Ok(None)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

// Made with Bob
