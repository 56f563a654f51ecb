//! Interactive terminal board
//!
//! Live view of every running activity with colour-coded timers, plus
//! shortcuts to start and stop activities.

pub mod app;
pub mod board_view;
pub mod events;
pub mod form;
pub mod messages;
pub mod summary_chart;
pub mod ui;
pub mod utils;

pub use app::App;
pub use events::EventHandler;

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

use crate::workflow::Workflow;

/// Run the interactive board until the user quits
pub async fn run_interactive(workflow: Workflow, tick: Duration) -> Result<()> {
    // Load before touching the terminal so startup errors print normally
    let mut app = App::new(workflow).await?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, tick).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "interactive board failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Main application loop
async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick: Duration,
) -> Result<()> {
    let event_handler = EventHandler::new(tick);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Some(event) = event_handler.next()? {
            if !app.handle_event(event).await? {
                break;
            }
        }
        app.tick(Utc::now()).await;
    }

    Ok(())
}

// Made with Bob
