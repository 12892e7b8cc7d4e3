//! Board TUI entry point and terminal setup.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::auth::AuthProvider;
use crate::error::Result;
use crate::repo::Repository;
use crate::store::TaskStore;
use crate::tui::board::BoardApp;

/// Take over the terminal and run the board until the user quits.
///
/// Fails early when nobody is signed in, before the screen is switched.
pub fn run_board<S: TaskStore, A: AuthProvider>(repo: Repository<S, A>) -> Result<()> {
    let caller = repo.caller()?;
    info!(caller = %caller, "opening board");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = BoardApp::new(repo);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result?;
    info!(caller = %caller, "board closed");
    Ok(())
}
