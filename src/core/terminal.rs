//! Terminal UI coordination for exeq.
//!
//! The runner only needs two things from the UI layer: bring the screen
//! back up, and hand the terminal over to a child. The [Ui] trait captures
//! exactly that; the embedding application implements it on its own UI
//! object, or uses [TermUi] for a plain crossterm raw-mode screen.
//!
//! Suspend and resume are paired around every foreground spawn, and their
//! failures are recoverable: the runner logs them and carries on.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use std::io;

/// The terminal-UI surface the runner coordinates with.
pub trait Ui {
    /// (Re)initialize the screen after a child gave the terminal back.
    fn initialize(&mut self) -> io::Result<()>;

    /// Release the terminal so a foreground child can own it.
    fn suspend(&mut self) -> io::Result<()>;
}

/// Raw-mode alternate-screen terminal handling.
///
/// Matches the setup and teardown around an external editor: suspend drops
/// raw mode, leaves the alternate screen and shows the cursor; initialize
/// reverses that.
#[derive(Debug, Default)]
pub struct TermUi;

impl TermUi {
    pub fn new() -> Self {
        TermUi
    }
}

impl Ui for TermUi {
    fn initialize(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        enable_raw_mode()?;
        Ok(())
    }

    fn suspend(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, LeaveAlternateScreen, Show)?;
        Ok(())
    }
}
