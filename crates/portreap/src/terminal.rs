use std::io;

use crossterm::cursor;
use crossterm::execute;
use crossterm::terminal;

/// RAII guard for the interactive terminal state.
///
/// Entering switches to raw mode and the alternate screen and hides the
/// cursor; dropping restores everything best-effort, so a panic or an early
/// return still leaves the user's shell usable.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(err) = execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
