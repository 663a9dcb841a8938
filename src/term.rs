use crate::prelude::*;
use std::convert::TryFrom as _;
use std::io::Write as _;

const DEFAULT_ROWS: u16 = 24;
const PROMPT: &str = "> ";

pub fn rows() -> Result<u16> {
    let (_, rows) =
        crossterm::terminal::size().context(crate::error::TerminalMode)?;
    Ok(rows)
}

/// Draws on the real terminal through stdout.
///
/// Entering puts the terminal in raw mode for either display mode, so that
/// keys (including ctrl-c and ctrl-d) arrive one at a time instead of being
/// handled by the line discipline. Raw mode also turns off output newline
/// translation, so everything written while entered ends lines with `\r\n`.
pub struct TermScreen {
    stdout: std::io::Stdout,
    mode: crate::display::Mode,
    raw: bool,
}

impl TermScreen {
    pub fn new(mode: crate::display::Mode) -> Self {
        Self {
            stdout: std::io::stdout(),
            mode,
            raw: false,
        }
    }
}

impl crate::display::Screen for TermScreen {
    fn rows(&self) -> usize {
        // not being attached to a terminal isn't worth failing a redraw over
        rows().unwrap_or(DEFAULT_ROWS).into()
    }

    fn repaint(&mut self, lines: &[&str], input: &str) -> Result<()> {
        let rows = self.rows();
        let mut stdout = self.stdout.lock();
        crossterm::queue!(
            stdout,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
            crossterm::cursor::MoveTo(0, 0)
        )
        .context(crate::error::WriteTerminal)?;
        for line in lines {
            write!(stdout, "{}\r\n", line)
                .context(crate::error::WriteTerminal)?;
        }
        let last_row = u16::try_from(rows.saturating_sub(1)).unwrap_or(u16::MAX);
        crossterm::queue!(stdout, crossterm::cursor::MoveTo(0, last_row))
            .context(crate::error::WriteTerminal)?;
        write!(stdout, "{}{}", PROMPT, input)
            .context(crate::error::WriteTerminal)?;
        stdout.flush().context(crate::error::WriteTerminal)
    }

    fn print(&mut self, line: &str) -> Result<()> {
        let mut stdout = self.stdout.lock();
        if self.raw {
            // overwrite the prompt, it gets drawn again below the line
            crossterm::queue!(
                stdout,
                crossterm::cursor::MoveToColumn(0),
                crossterm::terminal::Clear(
                    crossterm::terminal::ClearType::CurrentLine
                )
            )
            .context(crate::error::WriteTerminal)?;
            write!(stdout, "{}\r\n", line)
                .context(crate::error::WriteTerminal)?;
        } else {
            writeln!(stdout, "{}", line)
                .context(crate::error::WriteTerminal)?;
        }
        stdout.flush().context(crate::error::WriteTerminal)
    }

    fn prompt(&mut self, input: &str) -> Result<()> {
        let mut stdout = self.stdout.lock();
        crossterm::queue!(
            stdout,
            crossterm::cursor::MoveToColumn(0),
            crossterm::terminal::Clear(
                crossterm::terminal::ClearType::CurrentLine
            )
        )
        .context(crate::error::WriteTerminal)?;
        write!(stdout, "{}{}", PROMPT, input)
            .context(crate::error::WriteTerminal)?;
        stdout.flush().context(crate::error::WriteTerminal)
    }

    fn bell(&mut self) -> Result<()> {
        let mut stdout = self.stdout.lock();
        write!(stdout, "{}", crate::format::BELL)
            .context(crate::error::WriteTerminal)?;
        stdout.flush().context(crate::error::WriteTerminal)
    }

    fn enter(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()
            .context(crate::error::TerminalMode)?;
        self.raw = true;
        if self.mode == crate::display::Mode::FullScreen {
            crossterm::execute!(self.stdout, crossterm::cursor::Hide)
                .context(crate::error::WriteTerminal)?;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        match self.mode {
            crate::display::Mode::FullScreen => crossterm::execute!(
                self.stdout,
                crossterm::cursor::Show,
                crossterm::terminal::Clear(
                    crossterm::terminal::ClearType::All
                ),
                crossterm::cursor::MoveTo(0, 0)
            ),
            crate::display::Mode::Line => crossterm::execute!(
                self.stdout,
                crossterm::cursor::MoveToColumn(0),
                crossterm::terminal::Clear(
                    crossterm::terminal::ClearType::CurrentLine
                )
            ),
        }
        .context(crate::error::WriteTerminal)?;
        self.raw = false;
        crossterm::terminal::disable_raw_mode()
            .context(crate::error::TerminalMode)
    }
}
