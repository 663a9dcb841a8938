use crate::prelude::*;

/// Rows at the bottom of the screen that aren't used for scrollback: the
/// input line and a spacer above it.
const RESERVED_ROWS: usize = 2;

/// The raw terminal operations the display needs.
pub trait Screen: Send {
    fn rows(&self) -> usize;
    /// Clear the screen and draw `lines` followed by the input prompt.
    fn repaint(&mut self, lines: &[&str], input: &str) -> Result<()>;
    /// Print a single line below whatever was printed before.
    fn print(&mut self, line: &str) -> Result<()>;
    /// Redraw the input prompt in place on the line below the output.
    fn prompt(&mut self, input: &str) -> Result<()>;
    fn bell(&mut self) -> Result<()>;
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Lines are printed as they arrive. Once entered, the input line is
    /// echoed below them.
    Line,
    /// The whole screen is redrawn from the scrollback.
    FullScreen,
}

struct View {
    scrollback: crate::scrollback::Scrollback,
    screen: Box<dyn Screen>,
    input: String,
    scroll_offset: usize,
    unprinted: usize,
    bell: bool,
    entered: bool,
}

/// The scrollback and the screen it is drawn on, behind a single lock so
/// that appends and redraws never interleave.
pub struct Display {
    mode: Mode,
    view: std::sync::Mutex<View>,
}

impl Display {
    pub fn new(screen: Box<dyn Screen>, mode: Mode, capacity: usize) -> Self {
        Self {
            mode,
            view: std::sync::Mutex::new(View {
                scrollback: crate::scrollback::Scrollback::new(capacity),
                screen,
                input: String::new(),
                scroll_offset: 0,
                unprinted: 0,
                bell: false,
                entered: false,
            }),
        }
    }

    /// A leading bell is taken off the line and rung once on the next draw
    /// instead of on every repaint.
    pub fn push(&self, line: String) {
        let mut view = self.lock();
        let line = match line.strip_prefix(crate::format::BELL) {
            Some(rest) => {
                view.bell = true;
                rest.to_string()
            }
            None => line,
        };
        view.scrollback.append(line);
        view.unprinted = (view.unprinted + 1).min(view.scrollback.len());
    }

    pub fn redraw(&self) -> Result<()> {
        let mut view = self.lock();
        self.draw(&mut view)
    }

    /// Record the current input line and scroll position, and show them if
    /// the terminal has been taken over.
    pub fn update_input(&self, input: &str, scroll_offset: usize) -> Result<()> {
        let mut view = self.lock();
        view.input.clear();
        view.input.push_str(input);
        view.scroll_offset = scroll_offset;
        match self.mode {
            Mode::FullScreen => self.draw(&mut view)?,
            Mode::Line if view.entered => {
                let View { screen, input, .. } = &mut *view;
                screen.prompt(input)?;
            }
            Mode::Line => {}
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.lock()
            .scrollback
            .lines()
            .map(std::string::ToString::to_string)
            .collect()
    }

    pub fn enter(&self) -> Result<()> {
        let mut view = self.lock();
        if !view.entered {
            view.screen.enter()?;
            view.entered = true;
            self.draw(&mut view)?;
        }
        Ok(())
    }

    pub fn leave(&self) -> Result<()> {
        let mut view = self.lock();
        if view.entered {
            view.entered = false;
            view.screen.leave()?;
        }
        Ok(())
    }

    fn draw(&self, view: &mut View) -> Result<()> {
        if view.bell {
            view.bell = false;
            view.screen.bell()?;
        }
        match self.mode {
            Mode::FullScreen => {
                let View {
                    scrollback,
                    screen,
                    input,
                    scroll_offset,
                    unprinted,
                    ..
                } = view;
                let rows = screen.rows().saturating_sub(RESERVED_ROWS);
                let offset = (*scroll_offset).min(scrollback.len());
                let lines = scrollback.snapshot(rows, offset);
                screen.repaint(&lines, input)?;
                *unprinted = 0;
            }
            Mode::Line => {
                let View {
                    scrollback,
                    screen,
                    input,
                    unprinted,
                    entered,
                    ..
                } = view;
                let start = scrollback.len() - *unprinted;
                for line in scrollback.lines().skip(start) {
                    screen.print(line)?;
                }
                *unprinted = 0;
                if *entered {
                    screen.prompt(input)?;
                }
            }
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, View> {
        // a panic while drawing leaves nothing half-updated that matters
        self.view
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
