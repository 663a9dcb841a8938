use crate::key_reader::{Input, Key, KeySource};

/// The line being typed, capped at what fits in a message body.
#[derive(Debug, Default)]
pub struct LineEditor {
    buf: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the character was rejected.
    pub fn push(&mut self, c: char) -> bool {
        if c.is_control()
            || self.buf.len() + c.len_utf8() > crate::protocol::MAX_BODY_BYTES
        {
            return false;
        }
        self.buf.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.buf.pop();
    }

    /// Takes the finished line, leaving the editor empty. Empty lines are
    /// not worth sending.
    pub fn submit(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::replace(&mut self.buf, String::new()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

pub struct InputLoop<'a, K: KeySource, O: crate::connection::Outbound> {
    keys: K,
    outbound: &'a O,
    display: &'a crate::display::Display,
    shutdown: &'a crate::shutdown::Shutdown,
    editor: LineEditor,
    scroll_offset: usize,
}

impl<'a, K: KeySource, O: crate::connection::Outbound> InputLoop<'a, K, O> {
    pub fn new(
        keys: K,
        outbound: &'a O,
        display: &'a crate::display::Display,
        shutdown: &'a crate::shutdown::Shutdown,
    ) -> Self {
        Self {
            keys,
            outbound,
            display,
            shutdown,
            editor: LineEditor::new(),
            scroll_offset: 0,
        }
    }

    pub fn run(mut self) {
        while self.shutdown.is_running() {
            let key = match self.keys.next_input() {
                Ok(Input::Key(key)) => key,
                Ok(Input::Idle) => continue,
                Ok(Input::End) => {
                    self.shutdown.request(crate::shutdown::Reason::EndOfInput);
                    break;
                }
                Err(e) => {
                    log::error!("{}", e);
                    self.shutdown.request(crate::shutdown::Reason::EndOfInput);
                    break;
                }
            };

            if !self.handle(key) {
                break;
            }

            if let Err(e) =
                self.display.update_input(self.editor.as_str(), self.scroll_offset)
            {
                log::error!("failed to redraw: {}", e);
            }
        }
    }

    /// Returns false once the loop should stop.
    fn handle(&mut self, key: Key) -> bool {
        match key {
            Key::Char(c) => {
                self.editor.push(c);
            }
            Key::Backspace => self.editor.backspace(),
            Key::Submit => {
                if let Some(body) = self.editor.submit() {
                    let msg = crate::protocol::Message::message_send(&body);
                    if let Err(e) = self.outbound.send(&msg) {
                        log::warn!("failed to send message: {}", e);
                    }
                }
            }
            Key::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(1)
            }
            Key::ScrollDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1)
            }
            Key::Interrupt => {
                self.shutdown.request(crate::shutdown::Reason::Interrupt);
                return false;
            }
            Key::Other => {}
        }
        true
    }
}
