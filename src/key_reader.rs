use crate::prelude::*;

const POLL_TICK: std::time::Duration = std::time::Duration::from_millis(100);

const BACKSPACE: u8 = 8;
const CTRL_C: u8 = 3;
const DELETE: u8 = 127;
const ESCAPE: u8 = 0x1b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Submit,
    ScrollUp,
    ScrollDown,
    Interrupt,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    /// Nothing arrived within the poll tick.
    Idle,
    End,
}

pub trait KeySource {
    fn next_input(&mut self) -> Result<Input>;
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn next_input(&mut self) -> Result<Input> {
        (**self).next_input()
    }
}

/// Keys from the controlling terminal, read through crossterm. Works both in
/// raw mode and with the terminal left in line mode.
pub struct TermKeys;

impl KeySource for TermKeys {
    fn next_input(&mut self) -> Result<Input> {
        if !crossterm::event::poll(POLL_TICK)
            .context(crate::error::ReadTerminal)?
        {
            return Ok(Input::Idle);
        }

        let event =
            crossterm::event::read().context(crate::error::ReadTerminal)?;
        Ok(match event {
            crossterm::event::Event::Key(key) => {
                if key.kind == crossterm::event::KeyEventKind::Release {
                    return Ok(Input::Idle);
                }
                translate_key(key)
            }
            _ => Input::Key(Key::Other),
        })
    }
}

fn translate_key(key: crossterm::event::KeyEvent) -> Input {
    use crossterm::event::{KeyCode, KeyModifiers};

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    Input::Key(match key.code {
        KeyCode::Char('c') if ctrl => Key::Interrupt,
        KeyCode::Char('d') if ctrl => return Input::End,
        KeyCode::Char(_) if ctrl => Key::Other,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Submit,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Up => Key::ScrollUp,
        KeyCode::Down => Key::ScrollDown,
        _ => Key::Other,
    })
}

/// Keys decoded from a plain byte stream, for when stdin isn't a terminal.
/// Arrow keys come through as `ESC [ A` and `ESC [ B`.
pub struct ByteKeys<R: std::io::Read> {
    input: std::io::Bytes<R>,
}

impl<R: std::io::Read> ByteKeys<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: input.bytes(),
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        loop {
            match self.input.next() {
                Some(Ok(b)) => return Ok(Some(b)),
                Some(Err(e))
                    if e.kind() == std::io::ErrorKind::Interrupted => {}
                Some(Err(e)) => {
                    return Err(e).context(crate::error::ReadTerminal)
                }
                None => return Ok(None),
            }
        }
    }

    fn next_char(&mut self, first: u8) -> Result<Option<Key>> {
        let len = match first {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Ok(Some(Key::Other)),
        };
        let mut buf = vec![first];
        for _ in 1..len {
            match self.next_byte()? {
                Some(b) => buf.push(b),
                None => return Ok(None),
            }
        }
        Ok(Some(
            std::str::from_utf8(&buf)
                .ok()
                .and_then(|s| s.chars().next())
                .map_or(Key::Other, Key::Char),
        ))
    }
}

impl<R: std::io::Read> KeySource for ByteKeys<R> {
    fn next_input(&mut self) -> Result<Input> {
        let b = match self.next_byte()? {
            Some(b) => b,
            None => return Ok(Input::End),
        };

        let key = match b {
            b'\n' | b'\r' => Key::Submit,
            DELETE | BACKSPACE => Key::Backspace,
            CTRL_C => Key::Interrupt,
            ESCAPE => {
                let mut seq = [0_u8; 2];
                for byte in &mut seq {
                    match self.next_byte()? {
                        Some(b) => *byte = b,
                        None => return Ok(Input::End),
                    }
                }
                match seq[1] {
                    b'A' => Key::ScrollUp,
                    b'B' => Key::ScrollDown,
                    _ => Key::Other,
                }
            }
            0x20..=0x7e => Key::Char(char::from(b)),
            0x80..=0xff => match self.next_char(b)? {
                Some(key) => key,
                None => return Ok(Input::End),
            },
            _ => Key::Other,
        };
        Ok(Input::Key(key))
    }
}
