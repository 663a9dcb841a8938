use crate::protocol::{Message, MessageType};

pub const HIGHLIGHT: &str = "\x1b[31m";
pub const DIM: &str = "\x1b[90m";
pub const RESET: &str = "\x1b[0m";
pub const BELL: char = '\x07';

/// Formatted lines longer than this get cut off.
pub const MAX_LINE_LEN: usize = 1200;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Turns received messages into display lines.
#[derive(Debug, Clone)]
pub struct Formatter {
    username: String,
    quiet: bool,
}

impl Formatter {
    pub fn new(username: &str, quiet: bool) -> Self {
        Self {
            username: username.to_string(),
            quiet,
        }
    }

    /// Returns `None` for message types that don't get displayed.
    pub fn format(&self, msg: &Message) -> Option<String> {
        let line = match msg.ty {
            MessageType::MessageReceive => {
                let (body, mentioned) = self.highlight_mentions(&msg.body);
                let bell = if mentioned {
                    BELL.to_string()
                } else {
                    String::new()
                };
                format!(
                    "{}[{}] {}: {}",
                    bell,
                    format_timestamp(msg.timestamp),
                    msg.username,
                    body
                )
            }
            MessageType::System => {
                format!("{}[SYSTEM] {}{}", DIM, msg.body, RESET)
            }
            MessageType::Disconnect => {
                format!("{}[DISCONNECT] {}{}", HIGHLIGHT, msg.body, RESET)
            }
            MessageType::Login
            | MessageType::Logout
            | MessageType::MessageSend => return None,
        };
        Some(truncate(line, MAX_LINE_LEN))
    }

    /// Wraps every `@<username>` in `body` in the highlight marker. The match
    /// is a plain prefix match, so `@alice` also matches inside `@alicexyz`.
    pub fn highlight_mentions(&self, body: &str) -> (String, bool) {
        if self.quiet || self.username.is_empty() {
            return (body.to_string(), false);
        }

        let mention = format!("@{}", self.username);
        let mut formatted = String::with_capacity(body.len());
        let mut mentioned = false;
        let mut rest = body;
        while let Some(i) = rest.find(&mention) {
            formatted.push_str(&rest[..i]);
            formatted.push_str(HIGHLIGHT);
            formatted.push_str(&mention);
            formatted.push_str(RESET);
            mentioned = true;
            rest = &rest[i + mention.len()..];
        }
        formatted.push_str(rest);

        (formatted, mentioned)
    }
}

pub fn format_timestamp(timestamp: u32) -> String {
    format_timestamp_in(timestamp, &chrono::Local)
}

pub fn format_timestamp_in<Tz: chrono::TimeZone>(
    timestamp: u32,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_opt(i64::from(timestamp), 0)
        .earliest()
        .map_or_else(
            || timestamp.to_string(),
            |time| time.format(TIMESTAMP_FORMAT).to_string(),
        )
}

/// Cuts `s` down to at most `len` bytes. A cut line always ends with
/// `RESET`, so a colour that was switched on before the cut doesn't leak
/// into whatever gets printed next.
fn truncate(mut s: String, len: usize) -> String {
    if s.len() <= len {
        return s;
    }

    let mut end = len.saturating_sub(RESET.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    // don't leave half an escape sequence behind
    if let Some(esc) = s.rfind('\x1b') {
        if !s[esc..].contains('m') {
            s.truncate(esc);
        }
    }
    s.push_str(RESET);
    s
}
