use crate::prelude::*;
use std::convert::TryFrom as _;

pub const USERNAME_LEN: usize = 32;
pub const BODY_LEN: usize = 1024;
pub const RECORD_LEN: usize = HEADER_LEN + USERNAME_LEN + BODY_LEN;

const HEADER_LEN: usize = 2 * std::mem::size_of::<u32>();
const USERNAME_OFFSET: usize = HEADER_LEN;
const BODY_OFFSET: usize = USERNAME_OFFSET + USERNAME_LEN;

/// Longest username that fits in its slot alongside the nul terminator.
pub const MAX_USERNAME_BYTES: usize = USERNAME_LEN - 1;
/// Longest body that fits in its slot alongside the nul terminator.
pub const MAX_BODY_BYTES: usize = BODY_LEN - 1;

#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum MessageType {
    Login = 0,
    Logout = 1,
    MessageSend = 2,
    MessageReceive = 10,
    Disconnect = 12,
    System = 13,
}

impl std::convert::TryFrom<u32> for MessageType {
    type Error = Error;

    fn try_from(n: u32) -> Result<Self> {
        Ok(match n {
            0 => Self::Login,
            1 => Self::Logout,
            2 => Self::MessageSend,
            10 => Self::MessageReceive,
            12 => Self::Disconnect,
            13 => Self::System,
            _ => return Err(Error::InvalidMessageType { ty: n }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub ty: MessageType,
    pub timestamp: u32,
    pub username: String,
    pub body: String,
}

impl Message {
    fn new(ty: MessageType, timestamp: u32, username: &str, body: &str) -> Self {
        Self {
            ty,
            timestamp,
            username: username.to_string(),
            body: body.to_string(),
        }
    }

    pub fn login(username: &str) -> Self {
        Self::new(MessageType::Login, 0, username, "")
    }

    pub fn logout(username: &str) -> Self {
        Self::new(MessageType::Logout, 0, username, "")
    }

    pub fn message_send(body: &str) -> Self {
        Self::new(MessageType::MessageSend, 0, "", body)
    }

    pub fn message_receive(username: &str, body: &str, timestamp: u32) -> Self {
        Self::new(MessageType::MessageReceive, timestamp, username, body)
    }

    pub fn system(body: &str) -> Self {
        Self::new(MessageType::System, 0, "", body)
    }

    pub fn disconnect(body: &str) -> Self {
        Self::new(MessageType::Disconnect, 0, "", body)
    }

    pub fn encode(&self) -> Result<[u8; RECORD_LEN]> {
        let mut record = [0_u8; RECORD_LEN];
        record[..4].copy_from_slice(&(self.ty as u32).to_be_bytes());
        record[4..HEADER_LEN].copy_from_slice(&self.timestamp.to_be_bytes());
        write_field(
            "username",
            &self.username,
            &mut record[USERNAME_OFFSET..BODY_OFFSET],
        )?;
        write_field("body", &self.body, &mut record[BODY_OFFSET..])?;
        Ok(record)
    }

    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() != RECORD_LEN {
            return Err(Error::RecordSize {
                len: record.len(),
                expected: RECORD_LEN,
            });
        }

        let ty = MessageType::try_from(read_u32(&record[..4]))?;
        let timestamp = read_u32(&record[4..HEADER_LEN]);
        let username = read_field(&record[USERNAME_OFFSET..BODY_OFFSET]);
        let body = read_field(&record[BODY_OFFSET..]);

        Ok(Self {
            ty,
            timestamp,
            username,
            body,
        })
    }

    // message bodies are whatever people typed, so keep them out of the logs
    pub fn log(&self, id: &str) {
        log::debug!(
            "{}: message({:?} {{ timestamp: {}, username: {:?}, body: ({} bytes) }})",
            id,
            self.ty,
            self.timestamp,
            self.username,
            self.body.len()
        );
    }
}

fn read_u32(buf: &[u8]) -> u32 {
    let mut bytes = [0_u8; 4];
    bytes.copy_from_slice(buf);
    u32::from_be_bytes(bytes)
}

fn write_field(field: &'static str, val: &str, slot: &mut [u8]) -> Result<()> {
    let bytes = val.as_bytes();
    let max = slot.len() - 1;
    if bytes.len() > max {
        return Err(Error::FieldTooLong {
            field,
            len: bytes.len(),
            max,
        });
    }
    if bytes.contains(&0) {
        return Err(Error::FieldContainsNul { field });
    }
    slot[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn read_field(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or_else(|| slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

/// Reads whole records off of a stream, one at a time.
///
/// Partial reads are buffered internally and never handed to the decoder.
/// If the underlying stream has a read timeout, `read` returns
/// `Error::Idle` when it fires and picks up where it left off on the next
/// call.
pub struct FramedReader<R: std::io::Read> {
    inner: R,
    buf: Box<[u8; RECORD_LEN]>,
    filled: usize,
}

impl<R: std::io::Read> FramedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Box::new([0_u8; RECORD_LEN]),
            filled: 0,
        }
    }

    pub fn read(&mut self) -> Result<Message> {
        while self.filled < RECORD_LEN {
            match self.inner.read(&mut self.buf[self.filled..]) {
                Ok(0) => {
                    let len = self.filled;
                    self.filled = 0;
                    if len == 0 {
                        return Err(Error::EOF);
                    }
                    return Err(Error::Truncated {
                        len,
                        expected: RECORD_LEN,
                    });
                }
                Ok(n) => self.filled += n,
                Err(e) => match e.kind() {
                    std::io::ErrorKind::Interrupted => {}
                    std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut => {
                        return Err(Error::Idle)
                    }
                    _ => {
                        self.filled = 0;
                        return Err(e).context(crate::error::ReadRecord);
                    }
                },
            }
        }

        self.filled = 0;
        Message::decode(&self.buf[..])
    }

    /// True if part of a record has been read but not the rest of it.
    #[cfg(test)]
    pub fn in_record(&self) -> bool {
        self.filled > 0
    }
}

pub struct FramedWriter<W: std::io::Write>(W);

impl<W: std::io::Write> FramedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self(inner)
    }

    pub fn write(&mut self, msg: &Message) -> Result<()> {
        let record = msg.encode()?;
        // write_all keeps going after short writes
        self.0
            .write_all(&record)
            .context(crate::error::WriteRecord)?;
        self.0.flush().context(crate::error::WriteRecord)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryFrom as _;
    use std::io::Read as _;

    #[test]
    fn test_serialize_deserialize() {
        for msg in valid_messages() {
            let record = msg.encode().unwrap();
            assert_eq!(record.len(), 1064);
            let msg2 = Message::decode(&record).unwrap();
            assert_eq!(msg, msg2);
        }
    }

    #[test]
    fn test_wire_layout() {
        let msg = Message::message_receive("bob", "hi", 0x0102_0304);
        let record = msg.encode().unwrap();
        assert_eq!(&record[..4], &[0, 0, 0, 10]);
        assert_eq!(&record[4..8], &[1, 2, 3, 4]);
        assert_eq!(&record[8..12], b"bob\0");
        assert!(record[12..40].iter().all(|&b| b == 0));
        assert_eq!(&record[40..43], b"hi\0");
    }

    #[test]
    fn test_read_write() {
        let mut buf = vec![];
        let mut w = FramedWriter::new(&mut buf);
        for msg in valid_messages() {
            w.write(&msg).unwrap();
        }
        drop(w);
        assert_eq!(buf.len(), valid_messages().len() * RECORD_LEN);

        let mut r = FramedReader::new(buf.as_slice());
        for msg in valid_messages() {
            assert_eq!(r.read().unwrap(), msg);
        }
        assert!(matches!(r.read(), Err(Error::EOF)));
    }

    #[test]
    fn test_short_reads() {
        // hands out at most 7 bytes per read call
        struct Trickle(std::io::Cursor<Vec<u8>>);
        impl std::io::Read for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let len = buf.len().min(7);
                self.0.read(&mut buf[..len])
            }
        }

        let msg = Message::system("welcome");
        let record = msg.encode().unwrap().to_vec();
        let mut r = FramedReader::new(Trickle(std::io::Cursor::new(record)));
        assert_eq!(r.read().unwrap(), msg);
        assert!(matches!(r.read(), Err(Error::EOF)));
    }

    #[test]
    fn test_truncated_record() {
        let record = Message::system("welcome").encode().unwrap();
        let mut r = FramedReader::new(&record[..100]);
        match r.read() {
            Err(Error::Truncated { len, expected }) => {
                assert_eq!(len, 100);
                assert_eq!(expected, RECORD_LEN);
            }
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn test_wrong_size() {
        assert!(matches!(
            Message::decode(&[0_u8; RECORD_LEN - 1]),
            Err(Error::RecordSize { .. })
        ));
        assert!(matches!(
            Message::decode(&[0_u8; RECORD_LEN + 1]),
            Err(Error::RecordSize { .. })
        ));
    }

    #[test]
    fn test_unknown_type_consumes_record() {
        let mut record = Message::system("first").encode().unwrap().to_vec();
        record[..4].copy_from_slice(&99_u32.to_be_bytes());
        record.extend_from_slice(&Message::system("second").encode().unwrap());

        let mut r = FramedReader::new(record.as_slice());
        assert!(matches!(
            r.read(),
            Err(Error::InvalidMessageType { ty: 99 })
        ));
        assert_eq!(r.read().unwrap(), Message::system("second"));
    }

    #[test]
    fn test_unterminated_fields() {
        let mut record = [b'x'; RECORD_LEN];
        record[..4].copy_from_slice(&13_u32.to_be_bytes());
        let msg = Message::decode(&record).unwrap();
        assert_eq!(msg.username.len(), USERNAME_LEN);
        assert_eq!(msg.body.len(), BODY_LEN);
    }

    #[test]
    fn test_field_limits() {
        let name = "a".repeat(MAX_USERNAME_BYTES);
        assert!(Message::login(&name).encode().is_ok());

        let name = "a".repeat(MAX_USERNAME_BYTES + 1);
        assert!(matches!(
            Message::login(&name).encode(),
            Err(Error::FieldTooLong { field: "username", len: 32, max: 31 })
        ));

        let body = "b".repeat(MAX_BODY_BYTES);
        assert!(Message::message_send(&body).encode().is_ok());

        let body = "b".repeat(MAX_BODY_BYTES + 1);
        assert!(matches!(
            Message::message_send(&body).encode(),
            Err(Error::FieldTooLong { field: "body", .. })
        ));

        assert!(matches!(
            Message::message_send("a\0b").encode(),
            Err(Error::FieldContainsNul { field: "body" })
        ));
    }

    #[test]
    fn test_message_values() {
        let mut set = std::collections::HashSet::new();
        for i in 0..=255 {
            if let Ok(ty) = MessageType::try_from(i) {
                assert_eq!(ty as u32, i);
                assert!(set.insert(ty));
            }
        }
        assert_eq!(set.len(), 6);
    }

    fn valid_messages() -> Vec<Message> {
        vec![
            Message::login("doy"),
            Message::logout("doy"),
            Message::message_send("hello"),
            Message::message_send(""),
            Message::message_send("ünïcödé ✓"),
            Message::message_receive("bob", "hi @alice!", 1_700_000_000),
            Message::system("welcome"),
            Message::disconnect("server shutting down"),
        ]
    }
}
