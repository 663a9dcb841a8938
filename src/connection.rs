use crate::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Anything the input loop can hand finished messages to.
pub trait Outbound {
    fn send(&self, msg: &crate::protocol::Message) -> Result<()>;
}

/// The TCP session with the chat server.
///
/// The socket has one writer (the main thread, through `send`) and one
/// reader (the receive thread, through the handle returned by `reader`), so
/// nothing here needs a lock.
#[derive(Debug)]
pub struct Connection {
    stream: std::net::TcpStream,
    closed: AtomicBool,
}

impl Connection {
    pub fn connect(address: &std::net::SocketAddr) -> Result<Self> {
        let stream = std::net::TcpStream::connect(address)
            .context(crate::error::Connect { address: *address })?;
        log::info!("connected to {}", address);
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: std::net::TcpStream) -> Self {
        Self {
            stream,
            closed: AtomicBool::new(false),
        }
    }

    pub fn reader(
        &self,
    ) -> Result<crate::protocol::FramedReader<std::net::TcpStream>> {
        let stream =
            self.stream.try_clone().context(crate::error::SocketOption)?;
        Ok(crate::protocol::FramedReader::new(stream))
    }

    /// Applies to every handle on the socket, including ones returned by
    /// `reader`. `None` blocks forever.
    pub fn set_read_timeout(
        &self,
        timeout: Option<std::time::Duration>,
    ) -> Result<()> {
        self.stream
            .set_read_timeout(timeout)
            .context(crate::error::SocketOption)
    }

    /// Shuts the socket down in both directions, which wakes up a pending
    /// read on the receive thread. Only the first call does anything.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.stream.shutdown(std::net::Shutdown::Both) {
            // the server may have already hung up on us
            if e.kind() != std::io::ErrorKind::NotConnected {
                log::warn!("failed to shut down socket: {}", e);
            }
        }
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Outbound for Connection {
    fn send(&self, msg: &crate::protocol::Message) -> Result<()> {
        msg.log("send");
        crate::protocol::FramedWriter::new(&self.stream).write(msg)
    }
}
