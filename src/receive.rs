use crate::prelude::*;
use crate::protocol::MessageType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Draining,
    Stopped,
}

/// How the receive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveExit {
    /// The server sent a Disconnect message.
    Disconnected,
    /// The connection closed or failed without saying goodbye.
    LinkLost,
    /// The session was shut down from elsewhere.
    Stopped,
}

pub struct ReceiveLoop<R: std::io::Read> {
    reader: crate::protocol::FramedReader<R>,
    formatter: crate::format::Formatter,
    display: std::sync::Arc<crate::display::Display>,
    shutdown: std::sync::Arc<crate::shutdown::Shutdown>,
    state: State,
}

impl<R: std::io::Read> ReceiveLoop<R> {
    pub fn new(
        reader: crate::protocol::FramedReader<R>,
        formatter: crate::format::Formatter,
        display: std::sync::Arc<crate::display::Display>,
        shutdown: std::sync::Arc<crate::shutdown::Shutdown>,
    ) -> Self {
        Self {
            reader,
            formatter,
            display,
            shutdown,
            state: State::Running,
        }
    }

    pub fn run(mut self) -> ReceiveExit {
        let exit = loop {
            if self.state != State::Running {
                break ReceiveExit::Disconnected;
            }

            match self.reader.read() {
                Ok(msg) => {
                    msg.log("recv");
                    self.handle(&msg);
                }
                Err(Error::Idle) => {
                    if !self.shutdown.is_running() {
                        break ReceiveExit::Stopped;
                    }
                }
                Err(Error::InvalidMessageType { ty }) => {
                    log::debug!("recv: ignoring message of unknown type {}", ty);
                }
                Err(e) => {
                    if self.shutdown.is_running() {
                        log::info!("connection lost: {}", e);
                        break ReceiveExit::LinkLost;
                    }
                    log::debug!("receive loop stopping: {}", e);
                    break ReceiveExit::Stopped;
                }
            }
        };
        self.state = State::Stopped;
        log::info!("receive loop exited: {:?}", exit);
        exit
    }

    fn handle(&mut self, msg: &crate::protocol::Message) {
        let line = match self.formatter.format(msg) {
            Some(line) => line,
            None => {
                log::debug!("recv: ignoring {:?} from server", msg.ty);
                return;
            }
        };

        self.display.push(line);
        if let Err(e) = self.display.redraw() {
            log::error!("failed to redraw: {}", e);
        }

        if msg.ty == MessageType::Disconnect {
            self.state = State::Draining;
            self.shutdown.request(crate::shutdown::Reason::Disconnect);
        }
    }
}
