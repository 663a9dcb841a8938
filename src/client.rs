use crate::prelude::*;
use crate::connection::Outbound as _;
use std::io::IsTerminal as _;

/// Everything needed to start a session, resolved from the config file and
/// the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub address: std::net::SocketAddr,
    pub username: String,
    pub quiet: bool,
    pub mode: crate::display::Mode,
    pub scrollback: usize,
    pub read_timeout: Option<std::time::Duration>,
}

pub fn run(settings: &Settings) -> Result<()> {
    let mut session = Session::connect(
        settings,
        Box::new(crate::term::TermScreen::new(settings.mode)),
    )?;
    session.register_signals()?;
    session.start_receiving()?;

    let res = if std::io::stdin().is_terminal() {
        session.run_terminal()
    } else {
        session.run_input(crate::key_reader::ByteKeys::new(std::io::stdin()))
    };

    session.finish();
    res
}

/// One logged in connection to the chat server, along with the state the
/// two loops share.
pub struct Session {
    username: String,
    quiet: bool,
    conn: std::sync::Arc<crate::connection::Connection>,
    display: std::sync::Arc<crate::display::Display>,
    shutdown: std::sync::Arc<crate::shutdown::Shutdown>,
    receiver:
        Option<std::thread::JoinHandle<crate::receive::ReceiveExit>>,
}

impl Session {
    /// Connects and logs in. Failing to send the login is fatal.
    pub fn connect(
        settings: &Settings,
        screen: Box<dyn crate::display::Screen>,
    ) -> Result<Self> {
        let conn = crate::connection::Connection::connect(&settings.address)?;
        conn.set_read_timeout(settings.read_timeout)?;
        conn.send(&crate::protocol::Message::login(&settings.username))?;
        log::info!("logged in as {}", settings.username);

        Ok(Self {
            username: settings.username.clone(),
            quiet: settings.quiet,
            conn: std::sync::Arc::new(conn),
            display: std::sync::Arc::new(crate::display::Display::new(
                screen,
                settings.mode,
                settings.scrollback,
            )),
            shutdown: std::sync::Arc::new(crate::shutdown::Shutdown::new()),
            receiver: None,
        })
    }

    pub fn register_signals(&self) -> Result<()> {
        self.shutdown.register_signals()
    }

    pub fn start_receiving(&mut self) -> Result<()> {
        let receive_loop = crate::receive::ReceiveLoop::new(
            self.conn.reader()?,
            crate::format::Formatter::new(&self.username, self.quiet),
            std::sync::Arc::clone(&self.display),
            std::sync::Arc::clone(&self.shutdown),
        );
        let handle = std::thread::Builder::new()
            .name("receive".to_string())
            .spawn(move || receive_loop.run())
            .context(crate::error::SpawnReceiveThread)?;
        self.receiver = Some(handle);
        Ok(())
    }

    /// Takes over the terminal and reads keys from it until the session
    /// stops. The terminal is given back by `finish`.
    pub fn run_terminal(&self) -> Result<()> {
        self.display.enter()?;
        self.run_input(crate::key_reader::TermKeys)
    }

    /// Runs the input loop on the calling thread until the session stops.
    pub fn run_input<K: crate::key_reader::KeySource>(
        &self,
        keys: K,
    ) -> Result<()> {
        crate::input::InputLoop::new(
            keys,
            self.conn.as_ref(),
            self.display.as_ref(),
            self.shutdown.as_ref(),
        )
        .run();
        Ok(())
    }

    /// Tears the session down. Only the first call does anything, and it
    /// returns how the receive loop ended if it was running.
    pub fn finish(&mut self) -> Option<crate::receive::ReceiveExit> {
        if !self.shutdown.begin_teardown() {
            return None;
        }
        self.shutdown.request(crate::shutdown::Reason::EndOfInput);

        if let Err(e) = self.display.leave() {
            log::error!("failed to restore terminal: {}", e);
        }
        if let Err(e) = self
            .conn
            .send(&crate::protocol::Message::logout(&self.username))
        {
            log::warn!("failed to send logout: {}", e);
        }
        self.conn.close();

        let handle = self.receiver.take()?;
        match handle.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                log::error!("receive thread panicked");
                None
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::display::test::{Draw, Recorder};
    use crate::key_reader::{Input, Key, KeySource};
    use crate::protocol::{FramedReader, FramedWriter, Message};
    use crate::receive::ReceiveExit;

    const TIMESTAMP: u32 = 1_700_000_000;

    const DEADLINE: std::time::Duration = std::time::Duration::from_secs(10);

    /// Types out a fixed sequence of keys, then sits idle.
    struct Script {
        inputs: std::collections::VecDeque<Input>,
        deadline: std::time::Instant,
    }

    impl Script {
        fn idle() -> Self {
            Self {
                inputs: std::collections::VecDeque::new(),
                deadline: std::time::Instant::now() + DEADLINE,
            }
        }

        fn keys(mut self, line: &str) -> Self {
            self.inputs
                .extend(line.chars().map(|c| Input::Key(Key::Char(c))));
            self
        }

        fn typing(line: &str) -> Self {
            let mut script = Self::idle().keys(line);
            script.inputs.push_back(Input::Key(Key::Submit));
            script
        }

        fn end(mut self) -> Self {
            self.inputs.push_back(Input::End);
            self
        }
    }

    impl KeySource for Script {
        fn next_input(&mut self) -> Result<Input> {
            if let Some(input) = self.inputs.pop_front() {
                return Ok(input);
            }
            if std::time::Instant::now() > self.deadline {
                return Ok(Input::End);
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
            Ok(Input::Idle)
        }
    }

    fn settings(address: std::net::SocketAddr) -> Settings {
        Settings {
            address,
            username: "alice".to_string(),
            quiet: false,
            mode: crate::display::Mode::Line,
            scrollback: 100,
            read_timeout: Some(std::time::Duration::from_millis(20)),
        }
    }

    #[test]
    fn test_chat_until_disconnect() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = FramedReader::new(&stream);
            let mut writer = FramedWriter::new(&stream);

            let mut received = vec![reader.read().unwrap()];
            writer.write(&Message::system("welcome")).unwrap();
            received.push(reader.read().unwrap());
            writer
                .write(&Message::message_receive("bob", "hello", TIMESTAMP))
                .unwrap();
            writer
                .write(&Message::disconnect("server shutting down"))
                .unwrap();
            received.push(reader.read().unwrap());
            (received, reader.read())
        });

        let recorder = Recorder::new(24);
        let mut session =
            Session::connect(&settings(address), Box::new(recorder.clone()))
                .unwrap();
        session.start_receiving().unwrap();
        session.run_input(Script::typing("hello")).unwrap();
        assert_eq!(session.finish(), Some(ReceiveExit::Disconnected));

        let (received, end) = server.join().unwrap();
        assert_eq!(
            received,
            vec![
                Message::login("alice"),
                Message::message_send("hello"),
                Message::logout("alice"),
            ]
        );
        assert!(matches!(end, Err(Error::EOF)));

        assert_eq!(
            recorder.draws(),
            vec![
                Draw::Print("\x1b[90m[SYSTEM] welcome\x1b[0m".to_string()),
                Draw::Print(format!(
                    "[{}] bob: hello",
                    crate::format::format_timestamp(TIMESTAMP)
                )),
                Draw::Print(
                    "\x1b[31m[DISCONNECT] server shutting down\x1b[0m"
                        .to_string()
                ),
            ]
        );
    }

    /// A server that expects a login and a logout and nothing else.
    fn quiet_server() -> (
        std::net::SocketAddr,
        std::thread::JoinHandle<(Message, Message, Result<Message>)>,
    ) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = FramedReader::new(&stream);
            let login = reader.read().unwrap();
            let logout = reader.read().unwrap();
            (login, logout, reader.read())
        });
        (address, server)
    }

    #[test]
    fn test_signal_stops_session() {
        let (address, server) = quiet_server();
        let mut session = Session::connect(
            &settings(address),
            Box::new(Recorder::new(24)),
        )
        .unwrap();
        session.start_receiving().unwrap();

        let shutdown = std::sync::Arc::clone(&session.shutdown);
        let signal = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            shutdown.deliver_signal();
        });
        let start = std::time::Instant::now();
        session.run_input(Script::idle()).unwrap();
        assert!(start.elapsed() < DEADLINE / 2);
        signal.join().unwrap();

        assert_eq!(session.finish(), Some(ReceiveExit::Stopped));
        drop(session);

        let (login, logout, end) = server.join().unwrap();
        assert_eq!(login, Message::login("alice"));
        assert_eq!(logout, Message::logout("alice"));
        assert!(matches!(end, Err(Error::EOF)));
    }

    #[test]
    fn test_end_of_input_in_line_mode() {
        let (address, server) = quiet_server();
        let recorder = Recorder::new(24);
        let mut session =
            Session::connect(&settings(address), Box::new(recorder.clone()))
                .unwrap();
        session.start_receiving().unwrap();

        session.display.enter().unwrap();
        let start = std::time::Instant::now();
        session.run_input(Script::idle().keys("hi").end()).unwrap();
        assert!(start.elapsed() < DEADLINE / 2);
        assert!(!session.shutdown.is_running());
        assert_eq!(session.finish(), Some(ReceiveExit::Stopped));

        let (login, logout, end) = server.join().unwrap();
        assert_eq!(login, Message::login("alice"));
        assert_eq!(logout, Message::logout("alice"));
        assert!(matches!(end, Err(Error::EOF)));
        assert_eq!(
            recorder.draws(),
            vec![
                Draw::Enter,
                Draw::Prompt(String::new()),
                Draw::Prompt("h".to_string()),
                Draw::Prompt("hi".to_string()),
                Draw::Leave,
            ]
        );
    }

    #[test]
    fn test_finish_once() {
        let (address, server) = quiet_server();

        let mut session = Session::connect(
            &settings(address),
            Box::new(Recorder::new(24)),
        )
        .unwrap();
        session.start_receiving().unwrap();
        assert_eq!(session.finish(), Some(ReceiveExit::Stopped));
        assert_eq!(session.finish(), None);
        drop(session);

        let (login, logout, end) = server.join().unwrap();
        assert_eq!(login, Message::login("alice"));
        assert_eq!(logout, Message::logout("alice"));
        assert!(matches!(end, Err(Error::EOF)));
    }

    #[test]
    fn test_connect_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let res = Session::connect(&settings(address), Box::new(Recorder::new(24)));
        assert!(matches!(res, Err(Error::Connect { .. })));
    }
}
