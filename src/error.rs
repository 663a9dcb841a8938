#[derive(Debug, snafu::Snafu)]
#[snafu(visibility = "pub")]
pub enum Error {
    #[snafu(display("failed to connect to {}: {}", address, source))]
    Connect {
        address: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[snafu(display("couldn't find username"))]
    CouldntFindUsername,

    #[snafu(display("failed to parse configuration: {}", source))]
    CouldntParseConfig { source: config::ConfigError },

    #[snafu(display("configuration file {} doesn't exist", name))]
    ConfigFileDoesntExist { name: String },

    #[snafu(display("connection closed"))]
    EOF,

    #[snafu(display("{} field contains a nul byte", field))]
    FieldContainsNul { field: &'static str },

    #[snafu(display(
        "{} field is too long ({} bytes, max {})",
        field,
        len,
        max
    ))]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[snafu(display("failed to find any resolved addresses"))]
    HasResolvedAddr,

    #[snafu(display("timed out waiting for a record"))]
    Idle,

    #[snafu(display("invalid message type: {}", ty))]
    InvalidMessageType { ty: u32 },

    #[snafu(display("couldn't find name in argv"))]
    MissingArgv,

    #[snafu(display(
        "detected argv path was not a valid filename: {}",
        path
    ))]
    NotAFileName { path: String },

    #[snafu(display("{}", source))]
    ParseArgs { source: clap::Error },

    #[snafu(display("failed to parse config file: {}", source))]
    ParseConfigFile { source: config::ConfigError },

    #[snafu(display("failed to parse port '{}': {}", string, source))]
    ParsePort {
        string: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("failed to parse read timeout '{}': {}", input, source))]
    ParseReadTimeout {
        input: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("failed to parse scrollback size '{}': {}", input, source))]
    ParseScrollback {
        input: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("failed to read terminal input: {}", source))]
    ReadTerminal { source: std::io::Error },

    #[snafu(display("failed to read record: {}", source))]
    ReadRecord { source: std::io::Error },

    #[snafu(display("record has the wrong size ({} bytes, expected {})", len, expected))]
    RecordSize { len: usize, expected: usize },

    #[snafu(display("failed to register handler for signal {}: {}", signal, source))]
    RegisterSignal {
        signal: i32,
        source: std::io::Error,
    },

    #[snafu(display("failed to resolve address {}:{}: {}", host, port, source))]
    ResolveAddress {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    #[snafu(display("failed to configure socket: {}", source))]
    SocketOption { source: std::io::Error },

    #[snafu(display("failed to spawn receive thread: {}", source))]
    SpawnReceiveThread { source: std::io::Error },

    #[snafu(display("failed to change terminal mode: {}", source))]
    TerminalMode { source: std::io::Error },

    #[snafu(display(
        "connection closed in the middle of a record ({} of {} bytes)",
        len,
        expected
    ))]
    Truncated { len: usize, expected: usize },

    #[snafu(display("failed to write to terminal: {}", source))]
    WriteTerminal { source: std::io::Error },

    #[snafu(display("failed to write record: {}", source))]
    WriteRecord { source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
