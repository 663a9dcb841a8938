use crate::prelude::*;
use serde::de::Deserialize as _;
use std::net::ToSocketAddrs as _;

pub const CONFIG_FILENAME: &str = "config.toml";

const DOMAIN_OPTION: &str = "domain";
const PORT_OPTION: &str = "port";
const QUIET_OPTION: &str = "quiet";
const READ_TIMEOUT_OPTION: &str = "read-timeout-ms";
const SCROLLBACK_OPTION: &str = "scrollback";
const TUI_OPTION: &str = "tui";
const USERNAME_OPTION: &str = "username";

const DEFAULT_DOMAIN: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_READ_TIMEOUT: std::time::Duration =
    std::time::Duration::from_millis(250);

pub fn config(filename: Option<&std::path::Path>) -> Result<Config> {
    let config_filename = if let Some(filename) = filename {
        if !filename.exists() {
            return Err(Error::ConfigFileDoesntExist {
                name: filename.to_string_lossy().to_string(),
            });
        }
        Some(filename.to_path_buf())
    } else {
        crate::dirs::Dirs::new().config_file(CONFIG_FILENAME)
    };

    config_filename.map_or_else(
        || Ok(Config::default()),
        |config_filename| config_from_filename(&config_filename),
    )
}

fn config_from_filename(filename: &std::path::Path) -> Result<Config> {
    log::debug!("loading config from {}", filename.display());
    let mut config = config::Config::default();
    config
        .merge(config::File::from(filename))
        .context(crate::error::ParseConfigFile)?;
    config.try_into().context(crate::error::CouldntParseConfig)
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: Option<String>,

    #[serde(default)]
    pub quiet: bool,

    #[serde(default)]
    pub tui: bool,

    #[serde(default = "default_scrollback")]
    pub scrollback: usize,

    #[serde(
        rename = "read_timeout_ms",
        deserialize_with = "read_timeout",
        default = "default_read_timeout"
    )]
    pub read_timeout: Option<std::time::Duration>,
}

impl Config {
    pub fn cmd<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b> {
        let tui_help = "Take over the whole terminal and redraw it as messages arrive";
        let quiet_help = "Don't highlight or beep when someone mentions you";
        let port_help = "Port the chat server listens on (defaults to 8080)";
        let domain_help =
            "Host name or address of the chat server (defaults to 127.0.0.1)";
        let username_help = "Name to log in with (defaults to $USER)";
        let scrollback_help =
            "Number of lines to keep for scrolling back (defaults to 500)";
        let read_timeout_help = "How often the receive thread checks whether it should stop, in milliseconds, 0 to never check (defaults to 250)";

        app.arg(
            clap::Arg::with_name(TUI_OPTION)
                .long(TUI_OPTION)
                .help(tui_help),
        )
        .arg(
            clap::Arg::with_name(QUIET_OPTION)
                .long(QUIET_OPTION)
                .help(quiet_help),
        )
        .arg(
            clap::Arg::with_name(PORT_OPTION)
                .long(PORT_OPTION)
                .takes_value(true)
                .value_name("PORT")
                .help(port_help),
        )
        .arg(
            clap::Arg::with_name(DOMAIN_OPTION)
                .long(DOMAIN_OPTION)
                .takes_value(true)
                .value_name("HOST")
                .help(domain_help),
        )
        .arg(
            clap::Arg::with_name(USERNAME_OPTION)
                .long(USERNAME_OPTION)
                .takes_value(true)
                .value_name("USERNAME")
                .help(username_help),
        )
        .arg(
            clap::Arg::with_name(SCROLLBACK_OPTION)
                .long(SCROLLBACK_OPTION)
                .takes_value(true)
                .value_name("LINES")
                .help(scrollback_help),
        )
        .arg(
            clap::Arg::with_name(READ_TIMEOUT_OPTION)
                .long(READ_TIMEOUT_OPTION)
                .takes_value(true)
                .value_name("MILLIS")
                .help(read_timeout_help),
        )
    }

    pub fn merge_args<'a>(
        &mut self,
        matches: &clap::ArgMatches<'a>,
    ) -> Result<()> {
        if matches.is_present(TUI_OPTION) {
            self.tui = true;
        }
        if matches.is_present(QUIET_OPTION) {
            self.quiet = true;
        }
        if let Some(port) = matches.value_of(PORT_OPTION) {
            self.port = port
                .parse()
                .context(crate::error::ParsePort { string: port })?;
        }
        if let Some(domain) = matches.value_of(DOMAIN_OPTION) {
            self.domain = domain.to_string();
        }
        if let Some(username) = matches.value_of(USERNAME_OPTION) {
            self.username = Some(username.to_string());
        }
        if let Some(lines) = matches.value_of(SCROLLBACK_OPTION) {
            self.scrollback = lines
                .parse()
                .context(crate::error::ParseScrollback { input: lines })?;
        }
        if let Some(millis) = matches.value_of(READ_TIMEOUT_OPTION) {
            let millis: u64 = millis
                .parse()
                .context(crate::error::ParseReadTimeout { input: millis })?;
            self.read_timeout = millis_to_timeout(millis);
        }
        Ok(())
    }

    // XXX this does a blocking dns lookup
    pub fn settings(&self) -> Result<crate::client::Settings> {
        let address = (self.domain.as_str(), self.port)
            .to_socket_addrs()
            .context(crate::error::ResolveAddress {
                host: self.domain.as_str(),
                port: self.port,
            })?
            .next()
            .context(crate::error::HasResolvedAddr)?;
        let username = bounded_username(
            self.username
                .as_ref()
                .context(crate::error::CouldntFindUsername)?,
        );
        let mode = if self.tui {
            crate::display::Mode::FullScreen
        } else {
            crate::display::Mode::Line
        };

        Ok(crate::client::Settings {
            address,
            username,
            quiet: self.quiet,
            mode,
            scrollback: self.scrollback.max(1),
            read_timeout: self.read_timeout,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            port: default_port(),
            username: default_username(),
            quiet: false,
            tui: false,
            scrollback: default_scrollback(),
            read_timeout: default_read_timeout(),
        }
    }
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_username() -> Option<String> {
    std::env::var("USER").ok().or_else(|| {
        users::get_current_username().and_then(|name| name.into_string().ok())
    })
}

fn default_scrollback() -> usize {
    crate::scrollback::DEFAULT_CAPACITY
}

fn read_timeout<'a, D>(
    deserializer: D,
) -> std::result::Result<Option<std::time::Duration>, D::Error>
where
    D: serde::de::Deserializer<'a>,
{
    Ok(millis_to_timeout(u64::deserialize(deserializer)?))
}

fn default_read_timeout() -> Option<std::time::Duration> {
    Some(DEFAULT_READ_TIMEOUT)
}

fn millis_to_timeout(millis: u64) -> Option<std::time::Duration> {
    if millis == 0 {
        None
    } else {
        Some(std::time::Duration::from_millis(millis))
    }
}

/// Cuts the name down to what fits in the username field of a record,
/// without splitting a character.
fn bounded_username(username: &str) -> String {
    let max = crate::protocol::MAX_USERNAME_BYTES;
    if username.len() <= max {
        return username.to_string();
    }

    let mut end = max;
    while !username.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &username[..end];
    log::warn!(
        "username '{}' is longer than {} bytes, using '{}'",
        username,
        max,
        truncated
    );
    truncated.to_string()
}
