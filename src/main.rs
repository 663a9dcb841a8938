mod client;
mod cmd;
mod config;
mod connection;
mod dirs;
mod display;
mod error;
mod format;
mod input;
mod key_reader;
mod prelude;
mod protocol;
mod receive;
mod scrollback;
mod shutdown;
mod term;

fn main() {
    match crate::cmd::parse().and_then(crate::cmd::run) {
        Ok(_) => {}
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
