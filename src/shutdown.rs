use crate::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Signal,
    Disconnect,
    EndOfInput,
    Interrupt,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::Signal => "received signal",
            Self::Disconnect => "server disconnected",
            Self::EndOfInput => "end of input",
            Self::Interrupt => "interrupted",
        };
        f.write_str(s)
    }
}

/// Shared between the input loop, the receive loop and the signal handlers.
///
/// `running` goes from true to false exactly once, whatever asks for it
/// first. Signal handlers only get to set `interrupted`; everything else
/// about shutting down happens on the normal threads once they notice.
#[derive(Debug)]
pub struct Shutdown {
    running: AtomicBool,
    interrupted: std::sync::Arc<AtomicBool>,
    torn_down: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            interrupted: std::sync::Arc::new(AtomicBool::new(false)),
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn register_signals(&self) -> Result<()> {
        for &signal in &[
            signal_hook::consts::SIGINT,
            signal_hook::consts::SIGTERM,
        ] {
            signal_hook::flag::register(
                signal,
                std::sync::Arc::clone(&self.interrupted),
            )
            .context(crate::error::RegisterSignal { signal })?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        if self.interrupted.load(Ordering::SeqCst) {
            self.request(Reason::Signal);
        }
        self.running.load(Ordering::SeqCst)
    }

    /// Returns true if this call is the one that stopped the session.
    pub fn request(&self, reason: Reason) -> bool {
        let first = self.running.swap(false, Ordering::SeqCst);
        if first {
            log::info!("shutting down: {}", reason);
        }
        first
    }

    /// Returns true exactly once, for whoever gets to do the teardown.
    pub fn begin_teardown(&self) -> bool {
        !self.torn_down.swap(true, Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn deliver_signal(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
