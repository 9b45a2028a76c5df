//! Destinations for progress messages

use core::fmt;

/// Which display area a message belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Progress and status lines
    Logs,
    /// Produced artifacts such as the proof
    Results,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Logs => f.write_str("logs"),
            Target::Results => f.write_str("results"),
        }
    }
}

/// Receiver of pipeline progress
pub trait ProgressSink {
    /// Append one line to the given target
    fn show(&mut self, target: Target, message: &str);
}

impl<F: FnMut(Target, &str)> ProgressSink for F {
    fn show(&mut self, target: Target, message: &str) {
        self(target, message)
    }
}

/// Collects messages in memory
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemorySink {
    /// Lines shown on [`Target::Logs`]
    pub logs: Vec<String>,
    /// Lines shown on [`Target::Results`]
    pub results: Vec<String>,
}

impl ProgressSink for MemorySink {
    fn show(&mut self, target: Target, message: &str) {
        match target {
            Target::Logs => self.logs.push(message.to_string()),
            Target::Results => self.results.push(message.to_string()),
        }
    }
}

/// Forwards messages to the `log` facade at info level
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn show(&mut self, target: Target, message: &str) {
        log::info!(target: "zkrun", "[{}] {}", target, message);
    }
}
