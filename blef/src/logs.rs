//! Pipeline log broadcasting.
//!
//! Every entry is echoed to stderr (unless quiet) and fanned out over a
//! broadcast channel. [`LogCapture`] subscribes to that channel so a run's
//! warnings can be written to a report file after the fact.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Entries buffered per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(self) -> &'static str {
        match self {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️  ",
            LogLevel::Error => "❌ ",
        }
    }
}

/// One line of pipeline output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth under the previous step
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = "   ".repeat(self.indent as usize + 1);
        write!(f, "{}{}{}", pad, self.level.marker(), self.message)
    }
}

/// Global log channel used by the `log_*` helpers.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    quiet: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            quiet: AtomicBool::new(false),
        }
    }

    pub fn log(&self, entry: LogEntry) {
        if !self.quiet.load(Ordering::Relaxed) {
            eprintln!("{}", entry);
        }
        // send only fails when nobody is subscribed
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    /// Start collecting entries logged from now on.
    pub fn capture(&self) -> LogCapture {
        LogCapture {
            receiver: self.subscribe(),
        }
    }

    /// Stop (or resume) the stderr echo. Subscribers are unaffected.
    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::Relaxed);
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries collected by a [`LogCapture`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapturedLogs {
    pub entries: Vec<LogEntry>,
    /// Entries lost because the subscriber fell behind the channel.
    pub missed: u64,
}

impl CapturedLogs {
    /// Entries at warning level or above.
    pub fn problems(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.level >= LogLevel::Warning)
    }
}

/// Subscriber that buffers a run's entries until drained.
pub struct LogCapture {
    receiver: broadcast::Receiver<LogEntry>,
}

impl LogCapture {
    /// Collect everything received so far without blocking.
    pub fn drain(mut self) -> CapturedLogs {
        let mut logs = CapturedLogs::default();
        loop {
            match self.receiver.try_recv() {
                Ok(entry) => logs.entries.push(entry),
                Err(TryRecvError::Lagged(n)) => logs.missed += n,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        logs
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}

pub fn set_quiet(quiet: bool) {
    LOG_BROADCASTER.set_quiet(quiet);
}
