//! Routing of restore log events to a [`Reporter`].

use crate::reporter::Reporter;
use nuget_client::{LogEvent, LogLevel, RestoreLogger};

/// The reporter call a log event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// [`Reporter::verbose`]
    Verbose,
    /// [`Reporter::output`]
    Output,
    /// [`Reporter::warn`]
    Warn,
    /// [`Reporter::error`]
    Error,
}

/// Chooses the reporter channel for a log level.
pub fn classify(level: LogLevel) -> Channel {
    match level {
        LogLevel::Error => Channel::Error,
        LogLevel::Warning => Channel::Warn,
        level if level > LogLevel::Information => Channel::Output,
        _ => Channel::Verbose,
    }
}

/// A restore logger that forwards every event to a reporter.
///
/// Events are not filtered; the reporter decides what is displayed.
pub struct LogBridge<'a> {
    reporter: &'a dyn Reporter,
}

impl<'a> LogBridge<'a> {
    /// Creates a new bridge to the given reporter.
    pub fn new(reporter: &'a dyn Reporter) -> Self {
        Self { reporter }
    }
}

impl RestoreLogger for LogBridge<'_> {
    fn log(&self, event: LogEvent) {
        let text = event.format_with_code();
        match classify(event.level) {
            Channel::Verbose => self.reporter.verbose(&text),
            Channel::Output => self.reporter.output(&text),
            Channel::Warn => self.reporter.warn(&text),
            Channel::Error => self.reporter.error(&text),
        }
    }
}
