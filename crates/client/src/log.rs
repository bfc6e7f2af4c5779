//! Leveled log events emitted while restoring packages.

use std::fmt;

/// The severity of a [`LogEvent`].
///
/// Levels are totally ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Detailed progress.
    Verbose,
    /// Routine progress.
    Information,
    /// Progress that should be shown even in quiet output.
    Minimal,
    /// A problem that does not stop the restore.
    Warning,
    /// A problem that fails the restore.
    Error,
}

/// A diagnostic code attached to a [`LogEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCode {
    /// No version of the package exists on any source.
    NU1101,
    /// No version of the package satisfies the requested range.
    NU1102,
    /// A source could not be queried.
    NU1301,
    /// A resolved version lies outside a dependency's range.
    NU1608,
}

impl fmt::Display for LogCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A message emitted by a restore engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// The severity of the event.
    pub level: LogLevel,
    /// The diagnostic code, if any.
    pub code: Option<LogCode>,
    /// The message text.
    pub message: String,
}

impl LogEvent {
    /// Creates a new event without a diagnostic code.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            code: None,
            message: message.into(),
        }
    }

    /// Attaches a diagnostic code to the event.
    pub fn with_code(mut self, code: LogCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Formats the message, prefixed by its diagnostic code if present.
    pub fn format_with_code(&self) -> String {
        match self.code {
            Some(code) => format!("{code}: {message}", message = self.message),
            None => self.message.clone(),
        }
    }
}

/// A sink for restore log events.
///
/// Events are delivered synchronously in the order they are produced.
pub trait RestoreLogger: Send + Sync {
    /// Handles a single log event.
    fn log(&self, event: LogEvent);
}

/// Convenience methods for emitting events through a logger trait object.
pub(crate) trait RestoreLoggerExt {
    fn verbose(&self, message: String);
    fn information(&self, message: String);
    fn minimal(&self, message: String);
    fn warning(&self, code: LogCode, message: String);
    fn error(&self, code: LogCode, message: String);
}

impl RestoreLoggerExt for dyn RestoreLogger + '_ {
    fn verbose(&self, message: String) {
        self.log(LogEvent::new(LogLevel::Verbose, message));
    }

    fn information(&self, message: String) {
        self.log(LogEvent::new(LogLevel::Information, message));
    }

    fn minimal(&self, message: String) {
        self.log(LogEvent::new(LogLevel::Minimal, message));
    }

    fn warning(&self, code: LogCode, message: String) {
        self.log(LogEvent::new(LogLevel::Warning, message).with_code(code));
    }

    fn error(&self, code: LogCode, message: String) {
        self.log(LogEvent::new(LogLevel::Error, message).with_code(code));
    }
}
