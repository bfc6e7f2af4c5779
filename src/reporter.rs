//! Leveled text output for commands.

/// A sink for user-facing text.
///
/// Calls are handled synchronously and in order.
pub trait Reporter: Send + Sync {
    /// Reports detail that is only shown in verbose mode.
    fn verbose(&self, text: &str);

    /// Reports regular progress.
    fn output(&self, text: &str);

    /// Reports a warning.
    fn warn(&self, text: &str);

    /// Reports an error.
    fn error(&self, text: &str);
}

/// A reporter that writes to the console.
///
/// Regular and verbose output go to stdout; warnings and errors go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    /// Creates a new console reporter.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn verbose(&self, text: &str) {
        if self.verbose {
            println!("{text}");
        }
    }

    fn output(&self, text: &str) {
        println!("{text}");
    }

    fn warn(&self, text: &str) {
        eprintln!("warning: {text}");
    }

    fn error(&self, text: &str) {
        eprintln!("error: {text}");
    }
}
