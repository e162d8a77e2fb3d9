//! Engine logging
//!
//! Every engine message goes through one process-wide `Logger` (see
//! `Engine::set_logger`). Entries carry the label of the context current on
//! the emitting thread, so interleaved output of several contexts can be told
//! apart. Errors and fatal invariant violations also carry file:line.

use std::time::SystemTime;
use chrono::{DateTime, Local};
use colored::*;

/// Destination of engine log entries
///
/// # Example
///
/// ```no_run
/// use nebula_engine::nebula::log::{Logger, LogEntry, LogSeverity};
///
/// struct ErrorsOnly;
///
/// impl Logger for ErrorsOnly {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity >= LogSeverity::Error {
///             eprintln!("{}", entry.message);
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component (e.g. "nebula::Context", "nebula::GlProgram")
    pub source: String,
    pub message: String,
    /// Label of the context current on the emitting thread
    pub context: Option<String>,
    /// Source location, set for errors and fatal violations
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    pub fn new(severity: LogSeverity, source: &str, message: String) -> Self {
        Self {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            context: None,
            file: None,
            line: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_location(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// "file:line" when the entry carries a source location
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Pass state transitions and per-draw bindings
    Trace,
    Debug,
    Info,
    /// Ignored requests and recoverable oddities
    Warn,
    /// Failed operations (returned as `Err`)
    Error,
    /// Invariant violations right before the engine panics
    Critical,
}

impl LogSeverity {
    /// Fixed-width tag used by the default logger
    pub fn tag(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
            LogSeverity::Critical => "CRIT ",
        }
    }
}

/// Colored console logger
///
/// Line format: `[timestamp] [SEVERITY] [source] (context) message (file:line)`.
/// Entries below `min_severity` are dropped. Error and critical lines go to
/// stderr, everything else to stdout.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    pub min_severity: LogSeverity,
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self { min_severity: LogSeverity::Debug }
    }
}

impl DefaultLogger {
    pub fn new(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    /// Render one entry as a console line
    pub fn format(&self, entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let tag = entry.severity.tag();
        let severity = match entry.severity {
            LogSeverity::Trace => tag.bright_black(),
            LogSeverity::Debug => tag.cyan(),
            LogSeverity::Info => tag.green(),
            LogSeverity::Warn => tag.yellow(),
            LogSeverity::Error => tag.red().bold(),
            LogSeverity::Critical => tag.white().on_red().bold(),
        };

        let mut line = format!(
            "[{}] [{}] [{}]",
            datetime.format("%Y-%m-%d %H:%M:%S%.3f"),
            severity,
            entry.source.bright_blue()
        );
        if let Some(context) = &entry.context {
            line.push_str(&format!(" ({})", context.magenta()));
        }
        line.push(' ');
        line.push_str(&entry.message);
        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }
        let line = self.format(entry);
        if entry.severity >= LogSeverity::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, typically disabled)
///
/// # Example
///
/// ```ignore
/// engine_trace!("nebula::Pass", "Idle -> PipelineStateApplied");
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::nebula::Engine::log(
            $crate::nebula::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::nebula::Engine::log(
            $crate::nebula::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::nebula::Engine::log(
            $crate::nebula::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
///
/// # Example
///
/// ```ignore
/// engine_warn!("nebula::FrameBuffer", "Default framebuffer ignores attach()");
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::nebula::Engine::log(
            $crate::nebula::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```ignore
/// engine_error!("nebula::Program", "Link failed: {}", log);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::nebula::Engine::log_detailed(
            $crate::nebula::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
