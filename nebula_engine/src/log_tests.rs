//! Unit tests for log.rs
//!
//! Tests LogEntry construction, severity tags and DefaultLogger filtering
//! and formatting.

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use serial_test::serial;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
    assert!(LogSeverity::Error < LogSeverity::Critical);
}

#[test]
fn test_log_severity_tags_have_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
        LogSeverity::Critical,
    ] {
        assert_eq!(severity.tag().len(), 5);
    }
    assert_eq!(LogSeverity::Critical.tag(), "CRIT ");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_new_has_no_context_or_location() {
    let entry = LogEntry::new(LogSeverity::Info, "nebula::Context", "Created context 'main'".to_string());

    assert_eq!(entry.severity, LogSeverity::Info);
    assert_eq!(entry.source, "nebula::Context");
    assert!(entry.context.is_none());
    assert!(entry.location().is_none());
}

#[test]
fn test_log_entry_builders() {
    let entry = LogEntry::new(LogSeverity::Critical, "nebula::Pass", "Uniform unresolved: 'u_color'".to_string())
        .with_context(Some("main".to_string()))
        .with_location("executor.rs", 120);

    assert_eq!(entry.context.as_deref(), Some("main"));
    assert_eq!(entry.location().as_deref(), Some("executor.rs:120"));
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_threshold() {
    let logger = DefaultLogger::new(LogSeverity::Warn);
    assert!(!logger.accepts(LogSeverity::Info));
    assert!(logger.accepts(LogSeverity::Warn));
    assert!(logger.accepts(LogSeverity::Critical));

    assert_eq!(DefaultLogger::default().min_severity, LogSeverity::Debug);
}

#[test]
#[serial]
fn test_default_logger_format() {
    colored::control::set_override(false);

    let logger = DefaultLogger::default();
    let plain = logger.format(&LogEntry::new(LogSeverity::Warn, "nebula::FrameBuffer", "ignored".to_string()));
    assert!(plain.contains("] [WARN ] [nebula::FrameBuffer] ignored"));
    assert!(!plain.contains('('));

    let detailed = logger.format(
        &LogEntry::new(LogSeverity::Error, "nebula::Program", "link failed".to_string())
            .with_context(Some("main".to_string()))
            .with_location("program.rs", 42),
    );
    assert!(detailed.ends_with("[nebula::Program] (main) link failed (program.rs:42)"));

    colored::control::unset_override();
}

#[test]
fn test_default_logger_handles_every_severity() {
    let logger = DefaultLogger::new(LogSeverity::Trace);
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
        LogSeverity::Critical,
    ] {
        logger.log(&LogEntry::new(severity, "nebula::Test", "message".to_string()).with_location("log_tests.rs", 1));
    }
}
