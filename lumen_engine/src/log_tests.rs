//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, and DefaultLogger.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "lumen::Renderer".to_string(),
        message: "frame slot 1 recorded".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Warn), "Warn");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_without_file_line() {
    let e = entry(LogSeverity::Info, None, None);
    assert_eq!(e.source, "lumen::Renderer");
    assert!(e.file.is_none());
    assert!(e.line.is_none());
}

#[test]
fn test_log_entry_with_file_line() {
    let e = entry(LogSeverity::Error, Some("descriptor_manager.rs"), Some(42));
    assert_eq!(e.file, Some("descriptor_manager.rs"));
    assert_eq!(e.line, Some(42));
}

#[test]
fn test_log_entry_clone() {
    let e = entry(LogSeverity::Warn, None, None);
    let c = e.clone();
    assert_eq!(c.severity, e.severity);
    assert_eq!(c.message, e.message);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, None, None));
    }
}

#[test]
fn test_default_logger_error_with_file_line() {
    DefaultLogger.log(&entry(LogSeverity::Error, Some("renderer.rs"), Some(7)));
}

// ============================================================================
// CUSTOM LOGGER TESTS
// ============================================================================

struct CapturingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("{:?} {} {}", entry.severity, entry.source, entry.message));
    }
}

#[test]
fn test_custom_logger_implementation() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let logger = CapturingLogger { lines: lines.clone() };

    logger.log(&entry(LogSeverity::Warn, None, None));

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0], "Warn lumen::Renderer frame slot 1 recorded");
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<Box<dyn Logger>>();
}
