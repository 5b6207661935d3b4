/// Lumen Engine - process-wide logging facade
///
/// Holds the one piece of global state the engine keeps: the active logger.
/// Everything GPU-related is owned by explicitly constructed objects
/// (`GraphicsDevice`, `Renderer`) passed by reference.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Set between `initialize()` and `shutdown()`
static INITIALIZED: AtomicBool = AtomicBool::new(false);

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

// ===== PUBLIC API =====

/// Engine facade
///
/// # Example
///
/// ```no_run
/// use lumen_engine::lumen::Engine;
///
/// Engine::initialize();
/// // ... create the device and the renderer, run the frame loop ...
/// Engine::shutdown();
/// ```
pub struct Engine;

impl Engine {
    /// Initialize the engine
    ///
    /// Idempotent. Installs the default logger if none was set.
    pub fn initialize() {
        let _ = logger();
        if !INITIALIZED.swap(true, Ordering::SeqCst) {
            crate::engine_debug!("lumen::Engine", "Engine initialized");
        }
    }

    /// Shutdown the engine
    ///
    /// The logger stays usable afterwards so late teardown messages are not lost.
    pub fn shutdown() {
        if INITIALIZED.swap(false, Ordering::SeqCst) {
            crate::engine_debug!("lumen::Engine", "Engine shut down");
        }
    }

    /// Whether `initialize()` was called without a matching `shutdown()`
    pub fn is_initialized() -> bool {
        INITIALIZED.load(Ordering::SeqCst)
    }

    /// Reset global state for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        INITIALIZED.store(false, Ordering::SeqCst);
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, capture logger, etc.)
    ///
    /// # Arguments
    ///
    /// * `logger` - Any type implementing the Logger trait
    pub fn set_logger<L: Logger + 'static>(new_logger: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(new_logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level
    /// * `source` - Source module (e.g., "lumen::Renderer")
    /// * `message` - Log message
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error!, engine_err! and engine_bail!.
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level (typically Error)
    /// * `source` - Source module (e.g., "lumen::Renderer")
    /// * `message` - Log message
    /// * `file` - Source file path
    /// * `line` - Source line number
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
