//! Tracing and logging setup shared by cmdindex binaries.

/// Initialize process-wide logging with JSON output.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::Json, tracing::DEFAULT_FILTER);
}

/// Subscriber configuration (filters, formats).
pub mod tracing;

pub use self::tracing::LogFormat;
