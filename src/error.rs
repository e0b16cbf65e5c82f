//! Error types for sensor reads and the display.

use std::io;

/// A single sensor read that could not produce a value. These never leave
/// the collector; each one is replaced by its sentinel.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to parse value from {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("socket error: {0}")]
    Socket(#[from] io::Error),

    #[error("no routable local address")]
    Unroutable,
}

/// Errors raised while opening or drawing to the display.
///
/// Driver errors from the embedded stack only implement `Debug`, so they are
/// carried as their debug text.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to open bus {path}: {detail}")]
    Bus { path: String, detail: String },

    #[error("display init failed: {0}")]
    Init(String),

    #[error("draw failed: {0}")]
    Draw(String),

    #[error("flush failed: {0}")]
    Flush(String),

    #[error("console write failed: {0}")]
    Console(#[from] io::Error),

    #[error("failed to load font {path}: {detail}")]
    Font { path: String, detail: String },
}
