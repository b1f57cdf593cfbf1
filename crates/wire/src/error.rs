//! Wire-level error types

use thiserror::Error;

/// Errors raised while decoding a device-change broadcast payload.
///
/// These are data contract violations on the OS side. They are never fatal
/// to the watcher: the dispatcher converts them into degraded events so the
/// pipeline stays live.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Fewer bytes were available than the fixed header requires
    #[error("truncated broadcast header: needed {needed} bytes, got {available}")]
    TruncatedHeader { needed: usize, available: usize },

    /// The declared total size is smaller than the fixed header
    #[error("invalid broadcast size: declared {declared} bytes, header alone is {header}")]
    InvalidSize { declared: u32, header: usize },
}

/// Type alias for wire results
pub type Result<T> = std::result::Result<T, WireError>;
