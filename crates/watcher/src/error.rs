//! Watcher error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A previous, still-active registration owns the window class name
    #[error("window class {0:?} is already registered")]
    ClassInUse(String),

    /// Creating the message endpoint failed
    #[error("failed to create message endpoint: {0}")]
    CreateEndpoint(String),

    /// The device-notification subscription call failed
    #[error("device notification subscription failed: {0}")]
    Subscribe(String),

    #[error("channel error: {0}")]
    Channel(String),

    /// A message-retrieval wait failed inside the pump; the run loop logs
    /// it and retries after a short sleep
    #[error("message wait failed: {0}")]
    Pump(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the registration family of failures surfaced by
    /// [`crate::Notifier::register_with`]. These are non-retryable by the
    /// core; the caller may retry with backoff.
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Error::ClassInUse(_) | Error::CreateEndpoint(_) | Error::Subscribe(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
