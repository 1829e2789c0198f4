//! Error taxonomy shared across every stage in a pipeline.
//!
//! `PipeError` is a closed sum of failure kinds so that a single `match`
//! (or a single `?`) at the terminal sink can handle anything raised by an
//! upstream stage, regardless of how deep the pipe chain is. `Interrupted`
//! is deliberately kept outside this enum: it is a cooperative cancellation
//! signal, not a pipeline failure (see [`Interrupted`]).

use std::fmt;

/// The closed set of failure kinds a pipe stage may raise.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("io error: {message}")]
    Io {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("timeout: {message}")]
    Timeout { message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("out of order: {message}")]
    OutOfOrder { message: String },

    #[error("queue error: {message}")]
    Queue { message: String },

    #[error("excessive resources: {message}")]
    ExcessiveResources { message: String },

    /// Wraps a non-domain runtime failure so it can be carried to, and
    /// re-raised on, another thread in roughly its original form.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PipeError {
    pub fn io(message: impl Into<String>) -> Self {
        PipeError::Io { message: message.into(), cause: None }
    }

    pub fn io_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PipeError::Io { message: message.into(), cause: Some(Box::new(cause)) }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        PipeError::Http { status, message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        PipeError::Timeout { message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PipeError::Validation { message: message.into() }
    }

    pub fn out_of_order(message: impl Into<String>) -> Self {
        PipeError::OutOfOrder { message: message.into() }
    }

    pub fn queue(message: impl Into<String>) -> Self {
        PipeError::Queue { message: message.into() }
    }

    pub fn excessive_resources(message: impl Into<String>) -> Self {
        PipeError::ExcessiveResources { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PipeError::Internal { message: message.into(), cause: None }
    }

    pub fn internal_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PipeError::Internal { message: message.into(), cause: Some(Box::new(cause)) }
    }
}

impl From<std::io::Error> for PipeError {
    fn from(e: std::io::Error) -> Self {
        PipeError::io_with_cause(e.to_string(), e)
    }
}

impl Clone for PipeError {
    /// Errors are cloned by message, not by source chain — the underlying
    /// `Box<dyn Error>` cause is not `Clone`. Stages that need to re-deliver
    /// the same error to several listeners (§4.C) clone it this way.
    fn clone(&self) -> Self {
        match self {
            PipeError::Io { message, .. } => PipeError::Io { message: message.clone(), cause: None },
            PipeError::Http { status, message } => PipeError::Http { status: *status, message: message.clone() },
            PipeError::Timeout { message } => PipeError::Timeout { message: message.clone() },
            PipeError::Validation { message } => PipeError::Validation { message: message.clone() },
            PipeError::OutOfOrder { message } => PipeError::OutOfOrder { message: message.clone() },
            PipeError::Queue { message } => PipeError::Queue { message: message.clone() },
            PipeError::ExcessiveResources { message } => {
                PipeError::ExcessiveResources { message: message.clone() }
            }
            PipeError::Internal { message, .. } => {
                PipeError::Internal { message: message.clone(), cause: None }
            }
        }
    }
}

/// Cooperative cancellation signal. Not a pipe error: a stage that observes
/// interruption re-asserts it and exits promptly without further
/// notifications, rather than surfacing it as a `PipeError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interrupted")
    }
}

impl std::error::Error for Interrupted {}

/// Result of a sync pipe operation that may also observe cancellation.
pub type SyncResult<T> = Result<T, PipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_carries_status() {
        let e = PipeError::http(503, "backend unavailable");
        assert_eq!(e.to_string(), "http error (503): backend unavailable");
    }

    #[test]
    fn io_from_std_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: PipeError = io.into();
        assert!(matches!(e, PipeError::Io { .. }));
    }

    #[test]
    fn clone_preserves_message_drops_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e = PipeError::io_with_cause("wrapped", io);
        let cloned = e.clone();
        assert_eq!(e.to_string(), cloned.to_string());
    }
}
