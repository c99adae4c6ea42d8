//! Error types for the IRC session and the ICY metadata reader.
//!
//! Parse-level problems never show up here: a chat line that does not match
//! the grammar is simply "no message", and a zero metadata length byte is
//! simply "no metadata". What remains are the conditions that end a session
//! or a stream.

use thiserror::Error;

/// Convenience type alias for Results using [`SessionError`].
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Errors that end an IRC session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// I/O error while reading from or writing to the server.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the maximum accepted length.
    #[error("line too long: {actual} bytes (limit {limit})")]
    LineTooLong {
        /// Length of the offending line in bytes.
        actual: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// The session is no longer accepting commands.
    #[error("session closed")]
    Closed,
}

/// Errors raised while opening or reading an ICY stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IcyError {
    /// I/O error on the stream body.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request could not be built or sent.
    #[error("http error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server answered with a non-success status.
    #[error("unexpected http status {0}")]
    Status(u16),

    /// The response carried no `Icy-Metaint` header.
    #[error("response has no Icy-Metaint header")]
    MissingMetaint,

    /// The `Icy-Metaint` header was not a positive integer.
    #[error("invalid Icy-Metaint header: {0:?}")]
    InvalidMetaint(String),

    /// The stream ended inside a metadata block.
    #[error("metadata block truncated: expected {expected} bytes, got {got}")]
    Truncated {
        /// Declared block length (`16 * L`).
        expected: usize,
        /// Bytes actually available.
        got: usize,
    },

    /// The stream ended (or failed) where a metadata length byte was due.
    #[error("metadata length byte unavailable: {0}")]
    MissingLengthByte(#[source] std::io::Error),
}

/// The auto-settings actor is no longer running.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("auto-settings actor stopped")]
pub struct ActorStopped;

/// Errors that end the metadata bridge.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
    /// The metadata stream failed.
    #[error("metadata stream: {0}")]
    Metadata(#[from] IcyError),

    /// The settings actor went away.
    #[error(transparent)]
    Settings(#[from] ActorStopped),
}

impl IcyError {
    /// Whether this error comes from setting up the stream rather than from
    /// a framing violation on a stream that was already flowing.
    ///
    /// Setup errors abort one attempt only; the caller may simply retry.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            IcyError::Http(_)
                | IcyError::Status(_)
                | IcyError::MissingMetaint
                | IcyError::InvalidMetaint(_)
        )
    }
}
