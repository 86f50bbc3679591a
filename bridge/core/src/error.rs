//! Bridge Errors
//!
//! Error taxonomy for the engine bridge. Fatal errors are never retried
//! internally; the only recovery path is an explicit `connect()` after the
//! hosting process (or its supervisor) decides to try again.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine's socket path never appeared within the probe budget.
    ///
    /// Fatal: the engine either failed to start or failed to bind its
    /// endpoint. Not retried internally.
    #[error("engine endpoint {path:?} not found after {attempts} probes")]
    EndpointNotFound {
        /// The endpoint path that was probed.
        path: PathBuf,
        /// How many probes were made before giving up.
        attempts: u32,
    },

    /// The engine binary could not be launched.
    #[error("failed to spawn engine process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// A stream-level error after the connection was opened
    /// (broken pipe, refused connection, read failure).
    #[error("engine stream error: {0}")]
    Stream(#[source] std::io::Error),

    /// `send()` was called while the bridge is not in the `Connected` state.
    /// No side effects: nothing is written or queued.
    #[error("not connected to the engine")]
    NotConnected,

    /// `connect()` was called while a connection attempt or an established
    /// connection is already in flight.
    #[error("already connected to the engine")]
    AlreadyConnected,

    /// A wire line could not be decoded. The bridge drops the offending line
    /// and keeps the connection alive; this variant only surfaces through
    /// direct codec use.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors produced while decoding a wire line into a [`crate::Command`].
///
/// A well-behaved engine never produces these. The bridge's reader logs and
/// drops malformed lines rather than tearing down the event loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// A `%` was not followed by two hexadecimal digits.
    #[error("invalid percent escape in token {token:?}")]
    InvalidEscape {
        /// The raw (still-encoded) token.
        token: String,
    },

    /// The line or a decoded token was not valid UTF-8.
    #[error("wire line is not valid UTF-8")]
    InvalidUtf8,
}
