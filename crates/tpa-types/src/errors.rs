//! Error taxonomy.
//!
//! Every non-`Config` variant is local to a single datagram or control
//! message — the SA remains in its prior state and the tracker never
//! retries I/O or initiates a teardown on its own.

use crate::transform::TransformId;
use thiserror::Error;

/// Errors returned by `tpa-core`'s domain and service layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Received a parameter naming a transform we don't implement.
    /// Drop the message; do not tear down the SA.
    #[error("unsupported transform: {transform:?}")]
    Unsupported { transform: TransformId },

    /// Transform shift mid-session, or an anchor mismatch on UPDATE.
    /// Drop the message; keep the SA on the prior anchor.
    #[error("mismatch: expected {expected}, got {got}")]
    Mismatch { expected: String, got: String },

    /// Truncated or structurally invalid parameter.
    #[error("malformed parameter: {0}")]
    Malformed(String),

    /// ESP sequence number behind the window and not present in the
    /// cumulative ring. Drop silently.
    #[error("replay: seq {seq} behind window")]
    Replay { seq: u32 },

    /// Chain walk exhausted the window, or a Merkle branch did not
    /// recompute the root.
    #[error("verification failed")]
    VerifyFailed,

    /// An ACK arrived for an UPDATE we never saw or already activated.
    /// Soft error — the caller may choose to tolerate it.
    #[error("cache miss for update sequence {seq}")]
    CacheMiss { seq: u32 },

    /// Mutual/location UPDATE flows, reserved for the future.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Sanity-check failure at initialization. Fatal for the process.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the error kinds that are local to a single datagram or
    /// message (i.e. everything except `Config`, which is fatal for the
    /// process).
    pub fn is_local(&self) -> bool {
        !matches!(self, Error::Config(_))
    }
}
