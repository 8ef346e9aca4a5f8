//! Error types for the EBICS engine.
//!
//! Every fallible operation in this crate returns an [`EbicsError`]. The
//! variants deliberately preserve three distinctions that callers must be
//! able to branch on:
//!
//! - fatal crypto/format failures (corrupted or tampered data — never retry),
//! - the "no download data available" condition, which is *not* an error
//!   from the caller's point of view and is never logged as one here,
//! - sequence violations, which are programming errors in the calling code
//!   rather than protocol failures.
//!
//! Nothing in this crate retries anything. A failed transfer must be
//! restarted from initialization by the caller; segment-level resume is
//! not part of the protocol contract this engine implements.

use thiserror::Error;

use crate::crypto::CryptoError;

/// Errors that can occur while driving an EBICS transfer or key-management
/// operation.
#[derive(Debug, Error)]
pub enum EbicsError {
    /// The HTTP transport failed: non-200 status or connection-level error.
    /// Always fatal to the current transfer.
    #[error("transport failure: status {status}: {detail}")]
    Transport {
        /// HTTP status reported by the transport, or 0 for a connection
        /// failure that produced no status at all.
        status: u16,
        /// Transport-supplied detail, e.g. the underlying I/O error text.
        detail: String,
    },

    /// The bank answered with a non-OK technical return code.
    #[error("bank returned {code}: {text}")]
    Protocol {
        /// The technical return code, e.g. `091002`.
        code: String,
        /// The bank's report text accompanying the code.
        text: String,
    },

    /// No download data is available for the requested window (return code
    /// `090005`). Callers commonly treat this as an empty result rather
    /// than a failure; it is surfaced separately so they can.
    #[error("no download data available")]
    NoDataAvailable,

    /// A cryptographic operation failed: signing, key wrapping, or the
    /// symmetric envelope. Signals key mismatch or tampered data; never
    /// retryable.
    #[error("crypto failure: {0}")]
    Crypto(#[from] CryptoError),

    /// Decompression or canonicalization of protocol data failed.
    #[error("format failure: {0}")]
    Format(String),

    /// An operation was invoked in a state that violates protocol
    /// sequencing, e.g. requesting bank keys before an encryption key pair
    /// exists, or advancing a finished transaction. A bug in the calling
    /// code, not a condition to retry.
    #[error("sequence violation: {0}")]
    Sequence(String),

    /// A malformed order descriptor, e.g. a BTF service string that does
    /// not match the positional grammar. Raised at construction time.
    #[error("invalid order descriptor: {0}")]
    Validation(String),
}

impl EbicsError {
    /// `true` for the variants that indicate corrupted or tampered data,
    /// where retrying with the same inputs can never succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EbicsError::Crypto(_) | EbicsError::Format(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EbicsError>;
