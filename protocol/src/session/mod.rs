//! # Session Records
//!
//! The three long-lived records a client session operates on: the
//! [`Subscriber`] (our cryptographic identity and its initialization
//! state), the [`Partner`] (the business relationship, owner of the
//! order-number sequence), and the [`Bank`] (the counterparty's public
//! keys).
//!
//! None of these carry any locking. One in-flight operation per record at
//! a time is the caller's responsibility — the order-number counter and
//! the initialization booleans are mutated in place, and two concurrent
//! transfers over the same Partner would replay an order number, which is
//! a protocol violation the bank will not forgive. Records for *different*
//! subscribers are fully independent.
//!
//! Persistence is external: callers serialize these records before/after
//! a transfer through the explicit helpers, never mid-flight.

mod bank;
mod partner;
mod subscriber;

pub use bank::Bank;
pub use partner::Partner;
pub use subscriber::Subscriber;

use serde::{Deserialize, Serialize};

use crate::config;

/// The EBICS protocol revisions this engine speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EbicsVersion {
    /// EBICS 2.4.
    H003,
    /// EBICS 2.5.
    H004,
    /// EBICS 3.0. Mandates X.509 certificates and BTF order descriptors.
    H005,
}

impl EbicsVersion {
    /// The schema identifier used in envelopes.
    pub fn schema_id(&self) -> &'static str {
        match self {
            EbicsVersion::H003 => config::VERSION_H003,
            EbicsVersion::H004 => config::VERSION_H004,
            EbicsVersion::H005 => config::VERSION_H005,
        }
    }

    /// Whether this revision mandates certificate-based key exchange.
    /// Not a preference: under H005 raw modulus/exponent exchange is
    /// simply not part of the schema.
    pub fn requires_certificates(&self) -> bool {
        matches!(self, EbicsVersion::H005)
    }

    /// Whether business orders are named by BTF descriptors rather than
    /// legacy order codes.
    pub fn uses_btf(&self) -> bool {
        matches!(self, EbicsVersion::H005)
    }
}
