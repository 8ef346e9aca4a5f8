//! The subscriber: our three key pairs and the two initialization flags.

use crate::crypto::KeyPair;
use crate::error::{EbicsError, Result};

/// The acting user's cryptographic identity for one bank relationship.
///
/// Holds the signature (A005), encryption (E002) and authentication
/// (X002) key pairs plus the two booleans recording whether the INI and
/// HIA handshakes have completed. The booleans are flipped exclusively by
/// the trust-bootstrap operations after a bank-accepted round trip;
/// nothing else in this crate writes them.
///
/// A `Subscriber` is owned by its session. Persisting it is the caller's
/// job, via [`KeyPair::to_pkcs8_der`] and [`Subscriber::restore`].
#[derive(Debug)]
pub struct Subscriber {
    user_id: String,
    signature_key: Option<KeyPair>,
    encryption_key: Option<KeyPair>,
    authentication_key: Option<KeyPair>,
    signature_initialized: bool,
    encryption_initialized: bool,
}

impl Subscriber {
    /// A fresh subscriber with no keys and nothing initialized.
    pub fn new(user_id: &str) -> Self {
        Subscriber {
            user_id: user_id.to_string(),
            signature_key: None,
            encryption_key: None,
            authentication_key: None,
            signature_initialized: false,
            encryption_initialized: false,
        }
    }

    /// Rebuild a subscriber from persisted parts. The flags are taken at
    /// face value; the bank is the ultimate authority on whether they
    /// still hold.
    pub fn restore(
        user_id: &str,
        signature_key: Option<KeyPair>,
        encryption_key: Option<KeyPair>,
        authentication_key: Option<KeyPair>,
        signature_initialized: bool,
        encryption_initialized: bool,
    ) -> Self {
        Subscriber {
            user_id: user_id.to_string(),
            signature_key,
            encryption_key,
            authentication_key,
            signature_initialized,
            encryption_initialized,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn set_signature_key(&mut self, key: KeyPair) {
        self.signature_key = Some(key);
    }

    pub fn set_encryption_key(&mut self, key: KeyPair) {
        self.encryption_key = Some(key);
    }

    pub fn set_authentication_key(&mut self, key: KeyPair) {
        self.authentication_key = Some(key);
    }

    /// The signature key pair, or a sequence error if none exists yet —
    /// signing without a key is a programming error, not a bank problem.
    pub fn signature_key(&self) -> Result<&KeyPair> {
        self.signature_key
            .as_ref()
            .ok_or_else(|| EbicsError::Sequence("subscriber has no signature key".into()))
    }

    pub fn encryption_key(&self) -> Result<&KeyPair> {
        self.encryption_key
            .as_ref()
            .ok_or_else(|| EbicsError::Sequence("subscriber has no encryption key".into()))
    }

    pub fn authentication_key(&self) -> Result<&KeyPair> {
        self.authentication_key
            .as_ref()
            .ok_or_else(|| EbicsError::Sequence("subscriber has no authentication key".into()))
    }

    /// Whether the INI handshake has completed.
    pub fn is_signature_initialized(&self) -> bool {
        self.signature_initialized
    }

    /// Whether the HIA handshake has completed.
    pub fn is_encryption_initialized(&self) -> bool {
        self.encryption_initialized
    }

    /// Fully initialized: both INI and HIA accepted by the bank.
    pub fn is_initialized(&self) -> bool {
        self.signature_initialized && self.encryption_initialized
    }

    pub(crate) fn mark_signature_initialized(&mut self) {
        self.signature_initialized = true;
    }

    pub(crate) fn mark_encryption_initialized(&mut self) {
        self.encryption_initialized = true;
    }
}
