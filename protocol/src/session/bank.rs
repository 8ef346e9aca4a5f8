//! The bank record: the counterparty's public keys and key-exchange mode.

use crate::crypto::BankPublicKey;
use crate::error::{EbicsError, Result};

/// What the client knows about one bank host.
///
/// The public keys are set exactly once per session, by the key-retrieval
/// (HPB) handshake; everything else treats them as immutable. Whether keys
/// are exchanged as raw moduli or as X.509 certificates is bank policy —
/// except under H005, where certificates are mandated by the schema and
/// the flag must be `true` before HPB is even attempted.
#[derive(Debug)]
pub struct Bank {
    host_id: String,
    url: String,
    use_certificates: bool,
    encryption_key: Option<BankPublicKey>,
    authentication_key: Option<BankPublicKey>,
}

impl Bank {
    pub fn new(host_id: &str, url: &str, use_certificates: bool) -> Self {
        Bank {
            host_id: host_id.to_string(),
            url: url.to_string(),
            use_certificates,
            encryption_key: None,
            authentication_key: None,
        }
    }

    /// Rebuild a bank record from persisted parts, keys included.
    pub fn restore(
        host_id: &str,
        url: &str,
        use_certificates: bool,
        encryption_key: Option<BankPublicKey>,
        authentication_key: Option<BankPublicKey>,
    ) -> Self {
        Bank {
            host_id: host_id.to_string(),
            url: url.to_string(),
            use_certificates,
            encryption_key,
            authentication_key,
        }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether this bank exchanges keys as X.509 certificates.
    pub fn use_certificates(&self) -> bool {
        self.use_certificates
    }

    /// `true` once HPB has stored the bank's keys.
    pub fn has_keys(&self) -> bool {
        self.encryption_key.is_some() && self.authentication_key.is_some()
    }

    /// The bank's public encryption key, needed to wrap transaction keys
    /// for uploads. A sequence error until HPB has run.
    pub fn encryption_key(&self) -> Result<&BankPublicKey> {
        self.encryption_key
            .as_ref()
            .ok_or_else(|| EbicsError::Sequence("bank keys not yet retrieved (run HPB)".into()))
    }

    /// The bank's public authentication key.
    pub fn authentication_key(&self) -> Result<&BankPublicKey> {
        self.authentication_key
            .as_ref()
            .ok_or_else(|| EbicsError::Sequence("bank keys not yet retrieved (run HPB)".into()))
    }

    pub(crate) fn set_keys(&mut self, encryption: BankPublicKey, authentication: BankPublicKey) {
        self.encryption_key = Some(encryption);
        self.authentication_key = Some(authentication);
    }
}
