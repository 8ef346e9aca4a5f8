//! # Trust Bootstrap
//!
//! The key-management handshake that turns a pile of freshly generated
//! RSA keys into a working bank relationship:
//!
//! 1. **INI** — submit the bank-technical signature key.
//! 2. **HIA** — submit the encryption and authentication keys.
//! 3. *(out of band)* — the bank compares the key digests against the
//!    signed initialization letters and activates the subscriber.
//! 4. **HPB** — fetch the bank's public keys and store them locally.
//!
//! **SPR** revokes the subscriber's access when a key is suspected
//! compromised. Note that a successful SPR deliberately does *not* clear
//! the local initialization flags: the bank now requires a fresh INI/HIA
//! cycle, so the local record is dead weight either way and the caller is
//! expected to discard it and provision a new subscriber.
//!
//! Each operation is one synchronous round trip. None of them retries;
//! a bank rejection surfaces as a protocol error carrying the bank's
//! return code and report text.

use tracing::{debug, info};

use crate::crypto::{self};
use crate::error::{EbicsError, Result};
use crate::session::{Bank, EbicsVersion, Subscriber};
use crate::transport::{exchange, EnvelopeBuilder, Transport};

/// Drives the four key-management operations over a subscriber's mutable
/// protocol state.
///
/// Holds mutable borrows of the session records for its whole lifetime,
/// which statically enforces the one-operation-at-a-time rule for a given
/// subscriber.
pub struct TrustBootstrap<'a> {
    transport: &'a mut dyn Transport,
    builder: &'a dyn EnvelopeBuilder,
    subscriber: &'a mut Subscriber,
    bank: &'a mut Bank,
    version: EbicsVersion,
}

impl<'a> TrustBootstrap<'a> {
    pub fn new(
        transport: &'a mut dyn Transport,
        builder: &'a dyn EnvelopeBuilder,
        subscriber: &'a mut Subscriber,
        bank: &'a mut Bank,
        version: EbicsVersion,
    ) -> Self {
        TrustBootstrap {
            transport,
            builder,
            subscriber,
            bank,
            version,
        }
    }

    /// Submit the subscriber's signature key (INI).
    ///
    /// Idempotent: when the flag already says initialized this returns
    /// success without any network traffic. On a bank-accepted response
    /// the flag flips to `true`; the caller persists the subscriber
    /// afterwards.
    pub fn submit_signature_key(&mut self) -> Result<()> {
        if self.subscriber.is_signature_initialized() {
            debug!(user = %self.subscriber.user_id(), "signature key already initialized, skipping INI");
            return Ok(());
        }
        let key = self.subscriber.signature_key()?;
        let request = self.builder.build_ini(key)?;
        let body = exchange(self.transport, &request)?;
        self.builder
            .parse_key_management_response(&body)?
            .return_code
            .into_result()?;
        self.subscriber.mark_signature_initialized();
        info!(
            user = %self.subscriber.user_id(),
            digest = %self.subscriber.signature_key()?.key_digest_hex(),
            "signature key submitted"
        );
        Ok(())
    }

    /// Submit the subscriber's encryption and authentication keys (HIA).
    ///
    /// Same idempotency and flag semantics as
    /// [`submit_signature_key`](Self::submit_signature_key).
    pub fn submit_encryption_and_auth_keys(&mut self) -> Result<()> {
        if self.subscriber.is_encryption_initialized() {
            debug!(user = %self.subscriber.user_id(), "encryption keys already initialized, skipping HIA");
            return Ok(());
        }
        let encryption = self.subscriber.encryption_key()?;
        let authentication = self.subscriber.authentication_key()?;
        let request = self.builder.build_hia(encryption, authentication)?;
        let body = exchange(self.transport, &request)?;
        self.builder
            .parse_key_management_response(&body)?
            .return_code
            .into_result()?;
        self.subscriber.mark_encryption_initialized();
        info!(user = %self.subscriber.user_id(), "encryption and authentication keys submitted");
        Ok(())
    }

    /// Retrieve and store the bank's public keys (HPB).
    ///
    /// Permitted as soon as the subscriber owns an encryption key pair —
    /// the request itself is digest-only and needs no prior key exchange.
    /// The response order data is unwrapped with our private encryption
    /// key, decompressed, parsed by the envelope builder, and stored on
    /// the bank record.
    ///
    /// Under a revision that mandates certificates (H005) the bank record
    /// must already say `use_certificates`; a mismatch is a configuration
    /// error raised before any request is sent.
    pub fn retrieve_bank_keys(&mut self) -> Result<()> {
        let encryption_key = self.subscriber.encryption_key()?;
        if self.version.requires_certificates() && !self.bank.use_certificates() {
            return Err(EbicsError::Sequence(format!(
                "{} mandates certificate key exchange but the bank record is configured for raw keys",
                self.version.schema_id()
            )));
        }

        let request = self.builder.build_hpb()?;
        let body = exchange(self.transport, &request)?;
        let response = self.builder.parse_key_management_response(&body)?;
        response.return_code.into_result()?;

        let wrapped_key = response.wrapped_key.ok_or_else(|| {
            EbicsError::Format("HPB response missing the wrapped transaction key".into())
        })?;
        let order_data = response
            .order_data
            .ok_or_else(|| EbicsError::Format("HPB response missing the key order data".into()))?;

        let key = crypto::unwrap_key(&wrapped_key, encryption_key)?;
        let decrypted = crypto::decrypt(&order_data, &key)?;
        let decompressed = crypto::decompress(&decrypted)
            .map_err(|e| EbicsError::Format(format!("HPB order data decompression failed: {e}")))?;
        let keys = self.builder.parse_bank_keys(&decompressed)?;

        if self.bank.use_certificates()
            && !(keys.encryption.is_certificate() && keys.authentication.is_certificate())
        {
            return Err(EbicsError::Format(
                "bank sent raw keys but certificate exchange is configured".into(),
            ));
        }

        info!(
            host = %self.bank.host_id(),
            encryption_digest = %keys.encryption.key_digest_hex(),
            authentication_digest = %keys.authentication.key_digest_hex(),
            "bank keys stored"
        );
        self.bank.set_keys(keys.encryption, keys.authentication);
        Ok(())
    }

    /// Revoke the subscriber's access (SPR).
    ///
    /// Requires a fully initialized subscriber. On success the local
    /// initialization flags are left untouched on purpose: the bank-side
    /// state now demands a complete re-provisioning, so discard this
    /// subscriber record and start over with fresh keys.
    pub fn revoke_access(&mut self) -> Result<()> {
        if !self.subscriber.is_initialized() {
            return Err(EbicsError::Sequence(
                "cannot revoke an uninitialized subscriber".into(),
            ));
        }
        let key = self.subscriber.signature_key()?;
        let request = self.builder.build_spr(key)?;
        let body = exchange(self.transport, &request)?;
        self.builder
            .parse_key_management_response(&body)?
            .return_code
            .into_result()?;
        info!(user = %self.subscriber.user_id(), "subscriber access revoked; discard this record and re-provision");
        Ok(())
    }
}
