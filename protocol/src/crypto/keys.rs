//! RSA key material, key wrapping, signing, and digests.
//!
//! A subscriber carries three RSA key pairs (signature, encryption,
//! authentication); a bank exposes two public keys (encryption,
//! authentication). Depending on the protocol revision and bank policy,
//! either side's keys travel as raw modulus/exponent pairs or wrapped in
//! X.509 certificates — the certificate case stores the DER bytes next to
//! the extracted RSA key, because the engine never needs to look inside
//! the certificate, only to hash it and hand it to the envelope builder.
//!
//! ## Serialization
//!
//! [`KeyPair`] intentionally does NOT implement `Serialize`/`Deserialize`.
//! Writing a private key somewhere must be a deliberate act, so the only
//! way out is the explicit [`KeyPair::to_pkcs8_der`] helper used by the
//! external persistence collaborator.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::config::{DIGEST_LENGTH, MIN_RSA_KEY_BITS};

use super::envelope::TransactionKey;
use super::CryptoError;

// ---------------------------------------------------------------------------
// Key pairs
// ---------------------------------------------------------------------------

/// One RSA key pair of a subscriber, optionally carrying the X.509
/// certificate the public half is wrapped in.
#[derive(Clone)]
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    /// DER-encoded X.509 certificate for the public key, when the bank
    /// policy or protocol revision mandates certificate exchange.
    certificate: Option<Vec<u8>>,
}

impl KeyPair {
    /// Generate a fresh key pair with the given modulus length.
    ///
    /// Rejects moduli shorter than the protocol floor; banks do the same,
    /// just later and with a less helpful message.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_RSA_KEY_BITS {
            return Err(CryptoError::InvalidKey);
        }
        let private = RsaPrivateKey::new(&mut OsRng, bits).map_err(|_| CryptoError::InvalidKey)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair {
            private,
            public,
            certificate: None,
        })
    }

    /// Wrap an existing private key, e.g. one loaded from persistence.
    pub fn from_private_key(private: RsaPrivateKey) -> Result<Self, CryptoError> {
        if private.n().bits() < MIN_RSA_KEY_BITS {
            return Err(CryptoError::InvalidKey);
        }
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair {
            private,
            public,
            certificate: None,
        })
    }

    /// Attach the DER-encoded X.509 certificate for this key.
    pub fn with_certificate(mut self, der: Vec<u8>) -> Self {
        self.certificate = Some(der);
        self
    }

    /// The public half, safe to share.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// The DER certificate bytes, if this key travels as a certificate.
    pub fn certificate(&self) -> Option<&[u8]> {
        self.certificate.as_deref()
    }

    /// The digest identifying this key: over the certificate when present,
    /// over the raw modulus/exponent encoding otherwise.
    pub fn key_digest(&self) -> [u8; DIGEST_LENGTH] {
        match &self.certificate {
            Some(der) => digest(der),
            None => key_digest_raw(&self.public),
        }
    }

    /// [`key_digest`](Self::key_digest) formatted for an initialization
    /// letter: uppercase hex byte pairs separated by spaces.
    pub fn key_digest_hex(&self) -> String {
        format_key_digest(&self.key_digest())
    }

    /// Export the private key as PKCS#8 DER for the external persistence
    /// collaborator. Deliberate act; treat the bytes accordingly.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>, CryptoError> {
        self.private
            .to_pkcs8_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|_| CryptoError::InvalidKey)
    }

    /// Load a key pair from PKCS#8 DER previously produced by
    /// [`to_pkcs8_der`](Self::to_pkcs8_der).
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::from_pkcs8_der(der).map_err(|_| CryptoError::InvalidKey)?;
        Self::from_private_key(private)
    }

    pub(super) fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }
}

impl std::fmt::Debug for KeyPair {
    // Private key bytes never reach a log line.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.public.n().bits())
            .field("certificate", &self.certificate.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Bank public keys
// ---------------------------------------------------------------------------

/// A bank's public key as learned from the key-retrieval handshake:
/// the RSA key plus, when the bank exchanges certificates, the DER bytes
/// it arrived in.
#[derive(Clone)]
pub struct BankPublicKey {
    key: RsaPublicKey,
    certificate: Option<Vec<u8>>,
}

impl BankPublicKey {
    /// A key exchanged as a raw modulus/exponent pair.
    pub fn raw(key: RsaPublicKey) -> Self {
        BankPublicKey {
            key,
            certificate: None,
        }
    }

    /// A key exchanged inside an X.509 certificate.
    pub fn certificate(key: RsaPublicKey, der: Vec<u8>) -> Self {
        BankPublicKey {
            key,
            certificate: Some(der),
        }
    }

    /// The RSA key used for wrapping and verification.
    pub fn key(&self) -> &RsaPublicKey {
        &self.key
    }

    /// `true` when this key arrived as a certificate.
    pub fn is_certificate(&self) -> bool {
        self.certificate.is_some()
    }

    /// The digest used to confirm bank trust out-of-band.
    pub fn key_digest(&self) -> [u8; DIGEST_LENGTH] {
        match &self.certificate {
            Some(der) => digest(der),
            None => key_digest_raw(&self.key),
        }
    }

    /// [`key_digest`](Self::key_digest) in letter format.
    pub fn key_digest_hex(&self) -> String {
        format_key_digest(&self.key_digest())
    }
}

impl std::fmt::Debug for BankPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankPublicKey")
            .field("digest", &self.key_digest_hex())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wrapping, signing, digesting
// ---------------------------------------------------------------------------

/// Wrap the transaction key under the recipient's public encryption key
/// (RSA PKCS#1 v1.5). Used exactly once per transaction, in the
/// initialization exchange.
pub fn wrap_key(key: &TransactionKey, recipient: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    recipient
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, key.as_bytes())
        .map_err(|_| CryptoError::EncryptFailed)
}

/// Unwrap a transaction key the bank wrapped under our public encryption
/// key. Fails on a key mismatch or malformed wrapping.
pub fn unwrap_key(wrapped: &[u8], own: &KeyPair) -> Result<TransactionKey, CryptoError> {
    let material = own
        .private_key()
        .decrypt(Pkcs1v15Encrypt, wrapped)
        .map_err(|_| CryptoError::DecryptFailed)?;
    TransactionKey::from_slice(&material)
}

/// Sign a 32-byte SHA-256 digest with the subscriber's signature key
/// (A005: RSA PKCS#1 v1.5).
///
/// The digest is computed by [`digest`] over canonical bytes supplied by
/// the envelope builder; this function never canonicalizes anything
/// itself.
pub fn sign(digest: &[u8], signer: &KeyPair) -> Result<Vec<u8>, CryptoError> {
    if digest.len() != DIGEST_LENGTH {
        return Err(CryptoError::SignFailed(format!(
            "expected a {DIGEST_LENGTH}-byte digest, got {}",
            digest.len()
        )));
    }
    signer
        .private_key()
        .sign(Pkcs1v15Sign::new::<Sha256>(), digest)
        .map_err(|e| CryptoError::SignFailed(e.to_string()))
}

/// SHA-256 over arbitrary bytes. The protocol hash function for
/// authenticated request parts, payload hashes, and certificates.
pub fn digest(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    Sha256::digest(data).into()
}

/// The EBICS key digest for a raw RSA public key.
///
/// SHA-256 over the ASCII string `"<exponent> <modulus>"` where both
/// numbers are lowercase hex with leading zeros stripped. This exact
/// encoding is what banks print on INI letters; get it wrong and every
/// letter comparison fails even though the keys match.
pub fn key_digest_raw(public: &RsaPublicKey) -> [u8; DIGEST_LENGTH] {
    let encoded = format!("{:x} {:x}", public.e(), public.n());
    digest(encoded.as_bytes())
}

/// Format a key digest the way initialization letters print it:
/// uppercase hex byte pairs separated by single spaces.
pub fn format_key_digest(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
