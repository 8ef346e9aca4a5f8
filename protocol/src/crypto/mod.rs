//! # Cryptographic Envelope
//!
//! Every cryptographic transform the EBICS protocol needs, in one place.
//! Nothing else in this crate touches a cipher, a hash, or an RSA key
//! directly.
//!
//! The protocol fixes all algorithm choices; none of them are configurable
//! here and none of them should be:
//!
//! - **AES-128-CBC** with an all-zero IV and ISO 10126 padding for the
//!   per-transaction symmetric envelope (E002). The zero IV is safe only
//!   because every transaction key is used exactly once — it is generated
//!   fresh as the transaction nonce and never reused.
//! - **RSA PKCS#1 v1.5** for wrapping transaction keys under the
//!   counterparty's public encryption key, and for the bank-technical
//!   signature over SHA-256 digests (A005).
//! - **SHA-256** for every digest: authenticated request parts, payload
//!   hashes, and the key digests printed on initialization letters.
//! - **zlib/deflate** for payload compression before encryption.
//!
//! Apart from nonce generation this module is pure: same inputs, same
//! outputs, no I/O. That property is what keeps segmentation deterministic
//! and testable.

mod envelope;
mod keys;

pub use envelope::{
    compress, decompress, decrypt, encrypt, generate_nonce, TransactionKey,
};
pub use keys::{
    digest, format_key_digest, key_digest_raw, sign, unwrap_key, wrap_key, BankPublicKey, KeyPair,
};

use thiserror::Error;

/// Errors from cryptographic operations.
///
/// Deliberately vague about *why* a decryption or signature failed.
/// Distinguishing "wrong key" from "tampered ciphertext" in an error
/// message helps exactly one audience, and it is not ours.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS randomness source was unavailable. Fatal and non-retryable;
    /// a host without working randomness must not talk to a bank.
    #[error("randomness source unavailable")]
    RandomnessUnavailable,

    /// Key material had the wrong length or was otherwise unusable.
    #[error("invalid key material")]
    InvalidKey,

    /// Symmetric or asymmetric encryption failed.
    #[error("encryption failed")]
    EncryptFailed,

    /// Decryption failed — wrong key, bad padding, or tampered data.
    #[error("decryption failed")]
    DecryptFailed,

    /// A signature could not be produced, e.g. the subscriber has no
    /// signature key yet.
    #[error("signing failed: {0}")]
    SignFailed(String),
}
