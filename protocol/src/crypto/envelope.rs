//! Symmetric envelope: nonce generation, the AES-128-CBC transaction key,
//! and zlib compression.
//!
//! ## Wire shape
//!
//! An EBICS order payload travels as `encrypt(compress(payload))`, cut into
//! segments by the transfer layer. The transaction key is the 16-byte nonce
//! generated at transaction start, wrapped once under the counterparty's
//! public encryption key and carried only in the initialization exchange.
//!
//! ## Why a zero IV does not end in tears
//!
//! CBC with a fixed IV leaks equal plaintext prefixes *across messages
//! encrypted under the same key*. Here a key encrypts exactly one message
//! in its entire lifetime, so there is no second message to compare
//! against. The protocol mandates this construction; do not "fix" it.

use std::io::{Read, Write};

use aes::Aes128;
use cbc::cipher::{block_padding::Iso10126, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::NONCE_LENGTH;

use super::CryptoError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// The protocol-mandated all-zero initialization vector.
const ZERO_IV: [u8; 16] = [0u8; 16];

/// Generate the 16-byte transaction nonce from the OS randomness source.
///
/// This is the only non-deterministic operation in the crypto module.
/// It fails only if the OS cannot supply randomness, which is fatal.
pub fn generate_nonce() -> Result<[u8; NONCE_LENGTH], CryptoError> {
    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|_| CryptoError::RandomnessUnavailable)?;
    Ok(nonce)
}

/// The per-transaction AES-128 key.
///
/// The protocol derives the symmetric key directly from the transaction
/// nonce: the 16 nonce bytes *are* the key. Wrapping them in a newtype
/// keeps raw `[u8; 16]`s from wandering between nonce-land and key-land
/// unchecked.
#[derive(Clone)]
pub struct TransactionKey([u8; NONCE_LENGTH]);

impl TransactionKey {
    /// Build the transaction key from the nonce generated at transaction
    /// start. Deterministic by construction.
    pub fn from_nonce(nonce: &[u8; NONCE_LENGTH]) -> Self {
        TransactionKey(*nonce)
    }

    /// Build the transaction key from unwrapped key material received from
    /// the bank. Fails if the material is not exactly 16 bytes.
    pub fn from_slice(material: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; NONCE_LENGTH] =
            material.try_into().map_err(|_| CryptoError::InvalidKey)?;
        Ok(TransactionKey(bytes))
    }

    /// The raw key bytes, e.g. for wrapping under an RSA key.
    pub fn as_bytes(&self) -> &[u8; NONCE_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for TransactionKey {
    // Key bytes stay out of logs, debug output included.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransactionKey(..)")
    }
}

/// Encrypt `plaintext` under the transaction key.
///
/// AES-128-CBC, zero IV, ISO 10126 padding. The output length is always a
/// multiple of the AES block size and strictly larger than the input
/// (padding adds 1..=16 bytes).
pub fn encrypt(plaintext: &[u8], key: &TransactionKey) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes128CbcEnc::new_from_slices(key.as_bytes(), &ZERO_IV)
        .map_err(|_| CryptoError::InvalidKey)?;
    Ok(cipher.encrypt_padded_vec_mut::<Iso10126>(plaintext))
}

/// Decrypt data previously encrypted with [`encrypt`].
///
/// Fails with [`CryptoError::DecryptFailed`] on a padding or length
/// mismatch, which in practice means a wrong key or a corrupted segment.
pub fn decrypt(ciphertext: &[u8], key: &TransactionKey) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes128CbcDec::new_from_slices(key.as_bytes(), &ZERO_IV)
        .map_err(|_| CryptoError::InvalidKey)?;
    cipher
        .decrypt_padded_vec_mut::<Iso10126>(ciphertext)
        .map_err(|_| CryptoError::DecryptFailed)
}

/// Compress payload bytes with zlib at the default level.
///
/// Writing into a `Vec` cannot fail, but `flate2` exposes the `io::Write`
/// interface, so the error is surfaced rather than swallowed.
pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress a zlib stream.
///
/// A malformed stream is an [`io::Error`](std::io::Error); callers map it
/// to the crate's format-error variant because it signals corrupted order
/// data, not a crypto failure.
pub fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
