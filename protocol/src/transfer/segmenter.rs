//! Outbound payload segmentation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::config::SEGMENT_SIZE;
use crate::crypto::{self, TransactionKey};
use crate::error::{EbicsError, Result};

/// Turns one outbound payload into an ordered sequence of bounded
/// segments, ready for the transfer phase.
///
/// The pipeline is fixed: optionally compress, encrypt under the
/// transaction key, then cut the *encrypted* bytes at
/// [`SEGMENT_SIZE`] boundaries. The raw boundary is a multiple of 3, so
/// each segment's base64 expansion is self-contained and stays under the
/// 1 MiB text ceiling the protocol imposes on envelope payloads.
///
/// Deterministic: the same payload, flag and key always produce the same
/// segments. All randomness in a transfer lives in the nonce the caller
/// generated once, before constructing this.
#[derive(Debug)]
pub struct Segmenter {
    encrypted: Vec<u8>,
    segment_count: u32,
}

impl Segmenter {
    /// Compress (optionally), encrypt, and partition `payload`.
    ///
    /// The segment count is `ceil(encrypted_len / SEGMENT_SIZE)`; the
    /// final segment may be shorter. Even an empty payload yields one
    /// segment, because CBC padding always emits at least one block.
    pub fn prepare(payload: &[u8], compress: bool, key: &TransactionKey) -> Result<Self> {
        let body = if compress {
            crypto::compress(payload).map_err(|e| EbicsError::Format(e.to_string()))?
        } else {
            payload.to_vec()
        };
        let encrypted = crypto::encrypt(&body, key)?;
        let segment_count = encrypted.len().div_ceil(SEGMENT_SIZE) as u32;
        Ok(Segmenter {
            encrypted,
            segment_count,
        })
    }

    pub fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Total length of the encrypted stream being segmented.
    pub fn encrypted_len(&self) -> usize {
        self.encrypted.len()
    }

    /// The `n`-th segment, 1-based.
    ///
    /// An out-of-range index is a bug in the driving loop and comes back
    /// as a sequence error, not a protocol condition.
    pub fn segment(&self, n: u32) -> Result<&[u8]> {
        if n == 0 || n > self.segment_count {
            return Err(EbicsError::Sequence(format!(
                "segment index {n} out of range 1..={}",
                self.segment_count
            )));
        }
        let start = (n as usize - 1) * SEGMENT_SIZE;
        let end = (start + SEGMENT_SIZE).min(self.encrypted.len());
        Ok(&self.encrypted[start..end])
    }

    /// The `n`-th segment as the base64 text the envelope embeds.
    pub fn segment_base64(&self, n: u32) -> Result<String> {
        Ok(BASE64.encode(self.segment(n)?))
    }
}
