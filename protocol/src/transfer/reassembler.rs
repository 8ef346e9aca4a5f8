//! Inbound segment reassembly.

use crate::crypto::{self, TransactionKey};
use crate::error::{EbicsError, Result};

/// Accumulates download segments and recovers the original payload.
///
/// Segments are appended in arrival order; the driving loop guarantees
/// increasing index order and no reordering happens here. `finalize`
/// consumes the accumulator, decrypts the joined stream and decompresses
/// it. The caller must only finalize once the last segment has arrived —
/// finalizing early hands the cipher a truncated stream, which fails the
/// padding check at best and yields garbage at worst.
#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Reassembler::default()
    }

    /// Append one segment's bytes.
    pub fn append(&mut self, segment: &[u8]) {
        self.buffer.extend_from_slice(segment);
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Decrypt and decompress the joined stream.
    ///
    /// A crypto error means a wrong transaction key or transport-level
    /// corruption; a format error means the decrypted stream is not valid
    /// zlib. Both are fatal to the transfer.
    pub fn finalize(self, key: &TransactionKey) -> Result<Vec<u8>> {
        let compressed = crypto::decrypt(&self.buffer, key)?;
        crypto::decompress(&compressed)
            .map_err(|e| EbicsError::Format(format!("order data decompression failed: {e}")))
    }
}
