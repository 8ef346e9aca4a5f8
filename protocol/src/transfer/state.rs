//! Per-transaction segment bookkeeping.

use crate::error::{EbicsError, Result};

/// Where a transaction currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// The bank has assigned a transaction id and a segment total; no
    /// segment has been exchanged through `next()` yet.
    Started,
    /// At least one segment exchanged, more to go.
    InProgress,
    /// Every segment exchanged.
    Done,
}

/// The state of one multi-segment transfer.
///
/// Ephemeral: created when the initialization response supplies the
/// transaction id and segment total, discarded when the transfer ends —
/// success, abort or panic alike. Never persisted.
///
/// No I/O lives here. The whole point of this little machine is that the
/// "is this the final request" decision is made in exactly one place and
/// can be tested without a bank in the room.
#[derive(Debug)]
pub struct TransactionState {
    transaction_id: Vec<u8>,
    total: u32,
    current: u32,
    phase: TransferPhase,
}

impl TransactionState {
    /// Start tracking a transaction of `total` segments. A zero total is a
    /// sequence error — a transaction with nothing to transfer cannot
    /// exist on the wire.
    pub fn new(transaction_id: Vec<u8>, total: u32) -> Result<Self> {
        if total == 0 {
            return Err(EbicsError::Sequence(
                "transaction must carry at least one segment".into(),
            ));
        }
        Ok(TransactionState {
            transaction_id,
            total,
            current: 0,
            phase: TransferPhase::Started,
        })
    }

    /// The bank-assigned transaction id, opaque bytes.
    pub fn transaction_id(&self) -> &[u8] {
        &self.transaction_id
    }

    pub fn total_segments(&self) -> u32 {
        self.total
    }

    pub fn phase(&self) -> TransferPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == TransferPhase::Done
    }

    /// Advance to the next segment and return its 1-based index.
    ///
    /// Exactly `total` calls succeed; the call that reaches `total` flips
    /// the phase to `Done`, and any call after that is a sequence error —
    /// a bug in the driving loop, not a protocol condition.
    pub fn next(&mut self) -> Result<u32> {
        if self.is_done() {
            return Err(EbicsError::Sequence(format!(
                "transaction already complete after {} segments",
                self.total
            )));
        }
        self.current += 1;
        self.phase = if self.current == self.total {
            TransferPhase::Done
        } else {
            TransferPhase::InProgress
        };
        Ok(self.current)
    }

    /// `true` exactly when the segment just drawn with [`next`](Self::next)
    /// is the final one.
    pub fn is_last_segment(&self) -> bool {
        self.current == self.total
    }
}
