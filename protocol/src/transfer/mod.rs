//! # Transfer Engine
//!
//! One upload or one download, driven to completion over the external
//! transport and envelope-builder collaborators. The moving parts:
//!
//! - [`Segmenter`] — compress, encrypt, cut into bounded segments.
//! - [`Reassembler`] — the inverse, for downloads.
//! - [`TransactionState`] — segment bookkeeping and the "is this the
//!   final request" decision, isolated and testable.
//! - [`upload`] / [`download`] — the two driving loops.
//!
//! Failure policy is uniform and blunt: any transport error, non-OK bank
//! return code, or crypto/format failure aborts the transfer on the spot.
//! Nothing is retried and segment-level resume does not exist; a caller
//! that wants to try again restarts the whole transfer from
//! initialization. The single deliberate exception is the download
//! receipt, which is sent *after* the payload is already safe in the
//! caller's sink — a failure there is worth a warning, not a failure.

mod download;
mod reassembler;
mod segmenter;
mod state;
mod upload;

pub use download::{download, DownloadOutcome};
pub use reassembler::Reassembler;
pub use segmenter::Segmenter;
pub use state::{TransactionState, TransferPhase};
pub use upload::{upload, UploadOutcome};
