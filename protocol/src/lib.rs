// Copyright (c) 2026 Hermes Financial Systems. MIT License.
// See LICENSE for details.

//! # Hermes EBICS — Core Protocol Engine
//!
//! The transfer and trust-bootstrap engine of an EBICS client: everything
//! between "here is a payment file" and "the bank acknowledged the last
//! segment", minus the parts that are deliberately someone else's job.
//!
//! EBICS moves opaque payloads through multi-request transactions: a
//! payload is compressed, encrypted under a one-shot AES key, cut into
//! bounded segments, and walked across the wire with strict sequencing
//! rules. Getting any of this slightly wrong does not produce an error —
//! it produces a bank host that silently stops talking to you. Hence this
//! crate's obsession with doing the sequencing in one tested place.
//!
//! ## Architecture
//!
//! - **crypto** — The cryptographic envelope: AES-128-CBC transaction
//!   keys, RSA key wrapping and signing, SHA-256 digests, zlib. The only
//!   module allowed to touch a cipher.
//! - **order** — What is being requested: admin orders, legacy order
//!   codes, BTF service descriptors.
//! - **session** — The long-lived records: Subscriber, Partner (owner of
//!   the order-number sequence), Bank.
//! - **transfer** — Segmentation, reassembly, transaction state, and the
//!   upload/download driving loops.
//! - **trust** — The INI/HIA/HPB/SPR key-management handshake.
//! - **transport** — The collaborator seams: blocking HTTP transport and
//!   the revision-specific envelope builder live *behind* these traits,
//!   not in this crate.
//! - **config** — Protocol constants. All of them.
//!
//! ## What this crate is not
//!
//! No XML, no schema validation, no sockets, no TLS, no persistence, no
//! CLI. Those concerns plug in at the trait boundaries in [`transport`].
//! Payload bytes are opaque throughout; this engine neither knows nor
//! cares whether it is carrying pain.001 or camt.053.
//!
//! ## Concurrency
//!
//! Strictly synchronous, single-threaded per transfer, no internal
//! locking. A Partner's order counter and a Subscriber's initialization
//! flags are mutated in place; callers serialize access per record.
//! Different subscribers are fully independent.

pub mod config;
pub mod crypto;
pub mod error;
pub mod order;
pub mod session;
pub mod transfer;
pub mod transport;
pub mod trust;

pub use error::{EbicsError, Result};
pub use order::{AdminOrderType, BtfContainer, BtfService, DateRange, Order, OrderKind};
pub use session::{Bank, EbicsVersion, Partner, Subscriber};
pub use transfer::{
    download, upload, DownloadOutcome, Reassembler, Segmenter, TransactionState, TransferPhase,
    UploadOutcome,
};
pub use transport::{
    BankKeys, EnvelopeBuilder, HttpResponse, InitResponse, KeyManagementResponse, ReturnCode,
    Transport, TransferResponse, UploadInit,
};
pub use trust::TrustBootstrap;
