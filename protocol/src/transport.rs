//! # Collaborator Contracts
//!
//! The engine never touches a socket and never inspects envelope XML. Both
//! concerns live behind the two traits in this module:
//!
//! - [`Transport`] carries opaque request bytes to the bank and returns the
//!   HTTP status plus opaque response bytes. Any status other than 200 is
//!   fatal to the current call. Blocking by design — deadlines, if wanted,
//!   are the transport implementation's business and surface here as
//!   ordinary transport errors.
//! - [`EnvelopeBuilder`] turns order metadata, transaction state and
//!   pre-encrypted payload bytes into the revision-specific signed request,
//!   and parses responses back into the handful of fields the engine
//!   actually consumes. Canonicalization for authenticated digests happens
//!   on the builder's side of the fence; this crate only ever hashes the
//!   canonical bytes it is given.
//!
//! Selecting a protocol revision means selecting an `EnvelopeBuilder`
//! implementation — configuration, not subclassing.

use serde::{Deserialize, Serialize};

use crate::config;
use crate::crypto::{BankPublicKey, KeyPair};
use crate::error::{EbicsError, Result};
use crate::order::{DateRange, Order};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// An HTTP response as the engine sees it: status and body, nothing else.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Blocking HTTP transport to one bank host.
///
/// Implementations handle connections, TLS and timeouts. A connection-level
/// failure is an `io::Error`; a reachable server always yields a status.
pub trait Transport {
    fn send(&mut self, request: &[u8]) -> std::io::Result<HttpResponse>;
}

/// One round trip: send the request, insist on HTTP 200, hand back the
/// body. Every protocol exchange in the engine funnels through here.
pub(crate) fn exchange(transport: &mut dyn Transport, request: &[u8]) -> Result<Vec<u8>> {
    let response = transport.send(request).map_err(|e| EbicsError::Transport {
        status: 0,
        detail: e.to_string(),
    })?;
    if response.status != 200 {
        return Err(EbicsError::Transport {
            status: response.status,
            detail: format!("unexpected HTTP status {}", response.status),
        });
    }
    Ok(response.body)
}

// ---------------------------------------------------------------------------
// Return codes
// ---------------------------------------------------------------------------

/// A technical return code plus the bank's report text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCode {
    pub code: String,
    pub text: String,
}

impl ReturnCode {
    /// The all-clear code `000000`.
    pub fn ok() -> Self {
        ReturnCode {
            code: config::CODE_OK.into(),
            text: String::new(),
        }
    }

    /// `true` for the success codes, including the positive download
    /// acknowledgements.
    pub fn is_ok(&self) -> bool {
        matches!(
            self.code.as_str(),
            config::CODE_OK | config::CODE_POSTPROCESS_DONE | config::CODE_POSTPROCESS_SKIPPED
        )
    }

    /// `true` for "no download data available".
    pub fn is_no_data(&self) -> bool {
        self.code == config::CODE_NO_DOWNLOAD_DATA
    }

    /// Promote to the crate error taxonomy: success codes pass, the
    /// no-data code becomes its dedicated variant, everything else is a
    /// protocol error carrying the bank's code and text.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else if self.is_no_data() {
            Err(EbicsError::NoDataAvailable)
        } else {
            Err(EbicsError::Protocol {
                code: self.code,
                text: self.text,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Request metadata / parsed responses
// ---------------------------------------------------------------------------

/// Everything the builder needs for an upload initialization request.
#[derive(Debug)]
pub struct UploadInit<'a> {
    pub order: &'a Order,
    /// The order number drawn from the Partner counter for this upload.
    pub order_number: u64,
    /// Legacy 4-character order id derived from the number.
    pub order_id: String,
    /// Total number of segments the transfer phase will carry.
    pub segment_count: u32,
    /// SHA-256 over the plaintext payload, signed by the ES.
    pub payload_digest: [u8; 32],
    /// The user-signature order data, compressed and encrypted under the
    /// transaction key.
    pub encrypted_signature_data: Vec<u8>,
    /// The transaction key wrapped under the bank's public encryption key.
    pub wrapped_key: Vec<u8>,
}

/// Parsed initialization response, upload or download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitResponse {
    pub return_code: ReturnCode,
    /// Bank-assigned transaction id; opaque bytes.
    pub transaction_id: Vec<u8>,
    /// Total segment count. Meaningful for downloads; banks echo 0 or the
    /// upload's own count on uploads and the engine ignores it there.
    pub segment_count: u32,
    /// First data segment (downloads only).
    pub segment: Option<Vec<u8>>,
    /// Transaction key wrapped under our public encryption key
    /// (downloads only).
    pub wrapped_key: Option<Vec<u8>>,
}

/// Parsed transfer-phase response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub return_code: ReturnCode,
    /// The requested data segment (downloads only).
    pub segment: Option<Vec<u8>>,
}

/// Parsed key-management response (INI, HIA, HPB, SPR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyManagementResponse {
    pub return_code: ReturnCode,
    /// Transaction key wrapped under our public encryption key (HPB).
    pub wrapped_key: Option<Vec<u8>>,
    /// Encrypted, compressed order data carrying the bank keys (HPB).
    pub order_data: Option<Vec<u8>>,
}

/// The bank's public keys as parsed out of decrypted HPB order data.
#[derive(Debug, Clone)]
pub struct BankKeys {
    pub encryption: BankPublicKey,
    pub authentication: BankPublicKey,
}

// ---------------------------------------------------------------------------
// Envelope builder
// ---------------------------------------------------------------------------

/// Builds revision-specific request envelopes and parses their responses.
///
/// Implementations capture the session context (host/partner/user ids,
/// the authentication key for X002 request signing, schema namespaces) at
/// construction time; the engine hands over only per-call data. One
/// implementation per protocol revision.
pub trait EnvelopeBuilder {
    /// The canonical user-signature order data for an upload: the A005
    /// signature wrapped in its revision-specific structure. The engine
    /// compresses and encrypts the result under the transaction key.
    fn build_user_signature(&self, signature: &[u8]) -> Result<Vec<u8>>;

    /// The upload initialization request.
    fn build_upload_init(&self, init: &UploadInit<'_>) -> Result<Vec<u8>>;

    /// One upload transfer request carrying a pre-encrypted segment.
    fn build_upload_transfer(
        &self,
        transaction_id: &[u8],
        segment_number: u32,
        last_segment: bool,
        segment: &[u8],
    ) -> Result<Vec<u8>>;

    /// The download initialization request.
    fn build_download_init(&self, order: &Order, range: Option<&DateRange>) -> Result<Vec<u8>>;

    /// One download transfer request asking for a segment.
    fn build_download_transfer(
        &self,
        transaction_id: &[u8],
        segment_number: u32,
        last_segment: bool,
    ) -> Result<Vec<u8>>;

    /// The receipt request closing a download transaction.
    /// `receipt_code` is [`config::RECEIPT_POSITIVE`] or
    /// [`config::RECEIPT_NEGATIVE`].
    fn build_receipt(&self, transaction_id: &[u8], receipt_code: u8) -> Result<Vec<u8>>;

    /// The INI request submitting the signature key.
    fn build_ini(&self, signature_key: &KeyPair) -> Result<Vec<u8>>;

    /// The HIA request submitting the encryption and authentication keys.
    fn build_hia(&self, encryption_key: &KeyPair, authentication_key: &KeyPair)
        -> Result<Vec<u8>>;

    /// The HPB request fetching the bank's keys. Digest-only: valid before
    /// any key exchange has happened.
    fn build_hpb(&self) -> Result<Vec<u8>>;

    /// The SPR request revoking the subscriber's access.
    fn build_spr(&self, signature_key: &KeyPair) -> Result<Vec<u8>>;

    fn parse_init_response(&self, body: &[u8]) -> Result<InitResponse>;

    fn parse_transfer_response(&self, body: &[u8]) -> Result<TransferResponse>;

    fn parse_receipt_response(&self, body: &[u8]) -> Result<ReturnCode>;

    fn parse_key_management_response(&self, body: &[u8]) -> Result<KeyManagementResponse>;

    /// Parse the bank's keys out of decrypted, decompressed HPB order
    /// data.
    fn parse_bank_keys(&self, order_data: &[u8]) -> Result<BankKeys>;
}
