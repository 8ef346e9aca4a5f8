//! # Protocol Constants
//!
//! Every magic number of the EBICS engine lives here. If you find yourself
//! hardcoding a constant anywhere else in this crate, move it here first.
//!
//! Most of these values are mandated by the EBICS specification and are not
//! tunable: changing a segment boundary or a padding detail produces requests
//! that real bank hosts silently reject, usually weeks later, in production,
//! on a Friday.

// ---------------------------------------------------------------------------
// Protocol Revisions
// ---------------------------------------------------------------------------

/// Schema identifier for EBICS 2.4 (H003).
pub const VERSION_H003: &str = "H003";

/// Schema identifier for EBICS 2.5 (H004).
pub const VERSION_H004: &str = "H004";

/// Schema identifier for EBICS 3.0 (H005). This revision mandates X.509
/// certificates for all key exchange and replaces two-letter order types
/// with BTF service descriptors.
pub const VERSION_H005: &str = "H005";

/// Version identifier of the bank-technical signature scheme: RSA PKCS#1
/// v1.5 over SHA-256.
pub const SIGNATURE_VERSION: &str = "A005";

/// Version identifier of the encryption scheme: AES-128-CBC transaction
/// keys wrapped with RSA PKCS#1 v1.5.
pub const ENCRYPTION_VERSION: &str = "E002";

/// Version identifier of the authentication (identification) signature
/// scheme applied to the authenticated parts of each request.
pub const AUTHENTICATION_VERSION: &str = "X002";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Length of the per-transaction nonce in bytes. The nonce doubles as the
/// AES-128 transaction key, so this is also the symmetric key length.
pub const NONCE_LENGTH: usize = 16;

/// AES block length in bytes. CBC ciphertext lengths are always a multiple
/// of this.
pub const AES_BLOCK_LENGTH: usize = 16;

/// Output length of the protocol hash function (SHA-256) in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// Minimum RSA modulus length accepted for subscriber and bank keys.
/// EBICS 2.5 raised the floor to 1536 bits; anything shorter is rejected
/// at key-load time rather than mid-handshake.
pub const MIN_RSA_KEY_BITS: usize = 1536;

/// Recommended RSA modulus length for newly generated subscriber keys.
pub const RSA_KEY_BITS: usize = 2048;

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// Ceiling on the base64 text size of one transfer segment: 1 MiB.
/// The limit applies to the *expanded* representation because that is what
/// travels inside the XML envelope.
pub const SEGMENT_CEILING_B64: usize = 1024 * 1024;

/// Raw (pre-base64) segment size derived from [`SEGMENT_CEILING_B64`].
///
/// Base64 maps 3 raw bytes to 4 text bytes, so the raw size must be a
/// multiple of 3 or a segment boundary would split a base64 quantum and
/// the reassembled stream would be garbage. `1 MiB / 4 * 3 = 786 432`.
///
/// Validated against bank hosts in interop testing; if official test
/// vectors ever disagree, this single constant is the place to fix it.
pub const SEGMENT_SIZE: usize = SEGMENT_CEILING_B64 / 4 * 3;

// ---------------------------------------------------------------------------
// Technical Return Codes
// ---------------------------------------------------------------------------

/// Everything went fine.
pub const CODE_OK: &str = "000000";

/// Positive acknowledgement: download post-processing done. Banks send
/// this on the receipt response of a successful download; it is a success
/// code, not an error.
pub const CODE_POSTPROCESS_DONE: &str = "011000";

/// Download post-processing skipped. Also a success code.
pub const CODE_POSTPROCESS_SKIPPED: &str = "011001";

/// No download data available for the requested window. Surfaced to
/// callers as [`EbicsError::NoDataAvailable`](crate::error::EbicsError),
/// never logged as an error by this crate.
pub const CODE_NO_DOWNLOAD_DATA: &str = "090005";

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// Receipt code telling the bank the download was processed successfully
/// and the data may be marked as fetched.
pub const RECEIPT_POSITIVE: u8 = 0;

/// Receipt code telling the bank the client could not process the
/// downloaded data; the bank keeps it available for a retry.
pub const RECEIPT_NEGATIVE: u8 = 1;

// ---------------------------------------------------------------------------
// Order Identifiers
// ---------------------------------------------------------------------------

/// Length of a legacy order id: one letter followed by three base-36
/// characters, `A000` through `ZZZZ`.
pub const ORDER_ID_LENGTH: usize = 4;

/// Base-36 alphabet used for the last three characters of an order id.
pub const ORDER_ID_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
