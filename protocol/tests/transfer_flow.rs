//! End-to-end tests for the transfer engine and the trust bootstrap.
//!
//! These run the real driving loops against a scripted in-memory bank:
//! a [`Transport`] implementation that parses a JSON stand-in for the
//! envelope format and answers the way a bank host would, and an
//! [`EnvelopeBuilder`] that speaks that JSON. The cryptography is not
//! mocked — transaction keys are wrapped and unwrapped with real RSA,
//! segments are really encrypted, and the scripted bank verifies the
//! upload signature with the subscriber's public key.

use std::cell::RefCell;
use std::str::FromStr;

use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use sha2::Sha256;

use hermes_ebics::config::{MIN_RSA_KEY_BITS, RECEIPT_POSITIVE, SEGMENT_SIZE};
use hermes_ebics::crypto::{self, KeyPair, TransactionKey};
use hermes_ebics::{
    download, upload, Bank, BankKeys, BtfService, EbicsError, EbicsVersion,
    EnvelopeBuilder, HttpResponse, InitResponse, KeyManagementResponse, Order, Partner,
    ReturnCode, Subscriber, Transport, TransferResponse, TrustBootstrap, UploadInit,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Opt-in log output for debugging these flows: `RUST_LOG=debug`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic pseudo-random bytes that do not compress, so segment
/// counts are predictable from input sizes.
fn incompressible(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

fn generate_keys() -> KeyPair {
    KeyPair::generate(MIN_RSA_KEY_BITS).unwrap()
}

/// A subscriber with all three key pairs and both handshakes completed.
fn initialized_subscriber() -> Subscriber {
    Subscriber::restore(
        "USER001",
        Some(generate_keys()),
        Some(generate_keys()),
        Some(generate_keys()),
        true,
        true,
    )
}

fn hex_biguint(n: &BigUint) -> String {
    format!("{n:x}")
}

fn pubkey_json(key: &RsaPublicKey) -> Value {
    json!({ "n": hex_biguint(key.n()), "e": hex_biguint(key.e()) })
}

fn pubkey_from_json(value: &Value) -> RsaPublicKey {
    let n = BigUint::parse_bytes(value["n"].as_str().unwrap().as_bytes(), 16).unwrap();
    let e = BigUint::parse_bytes(value["e"].as_str().unwrap().as_bytes(), 16).unwrap();
    RsaPublicKey::new(n, e).unwrap()
}

// ---------------------------------------------------------------------------
// JSON envelope builder
// ---------------------------------------------------------------------------

/// Speaks a JSON stand-in for the revision-specific XML envelope. The
/// engine never looks inside the bytes, so the tests are free to pick a
/// format the scripted bank can assert on.
struct JsonEnvelopeBuilder;

fn to_bytes(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

impl EnvelopeBuilder for JsonEnvelopeBuilder {
    fn build_user_signature(&self, signature: &[u8]) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({ "signature": hex::encode(signature) })))
    }

    fn build_upload_init(&self, init: &UploadInit<'_>) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "upload_init",
            "order": serde_json::to_value(init.order).unwrap(),
            "order_number": init.order_number,
            "order_id": init.order_id,
            "segment_count": init.segment_count,
            "payload_digest": hex::encode(init.payload_digest),
            "encrypted_signature_data": hex::encode(&init.encrypted_signature_data),
            "wrapped_key": hex::encode(&init.wrapped_key),
        })))
    }

    fn build_upload_transfer(
        &self,
        transaction_id: &[u8],
        segment_number: u32,
        last_segment: bool,
        segment: &[u8],
    ) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "upload_transfer",
            "transaction_id": hex::encode(transaction_id),
            "segment_number": segment_number,
            "last_segment": last_segment,
            "segment": hex::encode(segment),
        })))
    }

    fn build_download_init(
        &self,
        order: &Order,
        range: Option<&hermes_ebics::DateRange>,
    ) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "download_init",
            "order": serde_json::to_value(order).unwrap(),
            "range": serde_json::to_value(range).unwrap(),
        })))
    }

    fn build_download_transfer(
        &self,
        transaction_id: &[u8],
        segment_number: u32,
        last_segment: bool,
    ) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "download_transfer",
            "transaction_id": hex::encode(transaction_id),
            "segment_number": segment_number,
            "last_segment": last_segment,
        })))
    }

    fn build_receipt(
        &self,
        transaction_id: &[u8],
        receipt_code: u8,
    ) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "receipt",
            "transaction_id": hex::encode(transaction_id),
            "receipt_code": receipt_code,
        })))
    }

    fn build_ini(&self, signature_key: &KeyPair) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "ini",
            "key_digest": signature_key.key_digest_hex(),
        })))
    }

    fn build_hia(
        &self,
        encryption_key: &KeyPair,
        authentication_key: &KeyPair,
    ) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "hia",
            "encryption_digest": encryption_key.key_digest_hex(),
            "authentication_digest": authentication_key.key_digest_hex(),
        })))
    }

    fn build_hpb(&self) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({ "kind": "hpb" })))
    }

    fn build_spr(&self, signature_key: &KeyPair) -> hermes_ebics::Result<Vec<u8>> {
        Ok(to_bytes(json!({
            "kind": "spr",
            "key_digest": signature_key.key_digest_hex(),
        })))
    }

    fn parse_init_response(&self, body: &[u8]) -> hermes_ebics::Result<InitResponse> {
        Ok(serde_json::from_slice(body).unwrap())
    }

    fn parse_transfer_response(&self, body: &[u8]) -> hermes_ebics::Result<TransferResponse> {
        Ok(serde_json::from_slice(body).unwrap())
    }

    fn parse_receipt_response(&self, body: &[u8]) -> hermes_ebics::Result<ReturnCode> {
        Ok(serde_json::from_slice(body).unwrap())
    }

    fn parse_key_management_response(
        &self,
        body: &[u8],
    ) -> hermes_ebics::Result<KeyManagementResponse> {
        Ok(serde_json::from_slice(body).unwrap())
    }

    fn parse_bank_keys(&self, order_data: &[u8]) -> hermes_ebics::Result<BankKeys> {
        let value: Value = serde_json::from_slice(order_data).unwrap();
        let read = |slot: &Value| {
            let key = pubkey_from_json(slot);
            match slot.get("certificate").and_then(Value::as_str) {
                Some(der) => hermes_ebics::crypto::BankPublicKey::certificate(
                    key,
                    hex::decode(der).unwrap(),
                ),
                None => hermes_ebics::crypto::BankPublicKey::raw(key),
            }
        };
        Ok(BankKeys {
            encryption: read(&value["enc"]),
            authentication: read(&value["auth"]),
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted bank host
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UploadSession {
    key: Option<TransactionKey>,
    payload_digest: Vec<u8>,
    signature: Vec<u8>,
    total: u32,
    received: Vec<u8>,
    next_expected: u32,
}

/// The bank side of the wire, speaking the JSON envelope format.
struct ScriptedBank {
    /// Bank's own encryption key pair (for unwrapping upload keys).
    enc_key: RsaPrivateKey,
    auth_key: RsaPrivateKey,
    /// Subscriber public keys the bank learned out-of-band.
    subscriber_signature: Option<RsaPublicKey>,
    subscriber_encryption: Option<RsaPublicKey>,
    /// Every request body seen, for call counting and assertions.
    requests: RefCell<Vec<Value>>,
    /// Scripted download content.
    download_segments: Vec<Vec<u8>>,
    download_wrapped_key: Vec<u8>,
    no_data: bool,
    /// Receipt codes received.
    receipts: Vec<u8>,
    /// Completed upload payload, for post-test assertions.
    upload_result: Option<Vec<u8>>,
    upload_session: UploadSession,
    /// Fail the upload transfer with this segment number, if set.
    fail_transfer_at: Option<u32>,
    /// Answer every request with this HTTP status, if set.
    http_status: Option<u16>,
    /// Send bank keys as certificates in HPB order data.
    send_certificates: bool,
}

impl ScriptedBank {
    fn new() -> Self {
        ScriptedBank {
            enc_key: RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap(),
            auth_key: RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap(),
            subscriber_signature: None,
            subscriber_encryption: None,
            requests: RefCell::new(Vec::new()),
            download_segments: Vec::new(),
            download_wrapped_key: Vec::new(),
            no_data: false,
            receipts: Vec::new(),
            upload_result: None,
            upload_session: UploadSession::default(),
            fail_transfer_at: None,
            http_status: None,
            send_certificates: false,
        }
    }

    fn for_subscriber(subscriber: &Subscriber) -> Self {
        let mut bank = Self::new();
        bank.subscriber_signature =
            Some(subscriber.signature_key().unwrap().public_key().clone());
        bank.subscriber_encryption =
            Some(subscriber.encryption_key().unwrap().public_key().clone());
        bank
    }

    /// The Bank session record matching this scripted host.
    fn bank_record(&self) -> Bank {
        let public = RsaPublicKey::from(&self.enc_key);
        Bank::restore(
            "HOSTXY",
            "https://ebics.example.test/ebics",
            false,
            Some(hermes_ebics::crypto::BankPublicKey::raw(public)),
            Some(hermes_ebics::crypto::BankPublicKey::raw(RsaPublicKey::from(
                &self.auth_key,
            ))),
        )
    }

    /// Script a download: the payload is compressed, encrypted under a
    /// fixed transaction key and segmented the way a bank would.
    fn with_download(mut self, payload: &[u8]) -> Self {
        let key = TransactionKey::from_nonce(&[5u8; 16]);
        let encrypted = crypto::encrypt(&crypto::compress(payload).unwrap(), &key).unwrap();
        self.download_segments = encrypted
            .chunks(SEGMENT_SIZE)
            .map(|c| c.to_vec())
            .collect();
        self.download_wrapped_key = crypto::wrap_key(
            &key,
            self.subscriber_encryption.as_ref().expect("subscriber keys"),
        )
        .unwrap();
        self
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn ok_code() -> ReturnCode {
        ReturnCode::ok()
    }

    fn handle(&mut self, request: Value) -> Value {
        match request["kind"].as_str().unwrap() {
            "upload_init" => {
                let wrapped = hex::decode(request["wrapped_key"].as_str().unwrap()).unwrap();
                let material = self.enc_key.decrypt(Pkcs1v15Encrypt, &wrapped).unwrap();
                let key = TransactionKey::from_slice(&material).unwrap();

                // Verify the bank-technical signature before accepting.
                let digest =
                    hex::decode(request["payload_digest"].as_str().unwrap()).unwrap();
                let sig_blob =
                    hex::decode(request["encrypted_signature_data"].as_str().unwrap()).unwrap();
                let sig_json =
                    crypto::decompress(&crypto::decrypt(&sig_blob, &key).unwrap()).unwrap();
                let sig_value: Value = serde_json::from_slice(&sig_json).unwrap();
                let signature =
                    hex::decode(sig_value["signature"].as_str().unwrap()).unwrap();
                self.subscriber_signature
                    .as_ref()
                    .expect("subscriber signature key")
                    .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
                    .expect("upload signature must verify");

                self.upload_session = UploadSession {
                    key: Some(key),
                    payload_digest: digest,
                    signature,
                    total: request["segment_count"].as_u64().unwrap() as u32,
                    received: Vec::new(),
                    next_expected: 1,
                };
                serde_json::to_value(InitResponse {
                    return_code: Self::ok_code(),
                    transaction_id: b"TXUP0001".to_vec(),
                    segment_count: 0,
                    segment: None,
                    wrapped_key: None,
                })
                .unwrap()
            }
            "upload_transfer" => {
                let n = request["segment_number"].as_u64().unwrap() as u32;
                if self.fail_transfer_at == Some(n) {
                    return serde_json::to_value(TransferResponse {
                        return_code: ReturnCode {
                            code: "091117".into(),
                            text: "order rejected by scripted bank".into(),
                        },
                        segment: None,
                    })
                    .unwrap();
                }
                let session = &mut self.upload_session;
                assert_eq!(n, session.next_expected, "segments must arrive in order");
                assert_eq!(
                    request["last_segment"].as_bool().unwrap(),
                    n == session.total,
                    "last-segment flag must be set exactly on the final segment"
                );
                let segment = hex::decode(request["segment"].as_str().unwrap()).unwrap();
                assert!(segment.len() <= SEGMENT_SIZE);
                session.received.extend_from_slice(&segment);
                session.next_expected += 1;

                if n == session.total {
                    let key = session.key.as_ref().unwrap();
                    let payload = crypto::decompress(
                        &crypto::decrypt(&session.received, key).unwrap(),
                    )
                    .unwrap();
                    assert_eq!(crypto::digest(&payload).to_vec(), session.payload_digest);
                    assert!(!session.signature.is_empty());
                    self.upload_result = Some(payload);
                }
                serde_json::to_value(TransferResponse {
                    return_code: Self::ok_code(),
                    segment: None,
                })
                .unwrap()
            }
            "download_init" => {
                if self.no_data {
                    return serde_json::to_value(InitResponse {
                        return_code: ReturnCode {
                            code: "090005".into(),
                            text: "no download data available".into(),
                        },
                        transaction_id: Vec::new(),
                        segment_count: 0,
                        segment: None,
                        wrapped_key: None,
                    })
                    .unwrap();
                }
                serde_json::to_value(InitResponse {
                    return_code: Self::ok_code(),
                    transaction_id: b"TXDL0001".to_vec(),
                    segment_count: self.download_segments.len() as u32,
                    segment: Some(self.download_segments[0].clone()),
                    wrapped_key: Some(self.download_wrapped_key.clone()),
                })
                .unwrap()
            }
            "download_transfer" => {
                let n = request["segment_number"].as_u64().unwrap() as u32;
                serde_json::to_value(TransferResponse {
                    return_code: Self::ok_code(),
                    segment: Some(self.download_segments[(n - 1) as usize].clone()),
                })
                .unwrap()
            }
            "receipt" => {
                self.receipts
                    .push(request["receipt_code"].as_u64().unwrap() as u8);
                serde_json::to_value(ReturnCode {
                    code: "011000".into(),
                    text: "positive acknowledgement".into(),
                })
                .unwrap()
            }
            "ini" | "hia" | "spr" => serde_json::to_value(KeyManagementResponse {
                return_code: Self::ok_code(),
                wrapped_key: None,
                order_data: None,
            })
            .unwrap(),
            "hpb" => {
                let describe = |key: &RsaPrivateKey| {
                    let public = RsaPublicKey::from(key);
                    let mut value = pubkey_json(&public);
                    if self.send_certificates {
                        // A stand-in DER blob; the engine hashes it, it
                        // never parses it.
                        value["certificate"] =
                            Value::String(hex::encode([0x30, 0x82, 0x01, 0x0a]));
                    }
                    value
                };
                let order_data = to_bytes(json!({
                    "enc": describe(&self.enc_key),
                    "auth": describe(&self.auth_key),
                }));
                let key = TransactionKey::from_nonce(&[7u8; 16]);
                let encrypted =
                    crypto::encrypt(&crypto::compress(&order_data).unwrap(), &key).unwrap();
                let wrapped = crypto::wrap_key(
                    &key,
                    self.subscriber_encryption.as_ref().expect("subscriber keys"),
                )
                .unwrap();
                serde_json::to_value(KeyManagementResponse {
                    return_code: Self::ok_code(),
                    wrapped_key: Some(wrapped),
                    order_data: Some(encrypted),
                })
                .unwrap()
            }
            other => panic!("scripted bank got unknown request kind {other:?}"),
        }
    }
}

impl Transport for ScriptedBank {
    fn send(&mut self, request: &[u8]) -> std::io::Result<HttpResponse> {
        if let Some(status) = self.http_status {
            return Ok(HttpResponse {
                status,
                body: Vec::new(),
            });
        }
        let value: Value = serde_json::from_slice(request).unwrap();
        self.requests.borrow_mut().push(value.clone());
        let reply = self.handle(value);
        Ok(HttpResponse {
            status: 200,
            body: serde_json::to_vec(&reply).unwrap(),
        })
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[test]
fn upload_large_payload_in_multiple_segments() {
    init_logging();
    let subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    let bank = host.bank_record();
    let mut partner = Partner::new("PARTNER1", "HOSTXY");
    let builder = JsonEnvelopeBuilder;

    let payload = incompressible(2_500_000, 0xDEADBEEF);
    let order = Order::legacy("FUL").unwrap();

    let outcome = upload(
        &mut host, &builder, &subscriber, &mut partner, &bank, &order, &payload, true,
    )
    .unwrap();

    assert!(outcome.segment_count > 1);
    assert_eq!(outcome.order_number, 1);
    assert_eq!(outcome.order_id, "A001");
    assert_eq!(outcome.transaction_id, b"TXUP0001");
    // The scripted bank reassembled, decrypted and decompressed its copy.
    assert_eq!(host.upload_result.as_deref(), Some(&payload[..]));
    // Init plus one request per segment.
    assert_eq!(host.request_count(), 1 + outcome.segment_count as usize);
}

#[test]
fn upload_requires_signature_initialization() {
    let mut subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    let bank = host.bank_record();
    let mut partner = Partner::new("PARTNER1", "HOSTXY");
    // Same keys, but the INI handshake never happened.
    subscriber = Subscriber::restore(
        subscriber.user_id(),
        Some(subscriber.signature_key().unwrap().clone()),
        Some(subscriber.encryption_key().unwrap().clone()),
        Some(subscriber.authentication_key().unwrap().clone()),
        false,
        false,
    );

    let order = Order::legacy("FUL").unwrap();
    let result = upload(
        &mut host,
        &JsonEnvelopeBuilder,
        &subscriber,
        &mut partner,
        &bank,
        &order,
        b"payload",
        true,
    );
    assert!(matches!(result, Err(EbicsError::Sequence(_))));
    assert_eq!(host.request_count(), 0);
}

#[test]
fn upload_aborts_on_bank_rejection_mid_transfer() {
    let subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    host.fail_transfer_at = Some(2);
    let bank = host.bank_record();
    let mut partner = Partner::new("PARTNER1", "HOSTXY");

    let payload = incompressible(2_500_000, 0xFEED);
    let order = Order::legacy("FUL").unwrap();
    let result = upload(
        &mut host,
        &JsonEnvelopeBuilder,
        &subscriber,
        &mut partner,
        &bank,
        &order,
        &payload,
        true,
    );

    match result {
        Err(EbicsError::Protocol { code, .. }) => assert_eq!(code, "091117"),
        other => panic!("expected protocol error, got {other:?}"),
    }
    // Init, segment 1, rejected segment 2 — and nothing after the abort.
    assert_eq!(host.request_count(), 3);
    // The order number is consumed regardless; monotonicity over reuse.
    assert_eq!(partner.current_order_number(), 1);
}

#[test]
fn upload_aborts_on_transport_failure() {
    let subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    host.http_status = Some(500);
    let bank = host.bank_record();
    let mut partner = Partner::new("PARTNER1", "HOSTXY");

    let order = Order::legacy("FUL").unwrap();
    let result = upload(
        &mut host,
        &JsonEnvelopeBuilder,
        &subscriber,
        &mut partner,
        &bank,
        &order,
        b"payload",
        true,
    );
    match result {
        Err(EbicsError::Transport { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn consecutive_uploads_draw_increasing_order_numbers() {
    let subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    let bank = host.bank_record();
    let mut partner = Partner::new("PARTNER1", "HOSTXY");
    let builder = JsonEnvelopeBuilder;
    let order = Order::legacy("FUL").unwrap();

    let first = upload(
        &mut host, &builder, &subscriber, &mut partner, &bank, &order, b"first", true,
    )
    .unwrap();
    let second = upload(
        &mut host, &builder, &subscriber, &mut partner, &bank, &order, b"second", true,
    )
    .unwrap();
    assert_eq!(first.order_id, "A001");
    assert_eq!(second.order_id, "A002");
    assert!(second.order_number > first.order_number);
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

#[test]
fn download_reassembles_multi_segment_payload() {
    init_logging();
    let subscriber = initialized_subscriber();
    let payload = incompressible(2_000_000, 0xCAFE);
    let mut host = ScriptedBank::for_subscriber(&subscriber).with_download(&payload);
    assert!(host.download_segments.len() > 1);

    let order = Order::btf(BtfService::from_str("EOP::::camt.053:::").unwrap());
    let mut sink = Vec::new();
    let outcome = download(&mut host, &JsonEnvelopeBuilder, &subscriber, &order, &mut sink).unwrap();

    assert_eq!(sink, payload);
    assert_eq!(outcome.bytes_written, payload.len());
    assert_eq!(outcome.transaction_id, b"TXDL0001");
    assert_eq!(
        outcome.segment_count as usize,
        host.download_segments.len()
    );
    // The transaction was closed with a positive receipt.
    assert_eq!(host.receipts, vec![RECEIPT_POSITIVE]);
}

#[test]
fn download_with_no_data_touches_nothing() {
    let subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    host.no_data = true;

    let order = Order::legacy("STA").unwrap();
    let mut sink = Vec::new();
    let result = download(&mut host, &JsonEnvelopeBuilder, &subscriber, &order, &mut sink);

    assert!(matches!(result, Err(EbicsError::NoDataAvailable)));
    assert!(sink.is_empty());
    // One init request, no transfer phase, no receipt.
    assert_eq!(host.request_count(), 1);
    assert!(host.receipts.is_empty());
}

#[test]
fn download_requires_initialized_subscriber() {
    let subscriber = Subscriber::new("USER001");
    let mut host = ScriptedBank::new();
    let order = Order::legacy("STA").unwrap();
    let mut sink = Vec::new();
    let result = download(&mut host, &JsonEnvelopeBuilder, &subscriber, &order, &mut sink);
    assert!(matches!(result, Err(EbicsError::Sequence(_))));
    assert_eq!(host.request_count(), 0);
}

// ---------------------------------------------------------------------------
// Trust bootstrap
// ---------------------------------------------------------------------------

#[test]
fn ini_is_idempotent_after_success() {
    let mut subscriber = Subscriber::new("USER001");
    subscriber.set_signature_key(generate_keys());
    let mut host = ScriptedBank::new();
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", false);
    let builder = JsonEnvelopeBuilder;

    let mut bootstrap = TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H004,
    );
    bootstrap.submit_signature_key().unwrap();
    // The second call must not produce any network traffic.
    bootstrap.submit_signature_key().unwrap();

    assert!(subscriber.is_signature_initialized());
    assert_eq!(host.request_count(), 1);
}

#[test]
fn hia_sets_the_encryption_flag() {
    let mut subscriber = Subscriber::new("USER001");
    subscriber.set_encryption_key(generate_keys());
    subscriber.set_authentication_key(generate_keys());
    let mut host = ScriptedBank::new();
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", false);
    let builder = JsonEnvelopeBuilder;

    TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H004,
    )
    .submit_encryption_and_auth_keys()
    .unwrap();

    assert!(subscriber.is_encryption_initialized());
    assert!(!subscriber.is_signature_initialized());
}

#[test]
fn ini_without_a_key_is_a_sequence_error() {
    let mut subscriber = Subscriber::new("USER001");
    let mut host = ScriptedBank::new();
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", false);
    let builder = JsonEnvelopeBuilder;

    let result = TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H004,
    )
    .submit_signature_key();
    assert!(matches!(result, Err(EbicsError::Sequence(_))));
    assert_eq!(host.request_count(), 0);
}

#[test]
fn hpb_stores_the_bank_keys() {
    let mut subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", false);
    let builder = JsonEnvelopeBuilder;

    TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H004,
    )
    .retrieve_bank_keys()
    .unwrap();

    assert!(bank.has_keys());
    // The stored key digest matches a digest computed from the host's key.
    let expected = crypto::key_digest_raw(&RsaPublicKey::from(&host.enc_key));
    assert_eq!(bank.encryption_key().unwrap().key_digest(), expected);
}

#[test]
fn hpb_under_h005_demands_certificates() {
    let mut subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    // Configuration error: H005 mandates certificates, record says raw.
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", false);
    let builder = JsonEnvelopeBuilder;

    let result = TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H005,
    )
    .retrieve_bank_keys();

    assert!(matches!(result, Err(EbicsError::Sequence(_))));
    // Raised before any request went out.
    assert_eq!(host.request_count(), 0);
}

#[test]
fn hpb_with_certificates_stores_certificate_digests() {
    let mut subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    host.send_certificates = true;
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", true);
    let builder = JsonEnvelopeBuilder;

    TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H005,
    )
    .retrieve_bank_keys()
    .unwrap();

    assert!(bank.has_keys());
    assert!(bank.encryption_key().unwrap().is_certificate());
    // Certificate digests hash the DER bytes, not the modulus encoding.
    let der_digest = crypto::digest(&[0x30, 0x82, 0x01, 0x0a]);
    assert_eq!(bank.encryption_key().unwrap().key_digest(), der_digest);
}

#[test]
fn spr_leaves_local_flags_for_the_caller_to_discard() {
    let mut subscriber = initialized_subscriber();
    let mut host = ScriptedBank::for_subscriber(&subscriber);
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", false);
    let builder = JsonEnvelopeBuilder;

    TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H004,
    )
    .revoke_access()
    .unwrap();

    // Deliberately untouched; the record is expected to be discarded.
    assert!(subscriber.is_initialized());
    assert_eq!(host.request_count(), 1);
}

#[test]
fn spr_requires_an_initialized_subscriber() {
    let mut subscriber = Subscriber::new("USER001");
    subscriber.set_signature_key(generate_keys());
    let mut host = ScriptedBank::new();
    let mut bank = Bank::new("HOSTXY", "https://ebics.example.test/ebics", false);
    let builder = JsonEnvelopeBuilder;

    let result = TrustBootstrap::new(
        &mut host,
        &builder,
        &mut subscriber,
        &mut bank,
        EbicsVersion::H004,
    )
    .revoke_access();
    assert!(matches!(result, Err(EbicsError::Sequence(_))));
    assert_eq!(host.request_count(), 0);
}
