//! The upload driving loop.

use tracing::{debug, info};

use crate::crypto::{self, TransactionKey};
use crate::error::{EbicsError, Result};
use crate::order::Order;
use crate::session::{Bank, Partner, Subscriber};
use crate::transport::{exchange, EnvelopeBuilder, Transport, UploadInit};

use super::{Segmenter, TransactionState};

/// What a completed upload hands back to the caller.
#[derive(Debug)]
pub struct UploadOutcome {
    /// The order number drawn from the Partner counter.
    pub order_number: u64,
    /// The legacy order id derived from it.
    pub order_id: String,
    /// The bank-assigned transaction id.
    pub transaction_id: Vec<u8>,
    /// How many segments were transferred.
    pub segment_count: u32,
}

/// Drive one complete upload.
///
/// The sequence: permission check, draw an order number, prepare the
/// segments and the cryptographic material, send the initialization
/// request, then push segments until the transaction state says done.
/// The final transfer acknowledgement completes the upload — uploads
/// have no receipt round trip.
///
/// The order number is consumed even if the transfer subsequently fails;
/// that is the monotonicity contract, not a bug. A replayed number is a
/// protocol violation, a skipped one is merely a gap.
#[allow(clippy::too_many_arguments)]
pub fn upload(
    transport: &mut dyn Transport,
    builder: &dyn EnvelopeBuilder,
    subscriber: &Subscriber,
    partner: &mut Partner,
    bank: &Bank,
    order: &Order,
    payload: &[u8],
    compress: bool,
) -> Result<UploadOutcome> {
    if !subscriber.is_signature_initialized() && !order.is_key_submission() {
        return Err(EbicsError::Sequence(
            "subscriber signature key not initialized; only key-submission orders allowed".into(),
        ));
    }

    let order_number = partner.next_order_number();
    let order_id = Partner::order_id(order_number)?;

    // All randomness of the transfer happens here, once.
    let nonce = crypto::generate_nonce()?;
    let key = TransactionKey::from_nonce(&nonce);

    let segmenter = Segmenter::prepare(payload, compress, &key)?;
    let payload_digest = crypto::digest(payload);
    let signature = crypto::sign(&payload_digest, subscriber.signature_key()?)?;
    let signature_data = builder.build_user_signature(&signature)?;
    let encrypted_signature_data = crypto::encrypt(
        &crypto::compress(&signature_data).map_err(|e| EbicsError::Format(e.to_string()))?,
        &key,
    )?;
    let wrapped_key = crypto::wrap_key(&key, bank.encryption_key()?.key())?;

    debug!(
        order_number,
        order_id = %order_id,
        segments = segmenter.segment_count(),
        "initializing upload transaction"
    );

    let init = UploadInit {
        order,
        order_number,
        order_id: order_id.clone(),
        segment_count: segmenter.segment_count(),
        payload_digest,
        encrypted_signature_data,
        wrapped_key,
    };
    let body = exchange(transport, &builder.build_upload_init(&init)?)?;
    let response = builder.parse_init_response(&body)?;
    response.return_code.into_result()?;
    if response.transaction_id.is_empty() {
        return Err(EbicsError::Format(
            "initialization response carried no transaction id".into(),
        ));
    }

    let mut state = TransactionState::new(response.transaction_id, segmenter.segment_count())?;
    while !state.is_done() {
        let index = state.next()?;
        let last = state.is_last_segment();
        let request = builder.build_upload_transfer(
            state.transaction_id(),
            index,
            last,
            segmenter.segment(index)?,
        )?;
        let body = exchange(transport, &request)?;
        builder.parse_transfer_response(&body)?.return_code.into_result()?;
        debug!(segment = index, last, "segment acknowledged");
    }

    info!(
        order_id = %order_id,
        transaction = %hex::encode(state.transaction_id()),
        segments = state.total_segments(),
        "upload complete"
    );
    Ok(UploadOutcome {
        order_number,
        order_id,
        transaction_id: state.transaction_id().to_vec(),
        segment_count: state.total_segments(),
    })
}
