//! The download driving loop.

use std::io::Write;

use tracing::{debug, info, warn};

use crate::config::{RECEIPT_NEGATIVE, RECEIPT_POSITIVE};
use crate::crypto;
use crate::error::{EbicsError, Result};
use crate::order::Order;
use crate::session::Subscriber;
use crate::transport::{exchange, EnvelopeBuilder, Transport};

use super::{Reassembler, TransactionState};

/// What a completed download hands back to the caller.
#[derive(Debug)]
pub struct DownloadOutcome {
    /// The bank-assigned transaction id.
    pub transaction_id: Vec<u8>,
    /// How many segments the bank sent.
    pub segment_count: u32,
    /// Payload bytes written to the destination sink.
    pub bytes_written: usize,
}

/// Drive one complete download into `sink`.
///
/// The initialization response already carries the first segment, the
/// wrapped transaction key and the segment total; the loop then pulls the
/// remaining segments, reassembles, decrypts and decompresses, writes the
/// payload to the sink, and closes the transaction with a positive
/// receipt.
///
/// "No data available for the window" comes back as
/// [`EbicsError::NoDataAvailable`] with nothing written to the sink;
/// callers routinely treat it as an empty result and it is never logged
/// as an error here. A receipt failure after the payload is written is
/// reported with a warning but does not fail the download — the data is
/// already safe on the caller's side.
pub fn download(
    transport: &mut dyn Transport,
    builder: &dyn EnvelopeBuilder,
    subscriber: &Subscriber,
    order: &Order,
    sink: &mut dyn Write,
) -> Result<DownloadOutcome> {
    if !subscriber.is_initialized() {
        return Err(EbicsError::Sequence(
            "subscriber not initialized (INI and HIA must have completed)".into(),
        ));
    }

    let request = builder.build_download_init(order, order.date_range())?;
    let body = exchange(transport, &request)?;
    let response = builder.parse_init_response(&body)?;
    // NoDataAvailable surfaces here, before anything touches the sink.
    response.return_code.into_result()?;

    if response.transaction_id.is_empty() {
        return Err(EbicsError::Format(
            "initialization response carried no transaction id".into(),
        ));
    }
    let wrapped_key = response.wrapped_key.ok_or_else(|| {
        EbicsError::Format("download init response missing the wrapped transaction key".into())
    })?;
    let key = crypto::unwrap_key(&wrapped_key, subscriber.encryption_key()?)?;
    let first_segment = response.segment.ok_or_else(|| {
        EbicsError::Format("download init response missing the first segment".into())
    })?;

    let mut state = TransactionState::new(response.transaction_id, response.segment_count)?;
    let mut reassembler = Reassembler::new();

    // The init response delivered segment 1; account for it.
    state.next()?;
    reassembler.append(&first_segment);
    debug!(
        transaction = %hex::encode(state.transaction_id()),
        segments = state.total_segments(),
        "download transaction started"
    );

    while !state.is_done() {
        let index = state.next()?;
        let last = state.is_last_segment();
        let request = builder.build_download_transfer(state.transaction_id(), index, last)?;
        let body = exchange(transport, &request)?;
        let reply = builder.parse_transfer_response(&body)?;
        reply.return_code.into_result()?;
        let segment = reply.segment.ok_or_else(|| {
            EbicsError::Format(format!("transfer response missing segment {index}"))
        })?;
        reassembler.append(&segment);
        debug!(segment = index, last, "segment received");
    }

    let transaction_id = state.transaction_id().to_vec();
    let payload = match reassembler.finalize(&key) {
        Ok(payload) => payload,
        Err(e) => {
            // Tell the bank we could not process the data so it keeps the
            // download available; best effort, the real error wins.
            if let Err(receipt_err) =
                send_receipt(transport, builder, &transaction_id, RECEIPT_NEGATIVE)
            {
                debug!(error = %receipt_err, "negative receipt not delivered");
            }
            return Err(e);
        }
    };

    sink.write_all(&payload)
        .map_err(|e| EbicsError::Format(format!("destination sink write failed: {e}")))?;

    if let Err(e) = send_receipt(transport, builder, &transaction_id, RECEIPT_POSITIVE) {
        warn!(error = %e, "receipt not acknowledged; downloaded data already written");
    }

    info!(
        transaction = %hex::encode(&transaction_id),
        bytes = payload.len(),
        "download complete"
    );
    Ok(DownloadOutcome {
        transaction_id,
        segment_count: state.total_segments(),
        bytes_written: payload.len(),
    })
}

fn send_receipt(
    transport: &mut dyn Transport,
    builder: &dyn EnvelopeBuilder,
    transaction_id: &[u8],
    receipt_code: u8,
) -> Result<()> {
    let request = builder.build_receipt(transaction_id, receipt_code)?;
    let body = exchange(transport, &request)?;
    builder.parse_receipt_response(&body)?.into_result()
}
