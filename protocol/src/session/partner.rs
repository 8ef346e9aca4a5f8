//! The partner record: the business relationship and its order-number
//! sequence.

use serde::{Deserialize, Serialize};

use crate::config::ORDER_ID_ALPHABET;
use crate::error::{EbicsError, Result};

/// Number of distinct legacy order ids: one letter times three base-36
/// characters.
const ORDER_ID_SPACE: u64 = 26 * 36 * 36 * 36;

/// The subscriber's relationship to one bank, owning the monotonically
/// increasing order-number counter.
///
/// The counter is strictly increasing for the lifetime of the record and
/// must never be reused, *including across process restarts* — reusing an
/// order number is a replay violation at the protocol level. Callers
/// persist the record after every transfer and rebuild it with
/// [`Partner::restore`], which continues from the persisted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    partner_id: String,
    bank_id: String,
    order_counter: u64,
}

impl Partner {
    /// A fresh relationship with the counter at zero.
    pub fn new(partner_id: &str, bank_id: &str) -> Self {
        Partner {
            partner_id: partner_id.to_string(),
            bank_id: bank_id.to_string(),
            order_counter: 0,
        }
    }

    /// Rebuild from persisted state; the next order number continues
    /// strictly after `order_counter`.
    pub fn restore(partner_id: &str, bank_id: &str, order_counter: u64) -> Self {
        Partner {
            partner_id: partner_id.to_string(),
            bank_id: bank_id.to_string(),
            order_counter,
        }
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    pub fn bank_id(&self) -> &str {
        &self.bank_id
    }

    /// The last order number handed out.
    pub fn current_order_number(&self) -> u64 {
        self.order_counter
    }

    /// Advance the counter and return the next order number. Called by the
    /// upload path before building the initialization request.
    pub fn next_order_number(&mut self) -> u64 {
        self.order_counter += 1;
        self.order_counter
    }

    /// Jump the counter forward, e.g. when an operator wants to skip
    /// numbers already consumed out-of-band. Going backwards or standing
    /// still would permit reuse and is rejected.
    pub fn skip_to(&mut self, counter: u64) -> Result<()> {
        if counter <= self.order_counter {
            return Err(EbicsError::Sequence(format!(
                "order counter may only move forward (current {}, requested {counter})",
                self.order_counter
            )));
        }
        self.order_counter = counter;
        Ok(())
    }

    /// Encode an order number as a legacy 4-character order id:
    /// a letter `A`–`Z` followed by three base-36 characters, `A000`
    /// through `ZZZZ`.
    pub fn order_id(number: u64) -> Result<String> {
        if number == 0 || number >= ORDER_ID_SPACE {
            return Err(EbicsError::Sequence(format!(
                "order number {number} outside the legacy order-id space"
            )));
        }
        let letter = (b'A' + (number / (36 * 36 * 36)) as u8) as char;
        let mut rest = (number % (36 * 36 * 36)) as usize;
        let mut tail = ['0'; 3];
        for slot in tail.iter_mut().rev() {
            *slot = ORDER_ID_ALPHABET[rest % 36] as char;
            rest /= 36;
        }
        Ok(std::iter::once(letter).chain(tail).collect())
    }
}
