//! # Order Model
//!
//! What is being asked of the bank. An order is either one of the closed
//! set of administrative operations (key management and read-only admin
//! queries) or a business order: a short fixed code under the legacy
//! revisions, or a BTF service descriptor under H005.
//!
//! Orders are immutable once constructed. All grammar and shape checks
//! happen at construction time and fail with a validation error — a
//! malformed descriptor must never get as far as the wire.

mod btf;

pub use btf::{BtfContainer, BtfService};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EbicsError, Result};

// ---------------------------------------------------------------------------
// Administrative orders
// ---------------------------------------------------------------------------

/// The closed set of administrative order kinds.
///
/// The first four manage the key lifecycle; the rest are read-only queries
/// whose response payloads are opaque bytes to this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminOrderType {
    /// Submit the subscriber's bank-technical signature key.
    Ini,
    /// Submit the subscriber's encryption and authentication keys.
    Hia,
    /// Retrieve the bank's public keys.
    Hpb,
    /// Revoke the subscriber's access.
    Spr,
    /// Retrieve the order types the subscriber may use.
    Haa,
    /// Retrieve the bank's parameters.
    Hpd,
    /// Retrieve customer and subscriber data known to the bank.
    Htd,
    /// Retrieve subscriber and bank key information.
    Hkd,
}

impl AdminOrderType {
    /// The wire code of this order kind.
    pub fn code(&self) -> &'static str {
        match self {
            AdminOrderType::Ini => "INI",
            AdminOrderType::Hia => "HIA",
            AdminOrderType::Hpb => "HPB",
            AdminOrderType::Spr => "SPR",
            AdminOrderType::Haa => "HAA",
            AdminOrderType::Hpd => "HPD",
            AdminOrderType::Htd => "HTD",
            AdminOrderType::Hkd => "HKD",
        }
    }
}

// ---------------------------------------------------------------------------
// Order kind
// ---------------------------------------------------------------------------

/// The three mutually exclusive ways of naming a bank-side operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// A fixed administrative order.
    Admin(AdminOrderType),
    /// A legacy business order type: exactly three ASCII alphanumerics,
    /// e.g. `FUL`, `CDD`, `C52`.
    Legacy(String),
    /// A structured BTF service descriptor (H005).
    Btf(BtfService),
}

/// An inclusive date window restricting a download to documents the bank
/// produced within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(EbicsError::Validation(format!(
                "date range end {end} precedes start {start}"
            )));
        }
        Ok(DateRange { start, end })
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A fully described, immutable order: the operation plus its transfer
/// parameters.
///
/// The parameter map carries flag-style options the envelope builder
/// understands (e.g. `TEST`, `EBCDIC`); the engine itself never interprets
/// them. The date range only makes sense for downloads and is ignored by
/// upload builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    kind: OrderKind,
    params: BTreeMap<String, String>,
    date_range: Option<DateRange>,
}

impl Order {
    /// An administrative order.
    pub fn admin(kind: AdminOrderType) -> Self {
        Order {
            kind: OrderKind::Admin(kind),
            params: BTreeMap::new(),
            date_range: None,
        }
    }

    /// A legacy business order. The code must be exactly three ASCII
    /// alphanumerics; anything else is a construction-time error.
    pub fn legacy(code: &str) -> Result<Self> {
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(EbicsError::Validation(format!(
                "legacy order type must be 3 alphanumeric characters, got {code:?}"
            )));
        }
        Ok(Order {
            kind: OrderKind::Legacy(code.to_ascii_uppercase()),
            params: BTreeMap::new(),
            date_range: None,
        })
    }

    /// A BTF business order.
    pub fn btf(service: BtfService) -> Self {
        Order {
            kind: OrderKind::Btf(service),
            params: BTreeMap::new(),
            date_range: None,
        }
    }

    /// Attach a key-value parameter.
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Restrict a download to a date window.
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn kind(&self) -> &OrderKind {
        &self.kind
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    /// `true` for the key-submission orders, which are the only uploads a
    /// not-yet-initialized subscriber may send.
    pub fn is_key_submission(&self) -> bool {
        matches!(
            self.kind,
            OrderKind::Admin(AdminOrderType::Ini) | OrderKind::Admin(AdminOrderType::Hia)
        )
    }
}
