//! BTF service descriptors (H005).
//!
//! EBICS 3.0 dropped the two-and-three-letter order-type zoo in favor of a
//! structured descriptor naming the service and message precisely. The
//! conventional flat notation is a colon-delimited string with fixed
//! positions:
//!
//! ```text
//! NAME:[OPTION]:[SCOPE]:[CONTAINER]:MSGNAME:[VARIANT]:[VERSION]:[FORMAT]
//! ```
//!
//! `NAME` is exactly 3 alphanumerics, `MSGNAME` is required, `CONTAINER`
//! is one of `ZIP`, `XML`, `SVC`, and every bracketed field may be empty.
//! `SCT::SEPA:ZIP:pain.001::03:` therefore reads: SEPA credit transfer,
//! zip container, pain.001 version 03.
//!
//! A string that does not match the grammar fails at parse time; nothing
//! malformed ever reaches the envelope builder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EbicsError;

/// The container kind a BTF message travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BtfContainer {
    Zip,
    Xml,
    Svc,
}

impl BtfContainer {
    /// The wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            BtfContainer::Zip => "ZIP",
            BtfContainer::Xml => "XML",
            BtfContainer::Svc => "SVC",
        }
    }
}

impl FromStr for BtfContainer {
    type Err = EbicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ZIP" => Ok(BtfContainer::Zip),
            "XML" => Ok(BtfContainer::Xml),
            "SVC" => Ok(BtfContainer::Svc),
            other => Err(EbicsError::Validation(format!(
                "unknown BTF container {other:?}, expected ZIP, XML or SVC"
            ))),
        }
    }
}

/// A structured BTF service descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtfService {
    /// Service name, exactly 3 alphanumerics, e.g. `SCT`.
    pub service_name: String,
    /// Service option/qualifier, e.g. `URG`.
    pub service_option: Option<String>,
    /// Service scope, e.g. `SEPA` or a country code.
    pub scope: Option<String>,
    /// Container kind, when the message travels in one.
    pub container: Option<BtfContainer>,
    /// Message name, e.g. `pain.001`.
    pub message_name: String,
    /// Message variant, e.g. `001`.
    pub message_variant: Option<String>,
    /// Message version, e.g. `03`.
    pub message_version: Option<String>,
    /// Message format, e.g. `XML`.
    pub message_format: Option<String>,
}

impl BtfService {
    /// Build a minimal descriptor from the two required fields.
    pub fn new(service_name: &str, message_name: &str) -> Result<Self, EbicsError> {
        validate_service_name(service_name)?;
        validate_message_name(message_name)?;
        Ok(BtfService {
            service_name: service_name.to_string(),
            service_option: None,
            scope: None,
            container: None,
            message_name: message_name.to_string(),
            message_variant: None,
            message_version: None,
            message_format: None,
        })
    }
}

fn validate_service_name(name: &str) -> Result<(), EbicsError> {
    if name.len() != 3 || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(EbicsError::Validation(format!(
            "BTF service name must be 3 alphanumeric characters, got {name:?}"
        )));
    }
    Ok(())
}

fn validate_message_name(name: &str) -> Result<(), EbicsError> {
    if name.is_empty() {
        return Err(EbicsError::Validation(
            "BTF message name must not be empty".into(),
        ));
    }
    Ok(())
}

fn optional(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

impl FromStr for BtfService {
    type Err = EbicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() != 8 {
            return Err(EbicsError::Validation(format!(
                "BTF string must have 8 colon-separated fields, got {} in {s:?}",
                fields.len()
            )));
        }
        validate_service_name(fields[0])?;
        validate_message_name(fields[4])?;
        let container = match fields[3] {
            "" => None,
            spec => Some(spec.parse()?),
        };
        Ok(BtfService {
            service_name: fields[0].to_string(),
            service_option: optional(fields[1]),
            scope: optional(fields[2]),
            container,
            message_name: fields[4].to_string(),
            message_variant: optional(fields[5]),
            message_version: optional(fields[6]),
            message_format: optional(fields[7]),
        })
    }
}

impl fmt::Display for BtfService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |o: &Option<String>| o.clone().unwrap_or_default();
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.service_name,
            opt(&self.service_option),
            opt(&self.scope),
            self.container.map(|c| c.as_str()).unwrap_or_default(),
            self.message_name,
            opt(&self.message_variant),
            opt(&self.message_version),
            opt(&self.message_format),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_descriptor() {
        let svc: BtfService = "SCT:URG:SEPA:ZIP:pain.001:001:03:XML".parse().unwrap();
        assert_eq!(svc.service_name, "SCT");
        assert_eq!(svc.service_option.as_deref(), Some("URG"));
        assert_eq!(svc.scope.as_deref(), Some("SEPA"));
        assert_eq!(svc.container, Some(BtfContainer::Zip));
        assert_eq!(svc.message_name, "pain.001");
        assert_eq!(svc.message_variant.as_deref(), Some("001"));
        assert_eq!(svc.message_version.as_deref(), Some("03"));
        assert_eq!(svc.message_format.as_deref(), Some("XML"));
    }

    #[test]
    fn parses_minimal_descriptor() {
        let svc: BtfService = "EOP::::camt.053:::".parse().unwrap();
        assert_eq!(svc.service_name, "EOP");
        assert_eq!(svc.message_name, "camt.053");
        assert!(svc.service_option.is_none());
        assert!(svc.container.is_none());
        assert!(svc.message_format.is_none());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!("SCT:SEPA:pain.001".parse::<BtfService>().is_err());
        assert!("SCT::::pain.001::03::extra".parse::<BtfService>().is_err());
    }

    #[test]
    fn rejects_bad_service_name() {
        assert!("TOOLONG::::pain.001:::".parse::<BtfService>().is_err());
        assert!("S!:::ZIP:pain.001:::".parse::<BtfService>().is_err());
        assert!("::::pain.001:::".parse::<BtfService>().is_err());
    }

    #[test]
    fn rejects_missing_message_name() {
        assert!("SCT:::ZIP::::".parse::<BtfService>().is_err());
    }

    #[test]
    fn rejects_unknown_container() {
        assert!("SCT:::TAR:pain.001:::".parse::<BtfService>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let text = "SCT::SEPA:ZIP:pain.001::03:";
        let svc: BtfService = text.parse().unwrap();
        assert_eq!(svc.to_string(), text);
    }
}
