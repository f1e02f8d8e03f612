//! Receipt records as persisted by the duplicate index.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Structured fields pulled out of OCR text.
///
/// Every field is optional; an unreadable receipt yields all `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFields {
    /// Lowercase bank token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,

    /// Last currency-formatted amount in the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// Last `DD/MM/YYYY` date in the text, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_date: Option<String>,

    /// Last 10-20 character alphanumeric reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,
}

impl ParsedFields {
    /// True when no rule matched.
    pub fn is_empty(&self) -> bool {
        self.bank.is_none()
            && self.amount.is_none()
            && self.document_date.is_none()
            && self.reference_code.is_none()
    }
}

/// A receipt ready to be inserted. The store assigns `registered_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceipt {
    pub visual_fingerprint: String,
    pub metadata_fingerprint: String,
    pub fields: ParsedFields,
    pub source_filename: String,
}

impl NewReceipt {
    /// Attach the store-assigned timestamp.
    pub fn into_record(self, registered_at: DateTime<Utc>) -> ReceiptRecord {
        ReceiptRecord {
            visual_fingerprint: self.visual_fingerprint,
            metadata_fingerprint: self.metadata_fingerprint,
            registered_at,
            bank: self.fields.bank,
            amount: self.fields.amount,
            document_date: self.fields.document_date,
            reference_code: self.fields.reference_code,
            source_filename: self.source_filename,
        }
    }
}

/// A registered receipt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Perceptual hash of the pixel content, 16 hex chars. Primary key.
    pub visual_fingerprint: String,

    /// Digest of the parsed fields and filename, 64 hex chars.
    pub metadata_fingerprint: String,

    /// Insert time, assigned by the store.
    pub registered_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,

    /// Filename supplied at upload time.
    pub source_filename: String,
}

impl ReceiptRecord {
    /// The parsed fields stored with this record.
    pub fn fields(&self) -> ParsedFields {
        ParsedFields {
            bank: self.bank.clone(),
            amount: self.amount,
            document_date: self.document_date.clone(),
            reference_code: self.reference_code.clone(),
        }
    }
}

/// Fingerprints and fields computed for a submission without registering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub visual_fingerprint: String,
    pub metadata_fingerprint: String,
    pub fields: ParsedFields,
    pub source_filename: String,
    /// Length of the OCR text, 0 when extraction degraded.
    pub text_length: usize,
}

impl From<Analysis> for NewReceipt {
    fn from(analysis: Analysis) -> Self {
        Self {
            visual_fingerprint: analysis.visual_fingerprint,
            metadata_fingerprint: analysis.metadata_fingerprint,
            fields: analysis.fields,
            source_filename: analysis.source_filename,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_into_record_keeps_fields() {
        let new = NewReceipt {
            visual_fingerprint: "c3c3c3c3c3c3c3c3".to_string(),
            metadata_fingerprint: "ab".repeat(32),
            fields: ParsedFields {
                bank: Some("bbva".to_string()),
                amount: Some(Decimal::from_str("2500.00").unwrap()),
                document_date: Some("15/06/2023".to_string()),
                reference_code: None,
            },
            source_filename: "pago.jpg".to_string(),
        };

        let now = Utc::now();
        let record = new.clone().into_record(now);

        assert_eq!(record.registered_at, now);
        assert_eq!(record.fields(), new.fields);
        assert_eq!(record.source_filename, "pago.jpg");
    }

    #[test]
    fn test_absent_fields_are_omitted_from_json() {
        let record = NewReceipt {
            visual_fingerprint: "0000000000000000".to_string(),
            metadata_fingerprint: "00".repeat(32),
            fields: ParsedFields::default(),
            source_filename: "blank.png".to_string(),
        }
        .into_record(Utc::now());

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("bank").is_none());
        assert!(json.get("amount").is_none());
        assert_eq!(json["source_filename"], "blank.png");
    }
}
