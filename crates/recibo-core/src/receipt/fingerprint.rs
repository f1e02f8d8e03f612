//! Metadata fingerprint over parsed fields and the upload filename.
//!
//! The filename is part of the digest so that re-uploads under another name
//! with similar text do not collapse onto an unrelated receipt.

use sha3::{Digest, Sha3_256};

use crate::models::receipt::ParsedFields;

/// Placeholder for an absent field in the canonical string.
pub const ABSENT: &str = "~";

/// Field separator in the canonical string.
pub const SEPARATOR: char = '|';

/// Hex length of a metadata fingerprint.
pub const METADATA_FINGERPRINT_HEX_LEN: usize = 64;

/// SHA3-256 over `bank|amount|document_date|filename`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataFingerprinter;

impl MetadataFingerprinter {
    pub fn new() -> Self {
        Self
    }

    /// The string that gets hashed. Amounts are rendered with two decimals;
    /// the reference code is not included.
    pub fn canonical(&self, fields: &ParsedFields, filename: &str) -> String {
        let amount = fields.amount.map(|a| format!("{:.2}", a));
        [
            fields.bank.as_deref().unwrap_or(ABSENT),
            amount.as_deref().unwrap_or(ABSENT),
            fields.document_date.as_deref().unwrap_or(ABSENT),
            filename,
        ]
        .join(&SEPARATOR.to_string())
    }

    /// Hex-encoded digest of [`Self::canonical`].
    pub fn fingerprint(&self, fields: &ParsedFields, filename: &str) -> String {
        let digest = Sha3_256::digest(self.canonical(fields, filename).as_bytes());
        hex::encode(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn fields() -> ParsedFields {
        ParsedFields {
            bank: Some("bbva".to_string()),
            amount: Some(Decimal::from_str("2500").unwrap()),
            document_date: Some("15/06/2023".to_string()),
            reference_code: Some("1234567890".to_string()),
        }
    }

    #[test]
    fn test_canonical_form() {
        let fp = MetadataFingerprinter::new();
        assert_eq!(fp.canonical(&fields(), "pago.jpg"), "bbva|2500.00|15/06/2023|pago.jpg");
        assert_eq!(fp.canonical(&ParsedFields::default(), "x.png"), "~|~|~|x.png");
    }

    #[test]
    fn test_fixed_length_hex() {
        let digest = MetadataFingerprinter::new().fingerprint(&fields(), "pago.jpg");
        assert_eq!(digest.len(), METADATA_FINGERPRINT_HEX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_filename_discriminates() {
        let fp = MetadataFingerprinter::new();
        assert_ne!(fp.fingerprint(&fields(), "a.jpg"), fp.fingerprint(&fields(), "b.jpg"));
    }

    #[test]
    fn test_reference_code_not_included() {
        let fp = MetadataFingerprinter::new();
        let mut other = fields();
        other.reference_code = Some("9999999999".to_string());
        assert_eq!(fp.fingerprint(&fields(), "a.jpg"), fp.fingerprint(&other, "a.jpg"));
    }

    #[test]
    fn test_amount_scale_is_normalised() {
        let fp = MetadataFingerprinter::new();
        let mut scaled = fields();
        scaled.amount = Some(Decimal::from_str("2500.000").unwrap());
        assert_eq!(fp.fingerprint(&fields(), "a.jpg"), fp.fingerprint(&scaled, "a.jpg"));
    }
}
