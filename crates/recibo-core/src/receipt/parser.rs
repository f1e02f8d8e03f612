//! Applies the rule table to OCR text.

use std::sync::Arc;

use tracing::debug;

use crate::error::ConfigError;
use crate::models::receipt::ParsedFields;

use super::rules::{CompiledRules, ExtractionRules, FieldExtractor, DEFAULT_RULES};

/// Pulls structured fields out of receipt text. Never fails; a field with no
/// match is left absent.
#[derive(Debug, Clone)]
pub struct FieldParser {
    rules: Arc<CompiledRules>,
}

impl FieldParser {
    /// Parser using the built-in rule table.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DEFAULT_RULES.clone()),
        }
    }

    /// Parser using a custom rule table.
    pub fn with_rules(rules: &ExtractionRules) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: Arc::new(rules.compile()?),
        })
    }

    pub fn parse(&self, text: &str) -> ParsedFields {
        let fields = ParsedFields {
            bank: self.rules.bank.select(text).map(|m| m.value),
            amount: self.rules.amount.select(text).map(|m| m.value),
            document_date: self.rules.date.select(text).map(|m| m.value),
            reference_code: self.rules.reference.select(text).map(|m| m.value),
        };

        debug!(
            bank = ?fields.bank,
            amount = ?fields.amount,
            document_date = ?fields.document_date,
            reference_code = ?fields.reference_code,
            "Parsed receipt fields"
        );

        fields
    }
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_parse_full_receipt() {
        let text = r#"
            banco azteca
            comprobante de transferencia
            fecha: 01/01/2023
            importe $1,000.00
            fecha aplicación: 15/06/2023
            total pagado $2,500.00
            folio 20230615123456
        "#;

        let fields = FieldParser::new().parse(text);

        assert_eq!(
            fields,
            ParsedFields {
                bank: Some("banco".to_string()),
                amount: Some(Decimal::from_str("2500.00").unwrap()),
                document_date: Some("15/06/2023".to_string()),
                reference_code: Some("20230615123456".to_string()),
            }
        );
    }

    #[test]
    fn test_empty_text_yields_absent_fields() {
        let fields = FieldParser::new().parse("");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_noise_yields_absent_fields() {
        let fields = FieldParser::new().parse("~~ ,,, $ .. // 12/3/45 abc");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_custom_rules() {
        let rules = ExtractionRules {
            banks: vec!["nubank".to_string(), "itau".to_string()],
            ..ExtractionRules::default()
        };
        let parser = FieldParser::with_rules(&rules).unwrap();

        assert_eq!(parser.parse("pix nubank $150.00").bank.as_deref(), Some("nubank"));
        assert_eq!(parser.parse("banco santander").bank, None);
    }
}
