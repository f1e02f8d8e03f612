//! Reference code extraction.

use regex::Regex;

use super::{primary_match, ExtractionMatch, FieldExtractor};

/// Alphanumeric operation reference. Keeps the last match.
///
/// The default pattern is case-sensitive. OCR output is lowercased before
/// parsing, so in practice only all-digit references survive the default rule.
#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    pattern: Regex,
}

impl ReferenceExtractor {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl FieldExtractor for ReferenceExtractor {
    type Output = String;

    fn extract_all(&self, text: &str) -> Vec<ExtractionMatch<String>> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| primary_match(&caps))
            .map(|m| ExtractionMatch::new(m.as_str().to_string(), m))
            .collect()
    }

    fn select(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.extract_all(text).pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::rules::DEFAULT_RULES;

    #[test]
    fn test_last_reference_wins() {
        let text = "ref AB12CD34EF folio 0099887766554";
        assert_eq!(DEFAULT_RULES.reference.select(text).unwrap().value, "0099887766554");
    }

    #[test]
    fn test_length_bounds() {
        assert!(DEFAULT_RULES.reference.select("ABC123456").is_none());
        assert!(DEFAULT_RULES.reference.select("A1B2C3D4E5F6G7H8I9J0K").is_none());
        assert!(DEFAULT_RULES.reference.select("A1B2C3D4E5").is_some());
    }

    #[test]
    fn test_lowercase_letters_do_not_match() {
        assert!(DEFAULT_RULES.reference.select("ab12cd34ef").is_none());
        assert_eq!(
            DEFAULT_RULES.reference.select("folio 1234567890").unwrap().value,
            "1234567890"
        );
    }
}
