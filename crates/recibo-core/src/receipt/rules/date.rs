//! Document date extraction.
//!
//! Dates are kept as the matched text; they are not validated as calendar dates.

use regex::Regex;

use super::{primary_match, ExtractionMatch, FieldExtractor};

/// `DD/MM/YYYY` extractor. Keeps the last match.
#[derive(Debug, Clone)]
pub struct DateExtractor {
    pattern: Regex,
}

impl DateExtractor {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl FieldExtractor for DateExtractor {
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
