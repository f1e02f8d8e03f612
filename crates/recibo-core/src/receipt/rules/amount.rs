//! Amount extraction.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use super::{primary_match, ExtractionMatch, FieldExtractor};

/// Currency amount extractor. Keeps the last match, since receipts usually
/// restate the paid total near the end.
#[derive(Debug, Clone)]
pub struct AmountExtractor {
    pattern: Regex,
}

impl AmountExtractor {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Raw matched number strings, in scan order.
    fn raw_matches<'t>(&self, text: &'t str) -> impl Iterator<Item = regex::Match<'t>> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| primary_match(&caps))
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = Decimal;

    fn extract_all(&self, text: &str) -> Vec<ExtractionMatch<Decimal>> {
        self.raw_matches(text)
            .filter_map(|m| parse_amount(m.as_str()).map(|amount| ExtractionMatch::new(amount, m)))
            .collect()
    }

    /// The last match is parsed on its own; if it does not parse the amount
    /// is absent rather than falling back to an earlier match.
    fn select(&self, text: &str) -> Option<ExtractionMatch<Decimal>> {
        let last = self.raw_matches(text).last()?;
        parse_amount(last.as_str()).map(|amount| ExtractionMatch::new(amount, last))
    }
}

/// Parse a comma-grouped amount such as `"2,500.00"`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned = s.trim().replace(',', "");
    Decimal::from_str(&cleaned).ok()
}
