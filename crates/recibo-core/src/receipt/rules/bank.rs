//! Issuing bank extraction.

use regex::Regex;

use super::{compile_pattern, ExtractionMatch, FieldExtractor};
use crate::error::ConfigError;

/// Matches a fixed list of bank tokens. Keeps the first match.
#[derive(Debug, Clone)]
pub struct BankExtractor {
    pattern: Regex,
}

impl BankExtractor {
    /// Build a case-insensitive, word-bounded alternation over `banks`.
    pub fn new<S: AsRef<str>>(banks: &[S]) -> Result<Self, ConfigError> {
        let tokens: Vec<String> = banks
            .iter()
            .map(|b| b.as_ref().trim())
            .filter(|b| !b.is_empty())
            .map(regex::escape)
            .collect();

        if tokens.is_empty() {
            return Err(ConfigError::EmptyBankList);
        }

        let pattern = format!(r"(?i)\b(?:{})\b", tokens.join("|"));
        Ok(Self {
            pattern: compile_pattern("bank", &pattern)?,
        })
    }
}

impl FieldExtractor for BankExtractor {
    type Output = String;

    fn extract_all(&self, text: &str) -> Vec<ExtractionMatch<String>> {
        self.pattern
            .find_iter(text)
            .map(|m| ExtractionMatch::new(m.as_str().to_lowercase(), m))
            .collect()
    }

    fn select(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.pattern
            .find(text)
            .map(|m| ExtractionMatch::new(m.as_str().to_lowercase(), m))
    }
}
