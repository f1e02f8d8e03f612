//! Rule-based field extractors for payment receipts.
//!
//! Rules are compiled from an [`ExtractionRules`] table so the bank list and
//! patterns can be swapped per deployment or locale.

pub mod amount;
pub mod bank;
pub mod date;
pub mod patterns;
pub mod reference;

pub use amount::AmountExtractor;
pub use bank::BankExtractor;
pub use date::DateExtractor;
pub use patterns::{DEFAULT_BANKS, DEFAULT_RULES};
pub use reference::ReferenceExtractor;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// All matches in scan order.
    fn extract_all(&self, text: &str) -> Vec<ExtractionMatch<Self::Output>>;

    /// The match this field keeps when the text holds several.
    fn select(&self, text: &str) -> Option<ExtractionMatch<Self::Output>>;
}

/// A matched value with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte span in the source text.
    pub position: (usize, usize),
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, m: regex::Match<'_>) -> Self {
        Self {
            value,
            position: (m.start(), m.end()),
            source: m.as_str().to_string(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionMatch<U> {
        ExtractionMatch {
            value: f(self.value),
            position: self.position,
            source: self.source,
        }
    }
}

/// Serializable rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// Known bank name tokens, matched case-insensitively on word boundaries.
    pub banks: Vec<String>,
    /// Currency amount; capture group 1 holds the number.
    pub amount_pattern: String,
    /// Document date; capture group 1 holds the date text.
    pub date_pattern: String,
    /// Reference code; capture group 1 holds the code.
    pub reference_pattern: String,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            banks: DEFAULT_BANKS.iter().map(|b| b.to_string()).collect(),
            amount_pattern: patterns::AMOUNT.to_string(),
            date_pattern: patterns::DOCUMENT_DATE.to_string(),
            reference_pattern: patterns::REFERENCE_CODE.to_string(),
        }
    }
}

impl ExtractionRules {
    /// Compile every rule.
    pub fn compile(&self) -> Result<CompiledRules, ConfigError> {
        Ok(CompiledRules {
            bank: BankExtractor::new(&self.banks)?,
            amount: AmountExtractor::new(compile_pattern("amount", &self.amount_pattern)?),
            date: DateExtractor::new(compile_pattern("date", &self.date_pattern)?),
            reference: ReferenceExtractor::new(compile_pattern("reference", &self.reference_pattern)?),
        })
    }
}

/// Compiled rule table, ready for [`crate::receipt::FieldParser`].
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub bank: BankExtractor,
    pub amount: AmountExtractor,
    pub date: DateExtractor,
    pub reference: ReferenceExtractor,
}

pub(crate) fn compile_pattern(rule: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        rule,
        reason: e.to_string(),
    })
}

/// Value of capture group 1, or the whole match when the pattern has no group.
pub(crate) fn primary_match<'t>(caps: &regex::Captures<'t>) -> Option<regex::Match<'t>> {
    caps.get(1).or_else(|| caps.get(0))
}
