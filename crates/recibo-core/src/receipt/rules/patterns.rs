//! Default patterns for receipt field extraction.

use lazy_static::lazy_static;

use super::{CompiledRules, ExtractionRules};

/// Banks recognised out of the box.
pub const DEFAULT_BANKS: &[&str] = &[
    "banco",
    "bancamiga",
    "banamex",
    "bbva",
    "santander",
    "hsbc",
    "banorte",
    "scotiabank",
    "banregio",
    "banbajio",
    "inbursa",
    "azteca",
    "bancoppel",
];

/// `$` amount with comma thousands and exactly two decimals.
pub const AMOUNT: &str = r"\$\s*(\d{1,3}(?:,\d{3})*\.\d{2})";

/// `DD/MM/YYYY`.
pub const DOCUMENT_DATE: &str = r"\b(\d{2}/\d{2}/\d{4})\b";

/// 10-20 uppercase letters and digits.
pub const REFERENCE_CODE: &str = r"\b([A-Z0-9]{10,20})\b";

lazy_static! {
    /// The default rule table, compiled once.
    pub static ref DEFAULT_RULES: CompiledRules = ExtractionRules::default()
        .compile()
        .expect("default extraction rules must compile");
}
