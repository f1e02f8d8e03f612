//! Receipt field extraction and metadata fingerprinting.

mod fingerprint;
mod parser;
pub mod rules;

pub use fingerprint::{MetadataFingerprinter, METADATA_FINGERPRINT_HEX_LEN};
pub use parser::FieldParser;
pub use rules::{CompiledRules, ExtractionMatch, ExtractionRules, FieldExtractor};
