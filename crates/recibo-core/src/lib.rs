//! Core library for duplicate detection of payment receipt images.
//!
//! This crate provides:
//! - Image decoding with size limits
//! - DCT perceptual hashing (visual fingerprint)
//! - Best-effort OCR with pluggable backends (ONNX, Tesseract)
//! - Receipt field extraction (bank, amount, date, reference code)
//! - Metadata fingerprinting over the extracted fields
//! - A duplicate index (SQLite or in-memory) and the registration workflow

pub mod error;
pub mod imaging;
pub mod models;
pub mod ocr;
pub mod receipt;
pub mod registrar;
pub mod store;

pub use error::{MatchedOn, RegistrationError, ReciboError, Result};
pub use imaging::{ImageDecoder, PerceptualHasher, VisualFingerprint};
pub use models::config::ReciboConfig;
pub use models::receipt::{Analysis, NewReceipt, ParsedFields, ReceiptRecord};
pub use ocr::{TextExtractor, TextRecognizer};
pub use receipt::{FieldParser, MetadataFingerprinter};
pub use registrar::{ReceiptRegistrar, default_filename};
pub use store::{DuplicateIndex, DuplicateMatch, MemoryIndex, SqliteIndex};
