//! Data models and configuration.

pub mod config;
pub mod receipt;

pub use config::{ImageConfig, OcrBackendKind, OcrConfig, ReciboConfig, StoreConfig};
pub use receipt::{Analysis, NewReceipt, ParsedFields, ReceiptRecord};
