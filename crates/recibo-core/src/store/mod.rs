//! Duplicate index: persistent store of registered receipts.
//!
//! - Lookup by visual fingerprint (primary key) or metadata fingerprint (indexed)
//! - Insert-only; records are never updated or deleted
//! - A uniqueness violation on the visual fingerprint surfaces as
//!   [`StoreError::UniqueViolation`] so the registrar can report races

pub mod memory;
pub mod sqlite;

pub use memory::MemoryIndex;
pub use sqlite::SqliteIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MatchedOn, StoreError};
use crate::models::receipt::{NewReceipt, ReceiptRecord};

/// An existing record that matches a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub matched_on: MatchedOn,
    pub record: ReceiptRecord,
}

impl DuplicateMatch {
    /// Classify `record` against the submitted visual fingerprint.
    pub fn classify(record: ReceiptRecord, visual_fingerprint: &str) -> Self {
        let matched_on = if record.visual_fingerprint == visual_fingerprint {
            MatchedOn::Visual
        } else {
            MatchedOn::Metadata
        };
        Self { matched_on, record }
    }
}

/// Storage backend for registered receipts.
#[async_trait]
pub trait DuplicateIndex: Send + Sync {
    /// Any record whose visual **or** metadata fingerprint equals the given
    /// ones. Visual matches take precedence.
    async fn find_duplicate(
        &self,
        visual_fingerprint: &str,
        metadata_fingerprint: &str,
    ) -> Result<Option<DuplicateMatch>, StoreError>;

    /// Insert a new record, assigning its timestamp.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if the visual fingerprint
    /// is already present.
    async fn insert(&self, receipt: NewReceipt) -> Result<ReceiptRecord, StoreError>;

    /// Look up a record by visual fingerprint.
    async fn get(&self, visual_fingerprint: &str) -> Result<Option<ReceiptRecord>, StoreError>;

    /// Newest records first.
    async fn list(&self, limit: usize) -> Result<Vec<ReceiptRecord>, StoreError>;

    /// Number of registered records.
    async fn count(&self) -> Result<u64, StoreError>;
}
