//! In-memory duplicate index.
//!
//! Useful for tests and throwaway runs; everything is lost when the process
//! exits. The vacant-entry check inside [`DashMap::entry`] is the uniqueness
//! backstop for concurrent inserts of the same visual fingerprint.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{DuplicateIndex, DuplicateMatch};
use crate::error::StoreError;
use crate::models::receipt::{NewReceipt, ReceiptRecord};

struct Stored {
    seq: u64,
    record: ReceiptRecord,
}

/// DashMap-backed index keyed by visual fingerprint.
#[derive(Default)]
pub struct MemoryIndex {
    records: DashMap<String, Stored>,
    next_seq: AtomicU64,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DuplicateIndex for MemoryIndex {
    async fn find_duplicate(
        &self,
        visual_fingerprint: &str,
        metadata_fingerprint: &str,
    ) -> Result<Option<DuplicateMatch>, StoreError> {
        if let Some(stored) = self.records.get(visual_fingerprint) {
            return Ok(Some(DuplicateMatch::classify(stored.record.clone(), visual_fingerprint)));
        }

        let by_metadata = self
            .records
            .iter()
            .filter(|entry| entry.record.metadata_fingerprint == metadata_fingerprint)
            .min_by_key(|entry| entry.seq)
            .map(|entry| entry.record.clone());

        Ok(by_metadata.map(|record| DuplicateMatch::classify(record, visual_fingerprint)))
    }

    async fn insert(&self, receipt: NewReceipt) -> Result<ReceiptRecord, StoreError> {
        match self.records.entry(receipt.visual_fingerprint.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation(receipt.visual_fingerprint)),
            Entry::Vacant(slot) => {
                let record = receipt.into_record(Utc::now());
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                slot.insert(Stored {
                    seq,
                    record: record.clone(),
                });
                tracing::debug!(visual_fingerprint = %record.visual_fingerprint, "Stored receipt in memory");
                Ok(record)
            }
        }
    }

    async fn get(&self, visual_fingerprint: &str) -> Result<Option<ReceiptRecord>, StoreError> {
        Ok(self.records.get(visual_fingerprint).map(|s| s.record.clone()))
    }

    async fn list(&self, limit: usize) -> Result<Vec<ReceiptRecord>, StoreError> {
        let mut all: Vec<(u64, ReceiptRecord)> = self
            .records
            .iter()
            .map(|entry| (entry.seq, entry.record.clone()))
            .collect();
        all.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(all.into_iter().take(limit).map(|(_, r)| r).collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchedOn;
    use crate::models::receipt::ParsedFields;

    fn receipt(visual: &str, metadata: &str) -> NewReceipt {
        NewReceipt {
            visual_fingerprint: visual.to_string(),
            metadata_fingerprint: metadata.to_string(),
            fields: ParsedFields::default(),
            source_filename: format!("{}.jpg", visual),
        }
    }

    #[tokio::test]
    async fn test_insert_then_find_by_either_key() {
        let index = MemoryIndex::new();
        index.insert(receipt("aaaa", "m1")).await.unwrap();

        let by_visual = index.find_duplicate("aaaa", "zz").await.unwrap().unwrap();
        assert_eq!(by_visual.matched_on, MatchedOn::Visual);

        let by_metadata = index.find_duplicate("bbbb", "m1").await.unwrap().unwrap();
        assert_eq!(by_metadata.matched_on, MatchedOn::Metadata);
        assert_eq!(by_metadata.record.visual_fingerprint, "aaaa");

        assert!(index.find_duplicate("bbbb", "m2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_violation() {
        let index = MemoryIndex::new();
        index.insert(receipt("aaaa", "m1")).await.unwrap();
        let err = index.insert(receipt("aaaa", "m2")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(fp) if fp == "aaaa"));
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_metadata_is_not_unique() {
        let index = MemoryIndex::new();
        index.insert(receipt("aaaa", "same")).await.unwrap();
        index.insert(receipt("bbbb", "same")).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let index = MemoryIndex::new();
        for fp in ["a1", "a2", "a3"] {
            index.insert(receipt(fp, fp)).await.unwrap();
        }
        let listed: Vec<String> = index
            .list(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.visual_fingerprint)
            .collect();
        assert_eq!(listed, ["a3", "a2"]);
    }
}
