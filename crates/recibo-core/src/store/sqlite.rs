//! SQLite implementation of the duplicate index.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use super::{DuplicateIndex, DuplicateMatch};
use crate::error::StoreError;
use crate::models::receipt::{NewReceipt, ReceiptRecord};

const SELECT_COLUMNS: &str = "visual_fingerprint, metadata_fingerprint, registered_at, bank, amount, \
     document_date, reference_code, source_filename";

/// SQLite-backed duplicate index.
///
/// Open it once at startup, share it (it is cheap to clone), and call
/// [`SqliteIndex::close`] at shutdown.
#[derive(Clone)]
pub struct SqliteIndex {
    pool: SqlitePool,
}

/// Row type for database queries.
#[derive(FromRow)]
struct ReceiptRow {
    visual_fingerprint: String,
    metadata_fingerprint: String,
    registered_at: NaiveDateTime,
    bank: Option<String>,
    amount: Option<f64>,
    document_date: Option<String>,
    reference_code: Option<String>,
    source_filename: String,
}

impl TryFrom<ReceiptRow> for ReceiptRecord {
    type Error = StoreError;

    fn try_from(row: ReceiptRow) -> Result<Self, Self::Error> {
        let amount = row
            .amount
            .map(|value| {
                Decimal::from_f64(value)
                    .map(|d| {
                        let mut amount = d.round_dp(2);
                        amount.rescale(2);
                        amount
                    })
                    .ok_or_else(|| StoreError::Corrupt(format!("amount {} is not representable", value)))
            })
            .transpose()?;

        Ok(Self {
            visual_fingerprint: row.visual_fingerprint,
            metadata_fingerprint: row.metadata_fingerprint,
            registered_at: row.registered_at.and_utc(),
            bank: row.bank,
            amount,
            document_date: row.document_date,
            reference_code: row.reference_code,
            source_filename: row.source_filename,
        })
    }
}

impl SqliteIndex {
    /// Connect to `database_url`, creating the file if missing, and run migrations.
    pub async fn open(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let index = Self { pool };
        index.migrate().await?;

        tracing::info!(database_url, "Duplicate index connected and migrations applied");

        Ok(index)
    }

    /// A private in-memory database. A single connection is kept alive for the
    /// lifetime of the pool, since the database disappears with it.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let index = Self { pool };
        index.migrate().await?;
        Ok(index)
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Duplicate index closed");
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        key: &str,
    ) -> Result<Option<ReceiptRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM receipts WHERE {} ORDER BY registered_at ASC, rowid ASC LIMIT 1",
            SELECT_COLUMNS, clause
        );
        let row: Option<ReceiptRow> = sqlx::query_as(&sql).bind(key).fetch_optional(&self.pool).await?;
        row.map(ReceiptRecord::try_from).transpose()
    }
}

#[async_trait]
impl DuplicateIndex for SqliteIndex {
    async fn find_duplicate(
        &self,
        visual_fingerprint: &str,
        metadata_fingerprint: &str,
    ) -> Result<Option<DuplicateMatch>, StoreError> {
        if let Some(record) = self.fetch_one_where("visual_fingerprint = ?", visual_fingerprint).await? {
            return Ok(Some(DuplicateMatch::classify(record, visual_fingerprint)));
        }

        let by_metadata = self
            .fetch_one_where("metadata_fingerprint = ?", metadata_fingerprint)
            .await?;

        Ok(by_metadata.map(|record| DuplicateMatch::classify(record, visual_fingerprint)))
    }

    async fn insert(&self, receipt: NewReceipt) -> Result<ReceiptRecord, StoreError> {
        let amount = receipt.fields.amount.and_then(|a| a.to_f64());

        let inserted = sqlx::query_scalar::<_, NaiveDateTime>(
            r#"
            INSERT INTO receipts (
                visual_fingerprint, metadata_fingerprint, registered_at,
                bank, amount, document_date, reference_code, source_filename
            )
            VALUES (?, ?, strftime('%Y-%m-%d %H:%M:%f', 'now'), ?, ?, ?, ?, ?)
            RETURNING registered_at
            "#,
        )
        .bind(&receipt.visual_fingerprint)
        .bind(&receipt.metadata_fingerprint)
        .bind(&receipt.fields.bank)
        .bind(amount)
        .bind(&receipt.fields.document_date)
        .bind(&receipt.fields.reference_code)
        .bind(&receipt.source_filename)
        .fetch_one(&self.pool)
        .await;

        let registered_at = match inserted {
            Ok(ts) => ts,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StoreError::UniqueViolation(receipt.visual_fingerprint));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(visual_fingerprint = %receipt.visual_fingerprint, "Stored receipt");

        Ok(receipt.into_record(registered_at.and_utc()))
    }

    async fn get(&self, visual_fingerprint: &str) -> Result<Option<ReceiptRecord>, StoreError> {
        self.fetch_one_where("visual_fingerprint = ?", visual_fingerprint).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<ReceiptRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM receipts ORDER BY registered_at DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<ReceiptRow> = sqlx::query_as(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.into_iter().map(ReceiptRecord::try_from).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
