//! Durable storage for the record snapshot and the fetch log.
//!
//! The pipeline is the only writer; the HTTP layer only reads. Both
//! collections live in SQLite behind a `Store` trait so tests can run
//! against an in-memory database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreError;
use crate::types::{BounceRecord, FetchLogEntry, RecordSnapshot};

#[async_trait]
pub trait Store {
    /// Atomically discards the previous record set and installs the new
    /// one. On failure the previous snapshot stays visible to readers.
    async fn replace_records(
        &self,
        records: &[BounceRecord],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn get_records(&self) -> Result<RecordSnapshot, StoreError>;

    /// Durably appends one run-log entry. Write failures propagate.
    async fn append_log(&self, entry: &FetchLogEntry) -> Result<(), StoreError>;

    /// Most recent `limit` entries, most-recent-first.
    async fn get_logs(&self, limit: i64) -> Result<Vec<FetchLogEntry>, StoreError>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        // A `:memory:` database exists per connection, so it must not be
        // spread across a pool.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(database_url, "store initialized");

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn replace_records(
        &self,
        records: &[BounceRecord],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bounced_emails")
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO bounced_emails
                    (email_address, from_email, email_message, email_subject,
                     campaign_id, campaign_name, email_status, sent_time, sequence_number)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.email_address)
            .bind(&record.from_email)
            .bind(&record.email_message)
            .bind(&record.email_subject)
            .bind(record.campaign_id)
            .bind(&record.campaign_name)
            .bind(&record.email_status)
            .bind(record.sent_time)
            .bind(record.sequence_number)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO snapshot_meta (id, fetched_at) VALUES (1, ?)
            ON CONFLICT (id) DO UPDATE SET fetched_at = excluded.fetched_at
            "#,
        )
        .bind(fetched_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_records(&self) -> Result<RecordSnapshot, StoreError> {
        let fetched_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT fetched_at FROM snapshot_meta WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let records = sqlx::query_as::<_, BounceRecord>(
            r#"
            SELECT email_address, from_email, email_message, email_subject,
                   campaign_id, campaign_name, email_status, sent_time, sequence_number
            FROM bounced_emails
            ORDER BY sent_time DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(RecordSnapshot {
            fetched_at,
            records,
        })
    }

    async fn append_log(&self, entry: &FetchLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fetch_log (status, total_bounced, error_detail, fetched_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(entry.status)
        .bind(entry.total_bounced)
        .bind(&entry.error_detail)
        .bind(entry.fetched_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_logs(&self, limit: i64) -> Result<Vec<FetchLogEntry>, StoreError> {
        let logs = sqlx::query_as::<_, FetchLogEntry>(
            r#"
            SELECT fetched_at, status, total_bounced, error_detail
            FROM fetch_log
            ORDER BY fetched_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
