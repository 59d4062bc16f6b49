use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized bounce event, flattened from the provider's per-campaign
/// statistics payload. A record is immutable once created; every fetch run
/// replaces the whole set rather than patching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BounceRecord {
    pub email_address: String,
    pub from_email: String,
    pub email_message: String,
    pub email_subject: String,
    pub campaign_id: i64,
    pub campaign_name: String,
    pub email_status: String,
    pub sent_time: DateTime<Utc>,
    pub sequence_number: i64,
}

impl BounceRecord {
    /// The composite identity used for deduplication within one fetch.
    pub fn dedup_key(&self) -> (i64, String, DateTime<Utc>, i64) {
        (
            self.campaign_id,
            self.email_address.clone(),
            self.sent_time,
            self.sequence_number,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// One pipeline run, success or failure. Appended to the fetch log after
/// every run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FetchLogEntry {
    pub fetched_at: DateTime<Utc>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bounced: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl FetchLogEntry {
    pub fn success(fetched_at: DateTime<Utc>, total_bounced: i64) -> Self {
        Self {
            fetched_at,
            status: RunStatus::Success,
            total_bounced: Some(total_bounced),
            error_detail: None,
        }
    }

    pub fn error(fetched_at: DateTime<Utc>, detail: impl Into<String>) -> Self {
        Self {
            fetched_at,
            status: RunStatus::Error,
            total_bounced: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// The currently stored record set plus the time it was captured.
/// `fetched_at` is `None` until the first successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub fetched_at: Option<DateTime<Utc>>,
    pub records: Vec<BounceRecord>,
}

impl RecordSnapshot {
    pub fn empty() -> Self {
        Self {
            fetched_at: None,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fetched_at.is_none() && self.records.is_empty()
    }
}
