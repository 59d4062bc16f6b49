//! The fetch-aggregate-persist pipeline.
//!
//! One run: enumerate campaigns, pull bounce events per campaign with
//! bounded fan-out, normalize, window-filter, dedupe, then atomically
//! replace the stored snapshot and append a run-log entry. Exactly one
//! run may be in flight at a time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{PipelineError, UpstreamError};
use crate::normalize::normalize;
use crate::prometheus::{
    report_campaign_skipped, report_records_kept, report_run_duration, report_run_outcome,
};
use crate::smartlead::{Campaign, SmartleadClient};
use crate::store::Store;
use crate::types::{BounceRecord, FetchLogEntry};

pub struct Pipeline {
    store: Arc<dyn Store + Send + Sync>,
    client: SmartleadClient,
    window_days: i64,
    run_deadline: Duration,
    max_concurrent_fetches: usize,
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn Store + Send + Sync>, client: SmartleadClient, config: &Config) -> Self {
        Self {
            store,
            client,
            window_days: config.window_days,
            run_deadline: Duration::from_secs(config.run_deadline_seconds),
            max_concurrent_fetches: config.max_concurrent_campaign_fetches.max(1),
            run_lock: Mutex::new(()),
        }
    }

    /// Executes one full pipeline run and returns the log entry recorded
    /// for it. Upstream failures are folded into an error entry; only a
    /// failure to write the log itself escapes as `Err`.
    pub async fn run_fetch(&self) -> Result<FetchLogEntry, PipelineError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| PipelineError::RunInProgress)?;

        let fetched_at = Utc::now();
        let started = Instant::now();
        info!("starting bounce fetch run");

        let outcome =
            tokio::time::timeout(self.run_deadline, self.collect_records(fetched_at)).await;

        let entry = match outcome {
            Ok(Ok(records)) => match self.store.replace_records(&records, fetched_at).await {
                Ok(()) => {
                    info!(total_bounced = records.len(), "bounce fetch run succeeded");
                    report_run_outcome("success");
                    report_records_kept(records.len() as u64);
                    FetchLogEntry::success(fetched_at, records.len() as i64)
                }
                Err(e) => {
                    error!(error = %e, "failed to store fetched records");
                    report_run_outcome("store_error");
                    FetchLogEntry::error(fetched_at, format!("failed to store records: {e}"))
                }
            },
            Ok(Err(e)) => {
                error!(error = %e, "bounce fetch run failed");
                report_run_outcome("upstream_error");
                FetchLogEntry::error(fetched_at, e.to_string())
            }
            Err(_) => {
                error!(deadline_secs = self.run_deadline.as_secs(), "bounce fetch run abandoned");
                report_run_outcome("deadline_exceeded");
                FetchLogEntry::error(
                    fetched_at,
                    format!("run exceeded deadline of {}s", self.run_deadline.as_secs()),
                )
            }
        };

        report_run_duration(started.elapsed());
        self.store.append_log(&entry).await?;
        Ok(entry)
    }

    async fn collect_records(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<BounceRecord>, UpstreamError> {
        let campaigns = self.client.list_campaigns().await?;
        info!(campaigns = campaigns.len(), "enumerated campaigns");

        // Bounded fan-out across campaigns. `buffered` preserves campaign
        // list order, which the first-seen dedup below relies on.
        let per_campaign: Vec<Vec<BounceRecord>> = stream::iter(campaigns.into_iter())
            .map(|campaign| async move { self.fetch_campaign(&campaign).await })
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        let combined: Vec<BounceRecord> = per_campaign.into_iter().flatten().collect();
        Ok(filter_and_dedupe(combined, now, self.window_days))
    }

    async fn fetch_campaign(&self, campaign: &Campaign) -> Vec<BounceRecord> {
        let events = match self.client.list_bounce_events(campaign.id).await {
            Ok(events) => events,
            Err(e) => {
                // One broken campaign does not take the run down; it just
                // contributes nothing.
                warn!(
                    campaign_id = campaign.id,
                    error = %e,
                    "skipping campaign after upstream failure"
                );
                report_campaign_skipped();
                return Vec::new();
            }
        };

        events
            .iter()
            .filter_map(|raw| match normalize(raw, campaign) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(campaign_id = campaign.id, error = %e, "dropping malformed event");
                    None
                }
            })
            .collect()
    }
}

/// Keeps records whose `sent_time` falls within the trailing window
/// (inclusive lower bound, UTC) and removes duplicates by composite key,
/// first-seen occurrence winning.
pub fn filter_and_dedupe(
    records: Vec<BounceRecord>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<BounceRecord> {
    let cutoff = now - chrono::Duration::days(window_days);
    let mut seen = HashSet::new();

    records
        .into_iter()
        .filter(|record| record.sent_time >= cutoff)
        .filter(|record| seen.insert(record.dedup_key()))
        .collect()
}
