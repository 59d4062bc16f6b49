//! Daily trigger for the fetch pipeline.
//!
//! The pipeline itself is timer-agnostic; this module is the one place
//! that knows the service runs it once a day at a fixed UTC hour.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::pipeline::Pipeline;

pub const SCHEDULED_JOB_ID: &str = "daily_bounced_fetch";

pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    hour_utc: u32,
    enabled: bool,
    next_run: RwLock<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledJob {
    pub id: String,
    pub next_run: Option<DateTime<Utc>>,
    pub trigger: String,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, config: &Config) -> Self {
        Self {
            pipeline,
            hour_utc: config.schedule_hour_utc % 24,
            enabled: config.schedule_enabled,
            next_run: RwLock::new(None),
        }
    }

    /// Description of the configured trigger for `/schedule-info`.
    pub fn jobs(&self) -> Vec<ScheduledJob> {
        if !self.enabled {
            return Vec::new();
        }

        vec![ScheduledJob {
            id: SCHEDULED_JOB_ID.to_string(),
            next_run: *self.next_run.read().unwrap(),
            trigger: format!("cron[hour='{}', minute='0']", self.hour_utc),
        }]
    }

    /// Sleeps until the next daily occurrence, runs the pipeline, repeats.
    /// Spawned once at startup when scheduling is enabled.
    pub async fn run(self: Arc<Self>) {
        loop {
            let next = next_occurrence(Utc::now(), self.hour_utc);
            *self.next_run.write().unwrap() = Some(next);
            info!(next_run = %next, "scheduled next bounce fetch");

            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match self.pipeline.run_fetch().await {
                Ok(entry) if entry.is_success() => {
                    info!(
                        total_bounced = entry.total_bounced.unwrap_or(0),
                        "scheduled bounce fetch completed"
                    );
                }
                Ok(entry) => {
                    warn!(
                        detail = entry.error_detail.as_deref().unwrap_or(""),
                        "scheduled bounce fetch recorded an error"
                    );
                }
                Err(e) => {
                    error!(error = %e, "scheduled bounce fetch could not be recorded");
                }
            }
        }
    }
}

/// First `hour:00:00` UTC strictly after `after`.
pub fn next_occurrence(after: DateTime<Utc>, hour_utc: u32) -> DateTime<Utc> {
    let candidate = after
        .date_naive()
        .and_hms_opt(hour_utc, 0, 0)
        .expect("hour is in range")
        .and_utc();

    if candidate > after {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}
