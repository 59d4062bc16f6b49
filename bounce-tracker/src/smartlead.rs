//! Client for the SmartLead campaign API.
//!
//! Pagination and provider payload quirks stay inside this module; the
//! rest of the pipeline only ever sees `Campaign` and `RawEmailEvent`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::error::UpstreamError;
use crate::prometheus::report_upstream_request;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: Option<String>,
}

/// A single email event as the provider returns it. Everything except the
/// identity fields is optional upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEmailEvent {
    pub lead_email: Option<String>,
    pub from_email: Option<String>,
    pub email_message: Option<String>,
    pub email_subject: Option<String>,
    pub email_status: Option<String>,
    pub sent_time: Option<String>,
    pub sequence_number: Option<i64>,
}

pub struct SmartleadClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: usize,
    retry: RetryPolicy,
}

impl SmartleadClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        if config.smartlead_api_key.is_empty() {
            anyhow::bail!("SMARTLEAD_API_KEY must be set to a non-empty value");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.smartlead_base_url.trim_end_matches('/').to_string(),
            api_key: config.smartlead_api_key.clone(),
            page_size: config.page_size.max(1),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_initial_backoff_ms),
                Duration::from_millis(config.retry_max_backoff_ms),
            ),
        })
    }

    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>, UpstreamError> {
        let url = format!("{}/campaigns", self.base_url);
        let payload = self.get_with_retries(&url, &[]).await?;

        serde_json::from_value(payload)
            .map_err(|e| UpstreamError::InvalidPayload(format!("campaign list: {e}")))
    }

    /// Fetches every bounce-classified event for a campaign, following
    /// offset/limit pagination until the provider returns a short page.
    pub async fn list_bounce_events(
        &self,
        campaign_id: i64,
    ) -> Result<Vec<RawEmailEvent>, UpstreamError> {
        let url = format!("{}/campaigns/{}/statistics", self.base_url, campaign_id);
        let mut events = Vec::new();
        let mut offset = 0usize;

        loop {
            let query = [
                ("email_status".to_string(), "bounced".to_string()),
                ("offset".to_string(), offset.to_string()),
                ("limit".to_string(), self.page_size.to_string()),
            ];
            let payload = self.get_with_retries(&url, &query).await?;
            let page = unwrap_event_page(payload)?;

            let page_len = page.len();
            events.extend(page);

            // A short page is the provider's end-of-data signal.
            if page_len < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        Ok(events)
    }

    async fn get_with_retries(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.get_once(url, query).await {
                Ok(payload) => {
                    report_upstream_request("success");
                    return Ok(payload);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    report_upstream_request("retried");
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        url,
                        attempt,
                        error = %e,
                        "upstream request failed, retrying in {:?}", backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    report_upstream_request("failed");
                    return Err(e);
                }
            }
        }
    }

    async fn get_once(&self, url: &str, query: &[(String, String)]) -> Result<Value, UpstreamError> {
        let response = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::InvalidPayload(e.to_string()))
    }
}

/// The statistics endpoint answers with either a bare array or an object
/// wrapping it in a `data` key, depending on provider version.
fn unwrap_event_page(payload: Value) -> Result<Vec<RawEmailEvent>, UpstreamError> {
    let items = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Array(_)) => data,
            _ => {
                return Err(UpstreamError::InvalidPayload(
                    "statistics object is missing a `data` array".to_string(),
                ))
            }
        },
        other => {
            return Err(UpstreamError::InvalidPayload(format!(
                "unexpected statistics payload: {other}"
            )))
        }
    };

    serde_json::from_value(items).map_err(|e| UpstreamError::InvalidPayload(e.to_string()))
}
