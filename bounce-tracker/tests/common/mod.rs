#![allow(dead_code)]

//! Shared harness for the integration tests: an in-memory store, a config
//! pointed at a mock SmartLead server, and payload builders.

use std::sync::Arc;

use bounce_tracker::config::Config;
use bounce_tracker::pipeline::Pipeline;
use bounce_tracker::smartlead::SmartleadClient;
use bounce_tracker::store::{SqliteStore, Store};
use bounce_tracker::types::BounceRecord;
use chrono::{DateTime, Utc};
use httpmock::{Method, Mock, MockServer};
use serde_json::{json, Value};

pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default_for_test();
    config.smartlead_base_url = server.base_url();
    config
}

pub async fn test_store() -> Arc<dyn Store + Send + Sync> {
    Arc::new(SqliteStore::new("sqlite::memory:").await.unwrap())
}

pub fn test_pipeline(config: &Config, store: Arc<dyn Store + Send + Sync>) -> Pipeline {
    let client = SmartleadClient::new(config).unwrap();
    Pipeline::new(store, client, config)
}

pub fn event_json(email: &str, sent_time: DateTime<Utc>) -> Value {
    json!({
        "lead_email": email,
        "from_email": "sender@acme.io",
        "email_message": "rendered body",
        "email_subject": "Quick question",
        "sent_time": sent_time.to_rfc3339(),
        "sequence_number": 1,
        "is_bounced": true
    })
}

pub fn record(campaign_id: i64, email: &str, sent_time: DateTime<Utc>) -> BounceRecord {
    BounceRecord {
        email_address: email.to_string(),
        from_email: "sender@acme.io".to_string(),
        email_message: String::new(),
        email_subject: String::new(),
        campaign_id,
        campaign_name: "Camp".to_string(),
        email_status: "bounced".to_string(),
        sent_time,
        sequence_number: 1,
    }
}

pub fn mock_campaigns<'a>(server: &'a MockServer, campaigns: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(Method::GET).path("/campaigns");
        then.status(200).json_body(campaigns);
    })
}

/// Mocks the whole (single-page) statistics listing for one campaign,
/// wrapped in the provider's `data` envelope.
pub fn mock_statistics<'a>(server: &'a MockServer, campaign_id: i64, events: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(Method::GET)
            .path(format!("/campaigns/{campaign_id}/statistics"))
            .query_param("email_status", "bounced");
        then.status(200).json_body(json!({ "data": events }));
    })
}

pub fn mock_statistics_failure<'a>(server: &'a MockServer, campaign_id: i64, status: u16) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(Method::GET)
            .path(format!("/campaigns/{campaign_id}/statistics"));
        then.status(status);
    })
}
