use bounce_tracker::error::UpstreamError;
use bounce_tracker::smartlead::SmartleadClient;
use chrono::{Duration, Utc};
use httpmock::{Method, MockServer};
use serde_json::json;

mod common;
use common::{event_json, test_config};

#[tokio::test]
async fn test_list_campaigns_sends_api_key() {
    let server = MockServer::start();
    let config = test_config(&server);
    let client = SmartleadClient::new(&config).unwrap();

    let mock = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/campaigns")
            .query_param("api_key", "test-api-key");
        then.status(200)
            .json_body(json!([{"id": 7, "name": "Camp"}, {"id": 8, "name": null}]));
    });

    let campaigns = client.list_campaigns().await.unwrap();

    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[0].id, 7);
    assert_eq!(campaigns[0].name.as_deref(), Some("Camp"));
    assert_eq!(campaigns[1].name, None);
    mock.assert_hits(1);
}

#[tokio::test]
async fn test_pagination_concatenates_until_short_page() {
    let server = MockServer::start();
    let mut config = test_config(&server);
    config.page_size = 2;
    let client = SmartleadClient::new(&config).unwrap();
    let now = Utc::now();

    let page_one = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/campaigns/1/statistics")
            .query_param("email_status", "bounced")
            .query_param("offset", "0")
            .query_param("limit", "2");
        then.status(200).json_body(json!({"data": [
            event_json("a@example.com", now - Duration::days(1)),
            event_json("b@example.com", now - Duration::days(2)),
        ]}));
    });
    let page_two = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/campaigns/1/statistics")
            .query_param("offset", "2");
        then.status(200).json_body(json!({"data": [
            event_json("c@example.com", now - Duration::days(3)),
        ]}));
    });

    let events = client.list_bounce_events(1).await.unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[2].lead_email.as_deref(), Some("c@example.com"));
    page_one.assert_hits(1);
    page_two.assert_hits(1);
}

#[tokio::test]
async fn test_empty_first_page_means_no_events() {
    let server = MockServer::start();
    let config = test_config(&server);
    let client = SmartleadClient::new(&config).unwrap();

    let mock = server.mock(|when, then| {
        when.method(Method::GET).path("/campaigns/1/statistics");
        then.status(200).json_body(json!({"data": []}));
    });

    let events = client.list_bounce_events(1).await.unwrap();

    assert!(events.is_empty());
    mock.assert_hits(1);
}

#[tokio::test]
async fn test_bare_array_page_is_accepted() {
    let server = MockServer::start();
    let config = test_config(&server);
    let client = SmartleadClient::new(&config).unwrap();
    let now = Utc::now();

    server.mock(|when, then| {
        when.method(Method::GET).path("/campaigns/1/statistics");
        then.status(200)
            .json_body(json!([event_json("a@example.com", now)]));
    });

    let events = client.list_bounce_events(1).await.unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_server_errors_are_retried_until_exhausted() {
    let server = MockServer::start();
    let config = test_config(&server);
    let max_retries = config.max_retries;
    let client = SmartleadClient::new(&config).unwrap();

    let mock = server.mock(|when, then| {
        when.method(Method::GET).path("/campaigns");
        then.status(503);
    });

    let result = client.list_campaigns().await;

    assert!(matches!(result, Err(UpstreamError::Status(503))));
    mock.assert_hits(max_retries as usize);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start();
    let config = test_config(&server);
    let client = SmartleadClient::new(&config).unwrap();

    let mock = server.mock(|when, then| {
        when.method(Method::GET).path("/campaigns");
        then.status(404);
    });

    let result = client.list_campaigns().await;

    assert!(matches!(result, Err(UpstreamError::Status(404))));
    mock.assert_hits(1);
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = MockServer::start();
    let mut config = test_config(&server);
    config.max_retries = 2;
    let client = SmartleadClient::new(&config).unwrap();

    let mock = server.mock(|when, then| {
        when.method(Method::GET).path("/campaigns");
        then.status(429);
    });

    let result = client.list_campaigns().await;

    assert!(matches!(result, Err(UpstreamError::Status(429))));
    mock.assert_hits(2);
}

#[tokio::test]
async fn test_undecodable_payload_is_terminal() {
    let server = MockServer::start();
    let config = test_config(&server);
    let client = SmartleadClient::new(&config).unwrap();

    let mock = server.mock(|when, then| {
        when.method(Method::GET).path("/campaigns/1/statistics");
        then.status(200).json_body(json!({"emails": []}));
    });

    let result = client.list_bounce_events(1).await;

    assert!(matches!(result, Err(UpstreamError::InvalidPayload(_))));
    mock.assert_hits(1);
}

#[test]
fn test_empty_api_key_is_rejected_at_startup() {
    let mut config = bounce_tracker::config::Config::default_for_test();
    config.smartlead_api_key = String::new();
    assert!(SmartleadClient::new(&config).is_err());
}
