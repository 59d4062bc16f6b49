use envconfig::Envconfig;
use std::net::SocketAddr;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "127.0.0.1:3001")]
    pub bind_address: SocketAddr,

    #[envconfig(from = "SMARTLEAD_API_KEY")]
    pub smartlead_api_key: String,

    #[envconfig(default = "https://server.smartlead.ai/api/v1")]
    pub smartlead_base_url: String,

    #[envconfig(default = "sqlite:bounced_emails.db?mode=rwc")]
    pub database_url: String,

    #[envconfig(default = "7")]
    pub window_days: i64,

    #[envconfig(default = "100")]
    pub page_size: usize,

    // Total attempts per request, including the first one.
    #[envconfig(default = "3")]
    pub max_retries: u32,

    #[envconfig(default = "500")]
    pub retry_initial_backoff_ms: u64,

    #[envconfig(default = "10000")]
    pub retry_max_backoff_ms: u64,

    #[envconfig(default = "60")]
    pub request_timeout_seconds: u64,

    // A run that outlives this is abandoned with an error log entry rather
    // than left hanging off the scheduler.
    #[envconfig(default = "600")]
    pub run_deadline_seconds: u64,

    #[envconfig(default = "4")]
    pub max_concurrent_campaign_fetches: usize,

    #[envconfig(default = "3")]
    pub schedule_hour_utc: u32,

    #[envconfig(default = "true")]
    pub schedule_enabled: bool,

    #[envconfig(default = "false")]
    pub enable_metrics: bool,
}

impl Config {
    pub fn default_for_test() -> Self {
        Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            smartlead_api_key: "test-api-key".to_string(),
            smartlead_base_url: "http://localhost:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            window_days: 7,
            page_size: 100,
            max_retries: 3,
            retry_initial_backoff_ms: 10,
            retry_max_backoff_ms: 50,
            request_timeout_seconds: 5,
            run_deadline_seconds: 30,
            max_concurrent_campaign_fetches: 4,
            schedule_hour_utc: 3,
            schedule_enabled: false,
            enable_metrics: false,
        }
    }
}
