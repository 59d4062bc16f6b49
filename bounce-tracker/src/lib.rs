//! Periodically pulls bounce notifications for every SmartLead campaign,
//! keeps the trailing seven days of them in SQLite, and serves the result
//! over a small HTTP API so reports never hit the provider directly.

pub mod api;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod prometheus;
pub mod retry;
pub mod router;
pub mod schedule;
pub mod server;
pub mod smartlead;
pub mod store;
pub mod types;
