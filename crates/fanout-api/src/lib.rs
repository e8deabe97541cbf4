//! HTTP surface for the fanout distributor.
//!
//! Provides configuration loading and the axum server exposing packet
//! ingestion, statistics, and service health. The surface maps intake
//! verdicts onto HTTP: accepted packets answer `202`, overload answers
//! `503` so agents back off and retry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod server;

pub use config::{Config, TargetEntry};
pub use server::{create_router, create_test_router, start_server};
