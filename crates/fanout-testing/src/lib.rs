//! Test infrastructure for the fanout distributor.
//!
//! Provides a deterministic clock so backoff-heavy scenarios run
//! instantly, a scripted in-memory transport for failure injection without
//! sockets, and packet fixtures. Real-HTTP behavior is covered separately
//! with wiremock against the production transport.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod time;
pub mod transport;

pub use fixtures::{packet, PacketBuilder};
pub use time::TestClock;
pub use transport::MockTransport;
