//! Dispatch engine for the fanout log-packet distributor.
//!
//! Accepts packets into a bounded intake buffer and fans them out to
//! weighted analyzer targets through a pool of async workers, with bounded
//! retry across targets and a periodic health monitor feeding the
//! selection set.
//!
//! # Architecture
//!
//! ```text
//!  ingestion            ┌──────────────┐
//!  surface ──offer()──▶ │ IntakeQueue  │  bounded FIFO, explicit overload
//!                       └──────────────┘
//!                              │ take()
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!       ┌────────────┐  ┌────────────┐  ┌────────────┐
//!       │  Worker 1  │  │  Worker 2  │  │  Worker N  │
//!       └────────────┘  └────────────┘  └────────────┘
//!              │               │               │
//!              └───────────────┼───────────────┘
//!                              ▼
//!                       ┌──────────────┐   snapshot   ┌────────────────┐
//!                       │  Dispatcher  │ ◀─────────── │ TargetRegistry │
//!                       │ select/retry │              └────────────────┘
//!                       └──────────────┘                     ▲
//!                              │ send                        │ set_health
//!                              ▼                             │
//!                       ┌──────────────┐              ┌───────────────┐
//!                       │  Transport   │ ◀─ probe ─── │ HealthMonitor │
//!                       └──────────────┘              └───────────────┘
//! ```
//!
//! Selection is lock-free against immutable registry snapshots; no lock is
//! held across a network operation. Health state is eventually consistent:
//! a stale selection is corrected by retry-with-exclusion, not by
//! coordinating the monitor with workers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod health;
pub mod queue;
pub mod retry;
pub mod selector;
pub mod transport;
pub mod worker;
pub mod worker_pool;

pub use dispatcher::{DispatchOutcome, Dispatcher, ExhaustReason};
pub use engine::{DispatchConfig, DispatchEngine};
pub use error::{DispatchError, Result};
pub use health::{HealthConfig, HealthMonitor};
pub use queue::{IntakeQueue, OfferOutcome};
pub use retry::RetryPolicy;
pub use transport::{ClientConfig, HttpTransport, SendResponse, Transport};
pub use worker_pool::WorkerPool;

/// Default number of dispatch workers.
pub const DEFAULT_WORKER_COUNT: usize = 10;

/// Default intake buffer capacity.
pub const DEFAULT_CAPACITY: usize = 5000;

/// Default per-attempt transport timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);
