// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod payments;
pub mod scheduler;
pub mod stats;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::Config;
pub use crate::error::ApiError;
pub use crate::stats::{DashboardStats, StatsAggregator};
pub use crate::store::MemoryStore;
