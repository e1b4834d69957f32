//! Materialized-view stats subsystem: the aggregator keeps the newest
//! ledger bucket in sync with the source collections, the window module
//! renders the 12-period dashboard view.

pub mod aggregator;
pub mod window;

pub use aggregator::{AggregatorHandle, StatsAggregator};
pub use window::{dashboard, DashboardStats, WindowEntry, WINDOW_LEN};
