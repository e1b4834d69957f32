//! # Rolling Window
//! Display-ready view of the last 12 reporting periods.
//!
//! Pads short history with zero buckets so the dashboard always renders a
//! full window, and derives period-over-period percentage deltas with a
//! gain/loss flag per metric.

use serde::Serialize;

use crate::models::StatsBucket;
use crate::store::{StatsLedger, StoreError};

/// Number of reporting periods in the dashboard window.
pub const WINDOW_LEN: usize = 12;

/// One entry of the padded window. Synthetic padding entries carry all
/// zeroes and no timestamp, so only the counters go over the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowEntry {
    pub users: u64,
    pub subscriptions: u64,
    pub views: u64,
}

impl From<&StatsBucket> for WindowEntry {
    fn from(b: &StatsBucket) -> Self {
        Self {
            users: b.users,
            subscriptions: b.subscriptions,
            views: b.views,
        }
    }
}

/// Admin dashboard payload: the padded window plus current-period values
/// and trend indicators for each tracked metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats: Vec<WindowEntry>,
    pub users_count: u64,
    pub subscriptions_count: u64,
    pub views_count: u64,
    pub users_percentage: f64,
    pub subscriptions_percentage: f64,
    pub views_percentage: f64,
    pub users_profit: bool,
    pub subscriptions_profit: bool,
    pub views_profit: bool,
}

/// Read the ledger and assemble the dashboard view. Read failures surface
/// to the caller; short history does not (it pads).
pub async fn dashboard(ledger: &dyn StatsLedger) -> Result<DashboardStats, StoreError> {
    let buckets = ledger.recent(WINDOW_LEN).await?;
    Ok(assemble(&buckets))
}

/// Pure assembly from up-to-12 buckets ordered newest first.
pub fn assemble(newest_first: &[StatsBucket]) -> DashboardStats {
    let mut stats: Vec<WindowEntry> = newest_first.iter().rev().map(WindowEntry::from).collect();

    // Left-pad to a full window so index 10/11 always exist.
    let missing = WINDOW_LEN.saturating_sub(stats.len());
    if missing > 0 {
        let mut padded = vec![WindowEntry::default(); missing];
        padded.extend(stats);
        stats = padded;
    }

    let current = stats[WINDOW_LEN - 1];
    let previous = stats[WINDOW_LEN - 2];

    let (users_percentage, users_profit) = trend(current.users, previous.users);
    let (subscriptions_percentage, subscriptions_profit) =
        trend(current.subscriptions, previous.subscriptions);
    let (views_percentage, views_profit) = trend(current.views, previous.views);

    DashboardStats {
        stats,
        users_count: current.users,
        subscriptions_count: current.subscriptions,
        views_count: current.views,
        users_percentage,
        subscriptions_percentage,
        views_percentage,
        users_profit,
        subscriptions_profit,
        views_profit,
    }
}

/// Period-over-period change for one metric.
///
/// A zero previous period models "growth from nothing" as `current * 100`
/// instead of dividing by zero, and reads as a gain. Each metric uses its
/// own difference; the metrics are fully independent.
fn trend(current: u64, previous: u64) -> (f64, bool) {
    if previous == 0 {
        return ((current as f64) * 100.0, true);
    }
    let pct = (current as f64 - previous as f64) / (previous as f64) * 100.0;
    (pct, pct >= 0.0)
}
