//! Reporting-period scheduler.
//!
//! Opens a fresh zero-valued stats bucket once per period; the aggregator
//! only ever updates the newest bucket and relies on this task to exist.
//! Runs strictly less often than the dashboard granularity (one bucket per
//! period).

use std::{sync::Arc, time::Duration};

use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::StatsBucket;
use crate::store::StatsLedger;

pub fn spawn_bucket_scheduler(ledger: Arc<dyn StatsLedger>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            // First tick fires immediately, opening the boot-time bucket.
            ticker.tick().await;
            let bucket = StatsBucket::open_at(chrono::Utc::now());
            match ledger.insert(bucket).await {
                Ok(()) => {
                    counter!("stats_buckets_opened_total").increment(1);
                    info!(period_secs = period.as_secs(), "opened new stats bucket");
                }
                Err(e) => {
                    // Skip this period; keep ticking.
                    warn!(error = %e, "failed to open stats bucket");
                }
            }
        }
    })
}
