//! # Stats Aggregator
//! Keeps the newest ledger bucket consistent with the source collections.
//!
//! Each mutation notification triggers a full recount of the affected
//! metric group from the collection itself — never a delta — so duplicate,
//! reordered, or coalesced notifications all converge on the same stored
//! value. The aggregator holds no state between invocations; the ledger is
//! the only persistent state.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::store::{SourceCollection, SourceMutation, StatsLedger, StatsSource, StoreError};

pub struct StatsAggregator {
    source: Arc<dyn StatsSource>,
    ledger: Arc<dyn StatsLedger>,
}

impl StatsAggregator {
    pub fn new(source: Arc<dyn StatsSource>, ledger: Arc<dyn StatsLedger>) -> Self {
        Self { source, ledger }
    }

    /// Consume the mutation feed until it closes or the handle is shut
    /// down. Fire-and-forget relative to the writes that feed it.
    pub fn spawn(self, mut feed: broadcast::Receiver<SourceMutation>) -> AggregatorHandle {
        let task = tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(mutation) => self.apply(mutation).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // At-least-once is enough: recount everything.
                        warn!(skipped, "mutation feed lagged, recounting all metrics");
                        self.apply(SourceMutation {
                            collection: SourceCollection::Users,
                        })
                        .await;
                        self.apply(SourceMutation {
                            collection: SourceCollection::Courses,
                        })
                        .await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("mutation feed closed, aggregator stopping");
        });
        AggregatorHandle { task }
    }

    /// React to a single notification. Failures are logged and dropped;
    /// the write that caused the notification already succeeded and the
    /// next mutation retries implicitly.
    pub async fn apply(&self, mutation: SourceMutation) {
        let outcome = match mutation.collection {
            SourceCollection::Users => self.recount_user_metrics().await,
            SourceCollection::Courses => self.recount_view_metric().await,
        };
        if let Err(e) = outcome {
            warn!(collection = ?mutation.collection, error = %e, "stats recount failed");
            counter!("stats_recount_failures_total").increment(1);
        }
    }

    async fn recount_user_metrics(&self) -> Result<(), StoreError> {
        let Some(mut bucket) = self.ledger.latest().await? else {
            self.skip("users");
            return Ok(());
        };
        let totals = self.source.user_totals().await?;
        bucket.users = totals.users;
        bucket.subscriptions = totals.active_subscriptions;
        self.ledger.update(bucket).await?;
        counter!("stats_recounts_total", "collection" => "users").increment(1);
        Ok(())
    }

    async fn recount_view_metric(&self) -> Result<(), StoreError> {
        let Some(mut bucket) = self.ledger.latest().await? else {
            self.skip("courses");
            return Ok(());
        };
        bucket.views = self.source.total_views().await?;
        self.ledger.update(bucket).await?;
        counter!("stats_recounts_total", "collection" => "courses").increment(1);
        Ok(())
    }

    // No bucket is open yet (scheduler has not run). Never an error on the
    // write path that triggered us.
    fn skip(&self, collection: &'static str) {
        warn!(collection, "no stats bucket open, skipping recount");
        counter!("stats_recounts_skipped_total").increment(1);
    }
}

/// Handle to a running aggregator task.
pub struct AggregatorHandle {
    task: JoinHandle<()>,
}

impl AggregatorHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
