// tests/stats_aggregator.rs
//
// Aggregator semantics straight against the store traits: full idempotent
// recounts, missing-bucket no-op, and the spawned change-feed lifecycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use coursedeck::models::{Course, StatsBucket, User, SUBSCRIPTION_ACTIVE};
use coursedeck::stats::{self, StatsAggregator};
use coursedeck::store::{MemoryStore, SourceCollection, SourceMutation, StatsLedger};

fn mutation(collection: SourceCollection) -> SourceMutation {
    SourceMutation { collection }
}

fn seed_user(store: &MemoryStore, email: &str, active: bool) {
    let mut user = User::new(
        "Test".to_string(),
        email.to_string(),
        "5550100".to_string(),
        "hash".to_string(),
    );
    if active {
        user.subscription.id = Some("sub_1".to_string());
        user.subscription.status = Some(SUBSCRIPTION_ACTIVE.to_string());
    }
    store.insert_user(user).unwrap();
}

async fn open_bucket(store: &Arc<MemoryStore>) {
    let ledger: &dyn StatsLedger = store.as_ref();
    ledger
        .insert(StatsBucket::open_at(Utc::now()))
        .await
        .unwrap();
}

#[tokio::test]
async fn user_mutation_recounts_users_and_active_subscriptions() {
    let store = Arc::new(MemoryStore::new());
    open_bucket(&store).await;
    seed_user(&store, "a@example.com", true);
    seed_user(&store, "b@example.com", false);
    seed_user(&store, "c@example.com", false);

    let agg = StatsAggregator::new(store.clone(), store.clone());
    agg.apply(mutation(SourceCollection::Users)).await;

    let ledger: &dyn StatsLedger = store.as_ref();
    let bucket = ledger.latest().await.unwrap().expect("bucket");
    assert_eq!(bucket.users, 3);
    assert_eq!(bucket.subscriptions, 1);
    assert_eq!(bucket.views, 0);
}

#[tokio::test]
async fn course_mutation_recounts_total_views() {
    let store = Arc::new(MemoryStore::new());
    open_bucket(&store).await;

    let course = Course::new(
        "Rust".to_string(),
        "desc".to_string(),
        "dev".to_string(),
        "admin".to_string(),
    );
    let course_id = course.id;
    store.insert_course(course).unwrap();
    // Two lecture fetches, two views.
    store.lectures_with_view(course_id).unwrap();
    store.lectures_with_view(course_id).unwrap();

    let agg = StatsAggregator::new(store.clone(), store.clone());
    agg.apply(mutation(SourceCollection::Courses)).await;

    let ledger: &dyn StatsLedger = store.as_ref();
    let bucket = ledger.latest().await.unwrap().expect("bucket");
    assert_eq!(bucket.views, 2);
    // users metric untouched by course mutations
    assert_eq!(bucket.users, 0);
}

#[tokio::test]
async fn repeated_recounts_converge_to_the_same_value() {
    let store = Arc::new(MemoryStore::new());
    open_bucket(&store).await;
    seed_user(&store, "a@example.com", true);

    let agg = StatsAggregator::new(store.clone(), store.clone());
    for _ in 0..5 {
        agg.apply(mutation(SourceCollection::Users)).await;
        agg.apply(mutation(SourceCollection::Courses)).await;
    }

    let ledger: &dyn StatsLedger = store.as_ref();
    let bucket = ledger.latest().await.unwrap().expect("bucket");
    assert_eq!(bucket.users, 1);
    assert_eq!(bucket.subscriptions, 1);
    assert_eq!(bucket.views, 0);
}

#[tokio::test]
async fn missing_bucket_is_a_logged_no_op() {
    let store = Arc::new(MemoryStore::new());
    seed_user(&store, "a@example.com", false);

    let agg = StatsAggregator::new(store.clone(), store.clone());
    // No bucket open: must not panic and must not create one.
    agg.apply(mutation(SourceCollection::Users)).await;
    agg.apply(mutation(SourceCollection::Courses)).await;

    let ledger: &dyn StatsLedger = store.as_ref();
    assert!(ledger.latest().await.unwrap().is_none());

    // The reader still serves a full zero window afterwards.
    let out = stats::dashboard(store.as_ref()).await.unwrap();
    assert_eq!(out.stats.len(), 12);
    assert_eq!(out.users_count, 0);
    assert_eq!(out.views_count, 0);
}

#[tokio::test]
async fn only_the_newest_bucket_is_rewritten() {
    let store = Arc::new(MemoryStore::new());
    let ledger: &dyn StatsLedger = store.as_ref();

    let old = StatsBucket {
        id: Uuid::new_v4(),
        users: 7,
        subscriptions: 3,
        views: 70,
        created_at: Utc::now() - chrono::Duration::days(1),
    };
    ledger.insert(old.clone()).await.unwrap();
    ledger.insert(StatsBucket::open_at(Utc::now())).await.unwrap();

    seed_user(&store, "a@example.com", false);
    let agg = StatsAggregator::new(store.clone(), store.clone());
    agg.apply(mutation(SourceCollection::Users)).await;

    let recent = ledger.recent(12).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].users, 1, "newest bucket recounted");
    assert_eq!(recent[1].users, 7, "historical bucket untouched");
}

#[tokio::test]
async fn spawned_aggregator_reacts_to_store_writes() {
    let store = Arc::new(MemoryStore::new());
    open_bucket(&store).await;

    let handle = StatsAggregator::new(store.clone(), store.clone()).spawn(store.subscribe());

    // This insert publishes the mutation the task should pick up.
    seed_user(&store, "live@example.com", false);

    let ledger: &dyn StatsLedger = store.as_ref();
    let mut observed = 0;
    for _ in 0..200 {
        if let Some(bucket) = ledger.latest().await.unwrap() {
            observed = bucket.users;
            if observed == 1 {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(observed, 1, "aggregator should recount after the write");

    assert!(!handle.is_finished());
    handle.shutdown();
}
