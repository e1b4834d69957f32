//! In-memory document store with a change-notification feed.
//!
//! Collections live behind plain `RwLock`s; every write to the user or
//! course collection publishes a [`SourceMutation`] on a broadcast channel.
//! The stats subsystem does not touch `MemoryStore` directly — it sees only
//! the [`StatsSource`] and [`StatsLedger`] traits plus the mutation feed, so
//! a database-backed store with a native change stream can slot in without
//! touching the aggregator.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Course, Lecture, Payment, StatsBucket, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(&'static str),
}

/// Source collections whose mutations drive the stats rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCollection {
    Users,
    Courses,
}

/// "Something changed, re-read current state." Carries no payload on
/// purpose: consumers must re-derive from the collection, which is what
/// makes the rollup idempotent under duplicate or reordered delivery.
#[derive(Debug, Clone, Copy)]
pub struct SourceMutation {
    pub collection: SourceCollection,
}

/// Aggregate counts re-derived from the user collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTotals {
    pub users: u64,
    pub active_subscriptions: u64,
}

/// Read access to the source-of-truth collections, as the aggregator
/// needs it. Full recounts only, no deltas.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn user_totals(&self) -> Result<UserTotals, StoreError>;
    async fn total_views(&self) -> Result<u64, StoreError>;
}

/// The time-bucketed metrics ledger. Owned by the aggregator/scheduler
/// pair; the dashboard reader only calls `recent`.
#[async_trait]
pub trait StatsLedger: Send + Sync {
    async fn insert(&self, bucket: StatsBucket) -> Result<(), StoreError>;
    /// Bucket with the maximum `created_at`, if any.
    async fn latest(&self) -> Result<Option<StatsBucket>, StoreError>;
    /// Replace the bucket with the same id. Unknown ids are ignored.
    async fn update(&self, bucket: StatsBucket) -> Result<(), StoreError>;
    /// Up to `limit` buckets, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<StatsBucket>, StoreError>;
}

const FEED_CAPACITY: usize = 256;

pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    courses: RwLock<Vec<Course>>,
    payments: RwLock<Vec<Payment>>,
    ledger: RwLock<Vec<StatsBucket>>,
    feed: broadcast::Sender<SourceMutation>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            users: RwLock::new(Vec::new()),
            courses: RwLock::new(Vec::new()),
            payments: RwLock::new(Vec::new()),
            ledger: RwLock::new(Vec::new()),
            feed,
        }
    }

    /// Subscribe to mutation notifications. At-least-once: a lagged
    /// receiver observes `RecvError::Lagged` and should recount everything.
    pub fn subscribe(&self) -> broadcast::Receiver<SourceMutation> {
        self.feed.subscribe()
    }

    fn notify(&self, collection: SourceCollection) {
        // Nobody listening is fine (e.g. aggregator not started in tests).
        let _ = self.feed.send(SourceMutation { collection });
    }

    // ---- users ----

    pub fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.write(&self.users, "users")?.push(user);
        self.notify(SourceCollection::Users);
        Ok(())
    }

    pub fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read(&self.users, "users")?.iter().find(|u| u.id == id).cloned())
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read(&self.users, "users")?
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    pub fn user_by_reset_digest(&self, digest: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read(&self.users, "users")?
            .iter()
            .find(|u| u.reset_token_hash.as_deref() == Some(digest))
            .cloned())
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.read(&self.users, "users")?.clone())
    }

    /// Replace the stored user with the same id.
    pub fn update_user(&self, user: User) -> Result<(), StoreError> {
        {
            let mut users = self.write(&self.users, "users")?;
            if let Some(slot) = users.iter_mut().find(|u| u.id == user.id) {
                *slot = user;
            }
        }
        self.notify(SourceCollection::Users);
        Ok(())
    }

    pub fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = {
            let mut users = self.write(&self.users, "users")?;
            let before = users.len();
            users.retain(|u| u.id != id);
            users.len() != before
        };
        if removed {
            self.notify(SourceCollection::Users);
        }
        Ok(removed)
    }

    // ---- courses ----

    pub fn insert_course(&self, course: Course) -> Result<(), StoreError> {
        self.write(&self.courses, "courses")?.push(course);
        self.notify(SourceCollection::Courses);
        Ok(())
    }

    pub fn course_by_id(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.read(&self.courses, "courses")?.iter().find(|c| c.id == id).cloned())
    }

    pub fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        Ok(self.read(&self.courses, "courses")?.clone())
    }

    pub fn update_course(&self, course: Course) -> Result<(), StoreError> {
        {
            let mut courses = self.write(&self.courses, "courses")?;
            if let Some(slot) = courses.iter_mut().find(|c| c.id == course.id) {
                *slot = course;
            }
        }
        self.notify(SourceCollection::Courses);
        Ok(())
    }

    pub fn delete_course(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = {
            let mut courses = self.write(&self.courses, "courses")?;
            let before = courses.len();
            courses.retain(|c| c.id != id);
            courses.len() != before
        };
        if removed {
            self.notify(SourceCollection::Courses);
        }
        Ok(removed)
    }

    /// Fetch a course's lectures and bump its view counter in one step.
    /// The bump is the course mutation that feeds the views rollup.
    pub fn lectures_with_view(&self, id: Uuid) -> Result<Option<Vec<Lecture>>, StoreError> {
        let lectures = {
            let mut courses = self.write(&self.courses, "courses")?;
            match courses.iter_mut().find(|c| c.id == id) {
                Some(course) => {
                    course.views += 1;
                    Some(course.lectures.clone())
                }
                None => None,
            }
        };
        if lectures.is_some() {
            self.notify(SourceCollection::Courses);
        }
        Ok(lectures)
    }

    // ---- payments ----

    pub fn insert_payment(&self, payment: Payment) -> Result<(), StoreError> {
        self.write(&self.payments, "payments")?.push(payment);
        Ok(())
    }

    pub fn payment_by_subscription(&self, subscription_id: &str) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .read(&self.payments, "payments")?
            .iter()
            .find(|p| p.gateway_subscription_id == subscription_id)
            .cloned())
    }

    pub fn delete_payment(&self, id: Uuid) -> Result<(), StoreError> {
        self.write(&self.payments, "payments")?.retain(|p| p.id != id);
        Ok(())
    }

    // ---- lock plumbing ----

    fn read<'a, T>(
        &self,
        lock: &'a RwLock<T>,
        what: &'static str,
    ) -> Result<RwLockReadGuard<'a, T>, StoreError> {
        lock.read().map_err(|_| StoreError::Unavailable(what))
    }

    fn write<'a, T>(
        &self,
        lock: &'a RwLock<T>,
        what: &'static str,
    ) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
        lock.write().map_err(|_| StoreError::Unavailable(what))
    }
}

#[async_trait]
impl StatsSource for MemoryStore {
    async fn user_totals(&self) -> Result<UserTotals, StoreError> {
        let users = self.read(&self.users, "users")?;
        let active = users.iter().filter(|u| u.subscription.is_active()).count();
        Ok(UserTotals {
            users: users.len() as u64,
            active_subscriptions: active as u64,
        })
    }

    async fn total_views(&self) -> Result<u64, StoreError> {
        let courses = self.read(&self.courses, "courses")?;
        Ok(courses.iter().map(|c| c.views).sum())
    }
}

#[async_trait]
impl StatsLedger for MemoryStore {
    async fn insert(&self, bucket: StatsBucket) -> Result<(), StoreError> {
        self.write(&self.ledger, "stats ledger")?.push(bucket);
        Ok(())
    }

    async fn latest(&self) -> Result<Option<StatsBucket>, StoreError> {
        let ledger = self.read(&self.ledger, "stats ledger")?;
        Ok(ledger.iter().max_by_key(|b| b.created_at).cloned())
    }

    async fn update(&self, bucket: StatsBucket) -> Result<(), StoreError> {
        let mut ledger = self.write(&self.ledger, "stats ledger")?;
        if let Some(slot) = ledger.iter_mut().find(|b| b.id == bucket.id) {
            *slot = bucket;
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StatsBucket>, StoreError> {
        let mut buckets = self.read(&self.ledger, "stats ledger")?.clone();
        buckets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        buckets.truncate(limit);
        Ok(buckets)
    }
}
