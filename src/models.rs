//! Domain types shared by the store, the API layer, and the stats rollup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription status reported by the payment gateway once a first charge
/// has been verified. Only this value counts towards the dashboard's
/// `subscriptions` metric.
pub const SUBSCRIPTION_ACTIVE: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Gateway-assigned subscription handle stored on the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Option<String>,
    pub status: Option<String>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some(SUBSCRIPTION_ACTIVE)
    }
}

/// Caller-supplied media reference (storage-SaaS id + public URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub public_id: String,
    pub url: String,
}

impl MediaRef {
    /// Placeholder used at registration/course creation until the client
    /// uploads real media through the storage SaaS.
    pub fn placeholder() -> Self {
        Self {
            public_id: "pending".to_string(),
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub course_id: Uuid,
    pub poster: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub subscription: Subscription,
    pub avatar: MediaRef,
    pub playlist: Vec<PlaylistItem>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, phone: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            role: Role::User,
            password_hash,
            subscription: Subscription::default(),
            avatar: MediaRef::placeholder(),
            playlist: Vec::new(),
            reset_token_hash: None,
            reset_token_expires: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video: MediaRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: String,
    pub poster: MediaRef,
    pub views: u64,
    pub num_of_videos: usize,
    pub lectures: Vec<Lecture>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(title: String, description: String, category: String, created_by: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            category,
            created_by,
            poster: MediaRef::placeholder(),
            views: 0,
            num_of_videos: 0,
            lectures: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Verified gateway charge kept for the refund-window check on cancellation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub gateway_payment_id: String,
    pub gateway_subscription_id: String,
    pub gateway_signature: String,
    pub created_at: DateTime<Utc>,
}

/// One time-stamped snapshot of the aggregate metrics ledger.
///
/// The scheduler inserts zero-valued buckets to open reporting periods; the
/// aggregator rewrites the newest bucket in place as mutations arrive. The
/// "current" bucket is always found by maximum `created_at`, never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBucket {
    pub id: Uuid,
    pub users: u64,
    pub subscriptions: u64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

impl StatsBucket {
    pub fn open_at(created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            users: 0,
            subscriptions: 0,
            views: 0,
            created_at,
        }
    }
}
