#![warn(clippy::unwrap_used)]

//! Data access for the admin console.
//!
//! [`DocumentStore`] is the seam between the console and the hosted
//! document database. [`MemoryStore`] implements it over `DashMap`s and
//! can be seeded from a JSON [`Snapshot`]; swap in a client for the
//! hosted database in production.

pub mod memory;
pub mod snapshot;

use async_trait::async_trait;
use bnet_core::types::{
    Announcement, EntityRecord, NewAnnouncement, Report, Scope, SubscriptionRecord,
};
use bnet_core::AdminResult;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use snapshot::Snapshot;

/// Read/write access to the console's collections. Every call is one
/// awaited round trip; callers issue them sequentially.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All user (`Personal`) or team (`Team`) documents.
    async fn list_entities(&self, scope: Scope) -> AdminResult<Vec<EntityRecord>>;

    /// Subscriptions stored under a single parent.
    async fn list_subscriptions(
        &self,
        scope: Scope,
        parent_id: &str,
    ) -> AdminResult<Vec<SubscriptionRecord>>;

    /// Every subscription across both scopes (collection-group scan).
    async fn scan_subscriptions(&self) -> AdminResult<Vec<SubscriptionRecord>>;

    async fn get_subscription(&self, path: &str) -> AdminResult<Option<SubscriptionRecord>>;

    /// Create or overwrite the document at `record.path`.
    async fn put_subscription(&self, record: SubscriptionRecord) -> AdminResult<()>;

    /// Returns whether a document was removed.
    async fn delete_subscription(&self, path: &str) -> AdminResult<bool>;

    /// Newest first.
    async fn list_announcements(&self) -> AdminResult<Vec<Announcement>>;

    /// Assigns id and server timestamp.
    async fn create_announcement(&self, new: NewAnnouncement) -> AdminResult<Announcement>;

    async fn delete_announcement(&self, id: &str) -> AdminResult<bool>;

    /// Newest first.
    async fn list_reports(&self) -> AdminResult<Vec<Report>>;

    async fn get_report(&self, id: &str) -> AdminResult<Option<Report>>;

    async fn count_reports_with_status(&self, status: &str) -> AdminResult<u64>;

    /// Set `status` and `resolvedAt`; `None` clears the resolution time.
    async fn update_report_status(
        &self,
        id: &str,
        status: &str,
        resolved_at: Option<DateTime<Utc>>,
    ) -> AdminResult<Report>;
}
