//! In-memory document store backed by DashMap for lock-free concurrent
//! access. Used by tests, fixtures and the snapshot-driven CLI.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bnet_core::types::{
    Announcement, EntityRecord, NewAnnouncement, Report, Scope, SubscriptionRecord,
};
use bnet_core::{AdminError, AdminResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::snapshot::Snapshot;
use crate::DocumentStore;

/// DashMap-backed [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, EntityRecord>,
    teams: DashMap<String, EntityRecord>,
    subscriptions: DashMap<String, SubscriptionRecord>,
    announcements: DashMap<String, Announcement>,
    reports: DashMap<String, Report>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a snapshot. Later duplicates of an id or path win.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        for user in snapshot.users {
            store.insert_entity(Scope::Personal, user);
        }
        for team in snapshot.teams {
            store.insert_entity(Scope::Team, team);
        }
        for sub in snapshot.subscriptions {
            store.subscriptions.insert(sub.path.clone(), sub);
        }
        for a in snapshot.announcements {
            store.announcements.insert(a.id.clone(), a);
        }
        for r in snapshot.reports {
            store.insert_report(r);
        }
        info!(
            users = store.users.len(),
            teams = store.teams.len(),
            subscriptions = store.subscriptions.len(),
            announcements = store.announcements.len(),
            reports = store.reports.len(),
            "MemoryStore seeded from snapshot"
        );
        store
    }

    /// Copy the current contents out, each collection ordered by key.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            users: sorted_values(&self.users),
            teams: sorted_values(&self.teams),
            subscriptions: sorted_values(&self.subscriptions),
            announcements: sorted_values(&self.announcements),
            reports: sorted_values(&self.reports),
        }
    }

    pub fn insert_entity(&self, scope: Scope, entity: EntityRecord) {
        self.entities(scope).insert(entity.id.clone(), entity);
    }

    pub fn insert_report(&self, report: Report) {
        self.reports.insert(report.id.clone(), report);
    }

    /// Make every call fail as if the remote store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AdminResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AdminError::DataSource("document store unavailable".into()));
        }
        Ok(())
    }

    fn entities(&self, scope: Scope) -> &DashMap<String, EntityRecord> {
        match scope {
            Scope::Personal => &self.users,
            Scope::Team => &self.teams,
        }
    }
}

fn sorted_values<T: Clone>(map: &DashMap<String, T>) -> Vec<T> {
    let mut entries: Vec<(String, T)> = map
        .iter()
        .map(|e| (e.key().clone(), e.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_entities(&self, scope: Scope) -> AdminResult<Vec<EntityRecord>> {
        self.check_available()?;
        Ok(sorted_values(self.entities(scope)))
    }

    async fn list_subscriptions(
        &self,
        scope: Scope,
        parent_id: &str,
    ) -> AdminResult<Vec<SubscriptionRecord>> {
        self.check_available()?;
        let mut subs: Vec<_> = self
            .subscriptions
            .iter()
            .filter(|e| e.value().parent() == Some((scope, parent_id)))
            .map(|e| e.value().clone())
            .collect();
        subs.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(subs)
    }

    async fn scan_subscriptions(&self) -> AdminResult<Vec<SubscriptionRecord>> {
        self.check_available()?;
        Ok(sorted_values(&self.subscriptions))
    }

    async fn get_subscription(&self, path: &str) -> AdminResult<Option<SubscriptionRecord>> {
        self.check_available()?;
        Ok(self.subscriptions.get(path).map(|e| e.value().clone()))
    }

    async fn put_subscription(&self, record: SubscriptionRecord) -> AdminResult<()> {
        self.check_available()?;
        if record.parent().is_none() {
            return Err(AdminError::Validation(format!(
                "not a subscription path: {}",
                record.path
            )));
        }
        debug!(path = %record.path, "Subscription written");
        self.subscriptions.insert(record.path.clone(), record);
        Ok(())
    }

    async fn delete_subscription(&self, path: &str) -> AdminResult<bool> {
        self.check_available()?;
        let removed = self.subscriptions.remove(path).is_some();
        debug!(path = %path, removed, "Subscription delete");
        Ok(removed)
    }

    async fn list_announcements(&self) -> AdminResult<Vec<Announcement>> {
        self.check_available()?;
        let mut list: Vec<_> = self
            .announcements
            .iter()
            .map(|e| e.value().clone())
            .collect();
        list.sort_by_key(|a| Reverse(a.timestamp));
        Ok(list)
    }

    async fn create_announcement(&self, new: NewAnnouncement) -> AdminResult<Announcement> {
        self.check_available()?;
        let announcement = Announcement {
            id: Uuid::new_v4().simple().to_string(),
            title: new.title,
            content: new.content,
            is_important: new.is_important,
            prefectures: new.prefectures,
            timestamp: Some(Utc::now()),
        };
        self.announcements
            .insert(announcement.id.clone(), announcement.clone());
        Ok(announcement)
    }

    async fn delete_announcement(&self, id: &str) -> AdminResult<bool> {
        self.check_available()?;
        Ok(self.announcements.remove(id).is_some())
    }

    async fn list_reports(&self) -> AdminResult<Vec<Report>> {
        self.check_available()?;
        let mut list: Vec<_> = self.reports.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|r| Reverse(r.created_at));
        Ok(list)
    }

    async fn get_report(&self, id: &str) -> AdminResult<Option<Report>> {
        self.check_available()?;
        Ok(self.reports.get(id).map(|e| e.value().clone()))
    }

    async fn count_reports_with_status(&self, status: &str) -> AdminResult<u64> {
        self.check_available()?;
        Ok(self
            .reports
            .iter()
            .filter(|e| e.value().status.as_deref() == Some(status))
            .count() as u64)
    }

    async fn update_report_status(
        &self,
        id: &str,
        status: &str,
        resolved_at: Option<DateTime<Utc>>,
    ) -> AdminResult<Report> {
        self.check_available()?;
        let mut entry = self
            .reports
            .get_mut(id)
            .ok_or_else(|| AdminError::not_found("report", id))?;
        entry.status = Some(status.to_string());
        entry.resolved_at = resolved_at;
        Ok(entry.clone())
    }
}
