//! Document shapes shared by the store, the aggregator and the console.
//!
//! Field names follow the hosted database documents (camelCase). Every
//! field a client can omit is optional so that malformed documents still
//! deserialize and are ignored downstream instead of failing a page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the per-parent subcollection holding subscription documents.
pub const SUBSCRIPTION_COLLECTION: &str = "subscription";

pub const STATUS_ACTIVE: &str = "active";

/// Which parent collection a document hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Personal,
    Team,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Personal, Scope::Team];

    /// Top-level collection name for the scope's parent entities.
    pub fn collection(&self) -> &'static str {
        match self {
            Scope::Personal => "users",
            Scope::Team => "teams",
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        match name {
            "users" => Some(Scope::Personal),
            "teams" => Some(Scope::Team),
            _ => None,
        }
    }

    /// Storage path of a subscription document.
    pub fn subscription_path(&self, parent_id: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.collection(),
            parent_id,
            SUBSCRIPTION_COLLECTION,
            doc_id
        )
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection())
    }
}

/// A user or team document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default, alias = "teamName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// A subscription document, addressed by its full storage path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub path: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    /// Status as written by whichever client version created the document.
    pub fn effective_status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .or(self.state.as_deref())
            .or(self.subscription_status.as_deref())
    }

    pub fn is_active(&self) -> bool {
        self.effective_status() == Some(STATUS_ACTIVE)
    }

    /// Scope and parent id parsed from `{collection}/{id}/subscription/{doc}`.
    pub fn parent(&self) -> Option<(Scope, &str)> {
        let segments: Vec<&str> = self.path.split('/').collect();
        let n = segments.len();
        if n < 4 || segments[n - 2] != SUBSCRIPTION_COLLECTION {
            return None;
        }
        let scope = Scope::from_collection(segments[n - 4])?;
        let parent_id = segments[n - 3];
        if parent_id.is_empty() {
            return None;
        }
        Some((scope, parent_id))
    }

    pub fn scope(&self) -> Option<Scope> {
        self.parent().map(|(scope, _)| scope)
    }

    pub fn doc_id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

/// An in-app announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_important: bool,
    /// Target prefectures; empty means every user.
    #[serde(default)]
    pub prefectures: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Fields of an announcement before the store assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub is_important: bool,
    pub prefectures: Vec<String>,
}

pub const REPORT_OPEN: &str = "open";
pub const REPORT_RESOLVED: &str = "resolved";

/// A user-submitted report about a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reporter_user_id: Option<String>,
    #[serde(default)]
    pub reported_user_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Anything other than an explicit `resolved` is treated as open.
    pub fn is_resolved(&self) -> bool {
        self.status.as_deref() == Some(REPORT_RESOLVED)
    }
}
