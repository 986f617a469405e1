//! In-app announcements ("お知らせ") shown to app users, optionally limited
//! to a set of prefectures.

use bnet_core::types::{Announcement, NewAnnouncement};
use bnet_core::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::session::AdminSession;

/// Form input for a new announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_important: bool,
    /// Comma-separated prefecture names; empty means every prefecture.
    #[serde(default)]
    pub prefectures_input: String,
}

impl AnnouncementDraft {
    /// Trim and check the draft. Title and content must not be blank.
    pub fn validate(&self) -> AdminResult<NewAnnouncement> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() {
            return Err(AdminError::Validation("title must not be empty".into()));
        }
        if content.is_empty() {
            return Err(AdminError::Validation("content must not be empty".into()));
        }
        Ok(NewAnnouncement {
            title: title.to_string(),
            content: content.to_string(),
            is_important: self.is_important,
            prefectures: parse_prefectures(&self.prefectures_input),
        })
    }
}

pub fn parse_prefectures(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Newest first.
pub async fn list_announcements(session: &AdminSession) -> AdminResult<Vec<Announcement>> {
    session.store().list_announcements().await
}

pub async fn create_announcement(
    session: &AdminSession,
    draft: &AnnouncementDraft,
) -> AdminResult<Announcement> {
    let new = draft.validate()?;
    let created = session.store().create_announcement(new).await?;
    info!(
        session_id = %session.id(),
        announcement_id = %created.id,
        important = created.is_important,
        prefectures = created.prefectures.len(),
        "Announcement created"
    );
    Ok(created)
}

pub async fn delete_announcement(session: &AdminSession, id: &str) -> AdminResult<()> {
    if !session.store().delete_announcement(id).await? {
        return Err(AdminError::not_found("announcement", id));
    }
    info!(session_id = %session.id(), announcement_id = %id, "Announcement deleted");
    Ok(())
}
