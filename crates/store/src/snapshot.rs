//! JSON export of every collection the console touches. The CLI loads one
//! into a [`MemoryStore`](crate::MemoryStore) and writes it back after
//! mutating commands.

use std::path::Path;

use bnet_core::types::{Announcement, EntityRecord, Report, SubscriptionRecord};
use bnet_core::AdminResult;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<EntityRecord>,
    #[serde(default)]
    pub teams: Vec<EntityRecord>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionRecord>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl Snapshot {
    /// Read a snapshot file. A missing file yields an empty snapshot.
    pub async fn load(path: &Path) -> AdminResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => {
                let snapshot: Snapshot = serde_json::from_str(&json)?;
                info!(path = %path.display(), "Snapshot loaded");
                Ok(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Snapshot not found, starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the snapshot as pretty JSON, creating parent directories.
    pub async fn save(&self, path: &Path) -> AdminResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        info!(path = %path.display(), "Snapshot saved");
        Ok(())
    }
}
