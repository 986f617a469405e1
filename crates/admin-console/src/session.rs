//! Administrator sign-in and the session context every page runs with.
//!
//! A session is opened when the administrator enters a page and dropped
//! when they leave it; it owns the store handle, the aggregator and the
//! console settings, so no page reaches for global state.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bnet_billing::{PlanCatalog, SubscriptionAggregator};
use bnet_core::config::{AdminConfig, AppConfig, CampaignConfig};
use bnet_core::{AdminError, AdminResult};
use bnet_store::DocumentStore;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// The signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Credential check performed by the hosted auth provider.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AdminResult<AdminIdentity>;
}

/// Accepts configured administrator addresses. Stand-in for the hosted
/// provider when running against snapshots.
#[derive(Debug, Clone, Default)]
pub struct AllowListAuthenticator {
    allowed: HashSet<String>,
}

impl AllowListAuthenticator {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(&config.allowed_emails)
    }
}

#[async_trait]
impl Authenticator for AllowListAuthenticator {
    async fn sign_in(&self, email: &str, password: &str) -> AdminResult<AdminIdentity> {
        let normalized = email.trim().to_lowercase();
        if password.is_empty() || !self.allowed.contains(&normalized) {
            warn!(email = %normalized, "Admin sign-in rejected");
            return Err(AdminError::Unauthorized("invalid email or password".into()));
        }
        Ok(AdminIdentity {
            email: normalized,
            signed_in_at: Utc::now(),
        })
    }
}

/// Context passed to every page-level operation.
pub struct AdminSession {
    id: Uuid,
    identity: AdminIdentity,
    store: Arc<dyn DocumentStore>,
    aggregator: SubscriptionAggregator,
    campaign: CampaignConfig,
    recent_limit: usize,
}

impl AdminSession {
    /// Build a session for an already authenticated administrator.
    pub fn new(
        identity: AdminIdentity,
        store: Arc<dyn DocumentStore>,
        config: &AppConfig,
    ) -> AdminResult<Self> {
        let offset = config.reporting.offset()?;
        let session = Self {
            id: Uuid::new_v4(),
            identity,
            store,
            aggregator: SubscriptionAggregator::new(PlanCatalog::default(), offset),
            campaign: config.campaign.clone(),
            recent_limit: config.reporting.recent_limit,
        };
        info!(
            session_id = %session.id,
            admin = %session.identity.email,
            utc_offset_secs = offset.local_minus_utc(),
            "Admin session opened"
        );
        Ok(session)
    }

    /// Authenticate and open a session in one step.
    pub async fn sign_in(
        auth: &dyn Authenticator,
        email: &str,
        password: &str,
        store: Arc<dyn DocumentStore>,
        config: &AppConfig,
    ) -> AdminResult<Self> {
        let identity = auth.sign_in(email, password).await?;
        Self::new(identity, store, config)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &AdminIdentity {
        &self.identity
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn aggregator(&self) -> &SubscriptionAggregator {
        &self.aggregator
    }

    pub fn offset(&self) -> FixedOffset {
        self.aggregator.offset()
    }

    pub fn campaign(&self) -> &CampaignConfig {
        &self.campaign
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// End the session explicitly (same as dropping it).
    pub fn close(self) {}
}

impl Drop for AdminSession {
    fn drop(&mut self) {
        let held = Utc::now() - self.identity.signed_in_at;
        info!(
            session_id = %self.id,
            admin = %self.identity.email,
            held_secs = held.num_seconds(),
            "Admin session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnet_store::MemoryStore;

    #[tokio::test]
    async fn test_allow_list_sign_in() {
        let auth = AllowListAuthenticator::new(["Ops@B-Net.jp", " "]);

        let identity = auth.sign_in("ops@b-net.jp ", "hunter2").await.unwrap();
        assert_eq!(identity.email, "ops@b-net.jp");

        let err = auth.sign_in("ops@b-net.jp", "").await.unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized(_)));
        assert!(auth.sign_in("someone@else.jp", "pw").await.is_err());
    }

    #[tokio::test]
    async fn test_session_carries_config() {
        let mut config = AppConfig::default();
        config.reporting.utc_offset_minutes = 0;
        config.admin.allowed_emails = vec!["ops@b-net.jp".into()];
        let auth = AllowListAuthenticator::from_config(&config.admin);

        let session = AdminSession::sign_in(
            &auth,
            "ops@b-net.jp",
            "pw",
            Arc::new(MemoryStore::new()),
            &config,
        )
        .await
        .unwrap();
        assert_eq!(session.offset().local_minus_utc(), 0);
        assert_eq!(session.recent_limit(), 100);
        assert_eq!(session.campaign().platform_doc_id, "iOS");
        session.close();
    }

    #[tokio::test]
    async fn test_invalid_offset_rejected() {
        let mut config = AppConfig::default();
        config.reporting.utc_offset_minutes = 100 * 60;
        let identity = AdminIdentity {
            email: "ops@b-net.jp".into(),
            signed_in_at: Utc::now(),
        };
        let result = AdminSession::new(identity, Arc::new(MemoryStore::new()), &config);
        assert!(matches!(result, Err(AdminError::Config(_))));
    }
}
