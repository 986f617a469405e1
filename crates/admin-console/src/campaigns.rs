//! One-off campaign scripts: grant every user or team a free yearly
//! subscription, and take back the granted ones that never got an expiry.
//!
//! Both walk the collection sequentially; a failed call aborts the run and
//! leaves the documents already written in place.

use bnet_core::types::{Scope, SubscriptionRecord, STATUS_ACTIVE};
use bnet_core::AdminResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::session::AdminSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantOutcome {
    pub scope: Scope,
    /// Entities visited.
    pub checked: u64,
    pub created: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeOutcome {
    pub scope: Scope,
    /// Subscription documents inspected.
    pub checked: u64,
    pub deleted: u64,
}

/// Create the campaign subscription for every entity of `scope` that has
/// no document at the platform slot yet. Running it twice creates nothing
/// the second time.
pub async fn grant_campaign(
    session: &AdminSession,
    scope: Scope,
    now: DateTime<Utc>,
) -> AdminResult<GrantOutcome> {
    let store = session.store();
    let campaign = session.campaign();
    let product_id = match scope {
        Scope::Personal => &campaign.personal_product_id,
        Scope::Team => &campaign.team_product_id,
    };

    let entities = store.list_entities(scope).await?;
    let mut outcome = GrantOutcome {
        scope,
        checked: 0,
        created: 0,
    };

    for entity in &entities {
        outcome.checked += 1;
        let path = scope.subscription_path(&entity.id, &campaign.platform_doc_id);
        if store.get_subscription(&path).await?.is_some() {
            debug!(path = %path, "Subscription exists, skipping");
            continue;
        }
        store
            .put_subscription(SubscriptionRecord {
                path,
                product_id: Some(product_id.clone()),
                status: Some(STATUS_ACTIVE.to_string()),
                created_at: Some(now),
                campaign: Some(campaign.label.clone()),
                ..Default::default()
            })
            .await?;
        outcome.created += 1;
    }

    info!(
        session_id = %session.id(),
        scope = %scope,
        checked = outcome.checked,
        created = outcome.created,
        "Campaign granted"
    );
    Ok(outcome)
}

/// Delete every campaign-labelled subscription of `scope` that has no
/// expiry date. Purchased subscriptions and dated campaign grants stay.
pub async fn revoke_campaign_without_expiry(
    session: &AdminSession,
    scope: Scope,
) -> AdminResult<RevokeOutcome> {
    let store = session.store();
    let label = session.campaign().label.as_str();

    let entities = store.list_entities(scope).await?;
    let mut outcome = RevokeOutcome {
        scope,
        checked: 0,
        deleted: 0,
    };

    for entity in &entities {
        for sub in store.list_subscriptions(scope, &entity.id).await? {
            outcome.checked += 1;
            if sub.campaign.as_deref() != Some(label) || sub.expiry_date.is_some() {
                continue;
            }
            if store.delete_subscription(&sub.path).await? {
                debug!(path = %sub.path, "Campaign subscription deleted");
                outcome.deleted += 1;
            }
        }
    }

    info!(
        session_id = %session.id(),
        scope = %scope,
        checked = outcome.checked,
        deleted = outcome.deleted,
        "Campaign revoked"
    );
    Ok(outcome)
}
