//! Page loaders. Each fetches through the session's store, then hands the
//! records to the pure aggregation/reporting code.

use bnet_billing::{AggregateSummary, AggregationInput};
use bnet_core::types::{Scope, SubscriptionRecord};
use bnet_core::AdminResult;
use bnet_reporting::{DashboardOverview, GrowthReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::session::AdminSession;

/// What a page renders after its loader finishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "camelCase")]
pub enum PageState<T> {
    Ready(T),
    Empty,
    Failed(String),
}

impl<T> PageState<T> {
    /// Fold a loader result into a page state. Errors are logged and
    /// replaced by `failure_message`.
    pub fn from_result(
        result: AdminResult<T>,
        failure_message: &str,
        is_empty: impl FnOnce(&T) -> bool,
    ) -> Self {
        match result {
            Ok(value) if is_empty(&value) => PageState::Empty,
            Ok(value) => PageState::Ready(value),
            Err(e) => {
                error!(error = %e, "Page load failed");
                PageState::Failed(failure_message.to_string())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PageState::Ready(_))
    }
}

/// Subscriptions page: walks every user and team and reads their
/// `subscription` subcollection one parent at a time.
pub async fn load_subscription_summary(
    session: &AdminSession,
    now: DateTime<Utc>,
) -> AdminResult<AggregateSummary> {
    let store = session.store();
    let users = store.list_entities(Scope::Personal).await?;
    let teams = store.list_entities(Scope::Team).await?;

    let mut subscriptions: Vec<SubscriptionRecord> = Vec::new();
    for user in &users {
        subscriptions.extend(store.list_subscriptions(Scope::Personal, &user.id).await?);
    }
    for team in &teams {
        subscriptions.extend(store.list_subscriptions(Scope::Team, &team.id).await?);
    }

    let summary = session.aggregator().aggregate(
        AggregationInput {
            subscriptions: &subscriptions,
            users: &users,
            teams: &teams,
        },
        now,
    );
    info!(
        session_id = %session.id(),
        fetched = subscriptions.len(),
        "Subscription summary loaded"
    );
    Ok(summary)
}

/// Dashboard: entity counts plus one scan across every subscription
/// subcollection.
pub async fn load_dashboard(
    session: &AdminSession,
    now: DateTime<Utc>,
) -> AdminResult<DashboardOverview> {
    let store = session.store();
    let users = store.list_entities(Scope::Personal).await?;
    let teams = store.list_entities(Scope::Team).await?;
    let subscriptions = store.scan_subscriptions().await?;

    let overview = DashboardOverview::build(
        session.aggregator(),
        AggregationInput {
            subscriptions: &subscriptions,
            users: &users,
            teams: &teams,
        },
        now,
    );
    info!(
        session_id = %session.id(),
        users = overview.user_count,
        teams = overview.team_count,
        amount = overview.all_subscription_amount,
        "Dashboard loaded"
    );
    Ok(overview)
}

/// Users or teams page.
pub async fn load_growth(
    session: &AdminSession,
    scope: Scope,
    now: DateTime<Utc>,
) -> AdminResult<GrowthReport> {
    let entities = session.store().list_entities(scope).await?;
    let report = GrowthReport::build(
        scope,
        &entities,
        now,
        session.offset(),
        session.recent_limit(),
    );
    info!(
        session_id = %session.id(),
        scope = %scope,
        total = report.summary.total,
        "Growth report loaded"
    );
    Ok(report)
}

/// Loader message shown when the subscription summary cannot be fetched.
pub const SUBSCRIPTION_LOAD_FAILED: &str = "サブスクリプション情報の取得に失敗しました";
/// Loader message shown when the dashboard cannot be fetched.
pub const DASHBOARD_LOAD_FAILED: &str = "ダッシュボードの取得に失敗しました";

pub fn growth_load_failed(scope: Scope) -> &'static str {
    match scope {
        Scope::Personal => "ユーザー情報の取得に失敗しました",
        Scope::Team => "チーム情報の取得に失敗しました",
    }
}

/// Convenience for callers that want a rendered page rather than a result.
pub async fn subscription_page(session: &AdminSession, now: DateTime<Utc>) -> PageState<AggregateSummary> {
    PageState::from_result(
        load_subscription_summary(session, now).await,
        SUBSCRIPTION_LOAD_FAILED,
        AggregateSummary::is_empty,
    )
}
