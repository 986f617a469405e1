//! Subscription aggregator: per-plan counts, monthly-equivalent revenue,
//! adoption rates and the trailing six-month revenue/signup trend.
//!
//! Pure computation over a snapshot of documents. Fetching lives in the
//! store crate; the aggregator never fails and never touches I/O.

use std::collections::HashSet;

use bnet_core::calendar::{trailing_months, window_index, MonthWindow, TRAILING_MONTHS};
use bnet_core::types::{EntityRecord, Scope, SubscriptionRecord};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{Cadence, PlanCatalog, PlanEntry, Tier};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Documents one aggregation run reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationInput<'a> {
    pub subscriptions: &'a [SubscriptionRecord],
    pub users: &'a [EntityRecord],
    pub teams: &'a [EntityRecord],
}

/// Counts and revenue for a single tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
    pub monthly_count: u64,
    pub yearly_count: u64,
    /// Yearly plans counted at price / 12; unrounded.
    pub monthly_revenue: f64,
    /// Revenue if every current contract runs for twelve months.
    pub yearly_revenue: u64,
}

impl TierStats {
    pub fn subscription_count(&self) -> u64 {
        self.monthly_count + self.yearly_count
    }

    /// Count one subscription at its own plan's price.
    fn add(&mut self, plan: &PlanEntry) {
        match plan.cadence {
            Cadence::Monthly => self.monthly_count += 1,
            Cadence::Yearly => self.yearly_count += 1,
        }
        self.monthly_revenue += plan.monthly_equivalent();
        self.yearly_revenue += plan.annual_amount();
    }
}

/// Trailing six-month trend, oldest month first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTrend {
    pub labels: Vec<String>,
    /// Monthly-equivalent revenue of subscriptions created in each month.
    pub revenue: Vec<f64>,
    /// Users registered in each month.
    pub signups: Vec<u64>,
}

/// Output of one aggregation run. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub personal: TierStats,
    pub team_gold: TierStats,
    pub team_platina: TierStats,
    pub total_user_count: u64,
    pub total_team_count: u64,
    /// Distinct users with at least one counted subscription.
    pub subscribed_user_count: u64,
    /// Distinct teams with at least one counted subscription.
    pub subscribed_team_count: u64,
    pub user_adoption_rate: f64,
    pub team_adoption_rate: f64,
    pub total_monthly_revenue: f64,
    pub total_yearly_revenue: u64,
    /// Active, recognized subscriptions that went into the figures.
    pub counted_records: u64,
    /// Everything else: inactive, unknown product, or no parent scope.
    pub ignored_records: u64,
    pub trend: RevenueTrend,
    pub generated_at: DateTime<Utc>,
}

impl AggregateSummary {
    pub fn tier(&self, tier: Tier) -> &TierStats {
        match tier {
            Tier::Personal => &self.personal,
            Tier::TeamGold => &self.team_gold,
            Tier::TeamPlatina => &self.team_platina,
        }
    }

    pub fn personal_subscription_count(&self) -> u64 {
        self.personal.subscription_count()
    }

    pub fn team_subscription_count(&self) -> u64 {
        self.team_gold.subscription_count() + self.team_platina.subscription_count()
    }

    pub fn total_subscription_count(&self) -> u64 {
        self.personal_subscription_count() + self.team_subscription_count()
    }

    pub fn team_monthly_revenue(&self) -> f64 {
        self.team_gold.monthly_revenue + self.team_platina.monthly_revenue
    }

    pub fn team_yearly_revenue(&self) -> u64 {
        self.team_gold.yearly_revenue + self.team_platina.yearly_revenue
    }

    /// True when nothing was counted; the console shows an empty state.
    pub fn is_empty(&self) -> bool {
        self.counted_records == 0 && self.total_user_count == 0 && self.total_team_count == 0
    }
}

/// Display rounding for yen amounts: floor, never round-half-up.
pub fn floor_yen(amount: f64) -> u64 {
    if amount.is_finite() && amount > 0.0 {
        amount.floor() as u64
    } else {
        0
    }
}

/// `subscribed / total × 100`, 0 for an empty scope, capped at 100.
pub fn adoption_rate(subscribed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (subscribed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Computes [`AggregateSummary`] values against a fixed catalog.
#[derive(Debug, Clone)]
pub struct SubscriptionAggregator {
    catalog: PlanCatalog,
    offset: FixedOffset,
}

impl SubscriptionAggregator {
    /// `offset` is the time zone calendar months are cut in.
    pub fn new(catalog: PlanCatalog, offset: FixedOffset) -> Self {
        Self { catalog, offset }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Aggregate a snapshot as of `now`.
    pub fn aggregate(&self, input: AggregationInput<'_>, now: DateTime<Utc>) -> AggregateSummary {
        let windows = trailing_months(now, self.offset, TRAILING_MONTHS);
        let mut revenue = vec![0.0_f64; windows.len()];

        let mut personal = TierStats::default();
        let mut team_gold = TierStats::default();
        let mut team_platina = TierStats::default();
        let mut subscribed_users: HashSet<&str> = HashSet::new();
        let mut subscribed_teams: HashSet<&str> = HashSet::new();
        let mut counted = 0u64;
        let mut ignored = 0u64;

        for record in input.subscriptions {
            if !record.is_active() {
                ignored += 1;
                continue;
            }
            let Some(plan) = record.product_id.as_deref().and_then(|id| self.catalog.resolve(id))
            else {
                debug!(path = %record.path, product_id = ?record.product_id, "Skipping unknown product");
                ignored += 1;
                continue;
            };
            let Some((scope, parent_id)) = record.parent() else {
                debug!(path = %record.path, "Skipping subscription without parent scope");
                ignored += 1;
                continue;
            };
            if plan.tier.scope() != scope {
                debug!(path = %record.path, tier = ?plan.tier, "Skipping plan filed under wrong scope");
                ignored += 1;
                continue;
            }

            let stats = match plan.tier {
                Tier::Personal => &mut personal,
                Tier::TeamGold => &mut team_gold,
                Tier::TeamPlatina => &mut team_platina,
            };
            stats.add(plan);
            match scope {
                Scope::Personal => subscribed_users.insert(parent_id),
                Scope::Team => subscribed_teams.insert(parent_id),
            };
            counted += 1;

            if let Some(index) = record.created_at.and_then(|at| window_index(&windows, at)) {
                revenue[index] += plan.monthly_equivalent();
            }
        }

        let total_user_count = input.users.len() as u64;
        let total_team_count = input.teams.len() as u64;
        let subscribed_user_count = subscribed_users.len() as u64;
        let subscribed_team_count = subscribed_teams.len() as u64;

        let summary = AggregateSummary {
            total_monthly_revenue: personal.monthly_revenue
                + team_gold.monthly_revenue
                + team_platina.monthly_revenue,
            total_yearly_revenue: personal.yearly_revenue
                + team_gold.yearly_revenue
                + team_platina.yearly_revenue,
            personal,
            team_gold,
            team_platina,
            total_user_count,
            total_team_count,
            subscribed_user_count,
            subscribed_team_count,
            user_adoption_rate: adoption_rate(subscribed_user_count, total_user_count),
            team_adoption_rate: adoption_rate(subscribed_team_count, total_team_count),
            counted_records: counted,
            ignored_records: ignored,
            trend: RevenueTrend {
                labels: windows.iter().map(MonthWindow::label).collect(),
                signups: signups_per_window(&windows, input.users),
                revenue,
            },
            generated_at: now,
        };

        info!(
            counted = summary.counted_records,
            ignored = summary.ignored_records,
            monthly_revenue = floor_yen(summary.total_monthly_revenue),
            yearly_revenue = summary.total_yearly_revenue,
            "Subscription aggregation complete"
        );
        summary
    }
}

impl Default for SubscriptionAggregator {
    /// Built-in catalog, months cut in JST.
    fn default() -> Self {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap_or(Utc.fix());
        Self::new(PlanCatalog::default(), jst)
    }
}

fn signups_per_window(windows: &[MonthWindow], entities: &[EntityRecord]) -> Vec<u64> {
    let mut counts = vec![0u64; windows.len()];
    for entity in entities {
        if let Some(index) = entity.created_at.and_then(|at| window_index(windows, at)) {
            counts[index] += 1;
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
