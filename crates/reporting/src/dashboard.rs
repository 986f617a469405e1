//! Console landing dashboard: registered users/teams, this month's
//! increase and the subscription summary in one view.

use bnet_billing::aggregator::{floor_yen, AggregateSummary, AggregationInput, SubscriptionAggregator};
use bnet_core::calendar::MonthWindow;
use bnet_core::types::EntityRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub user_count: u64,
    pub team_count: u64,
    pub users_this_month: u64,
    pub teams_this_month: u64,
    /// Monthly-equivalent revenue across users and teams, floored to yen.
    pub all_subscription_amount: u64,
    pub subscriptions: AggregateSummary,
    pub generated_at: DateTime<Utc>,
}

impl DashboardOverview {
    pub fn build(
        aggregator: &SubscriptionAggregator,
        input: AggregationInput<'_>,
        now: DateTime<Utc>,
    ) -> Self {
        let month = MonthWindow::containing(now, aggregator.offset());
        let subscriptions = aggregator.aggregate(input, now);

        Self {
            user_count: input.users.len() as u64,
            team_count: input.teams.len() as u64,
            users_this_month: created_in(&month, input.users),
            teams_this_month: created_in(&month, input.teams),
            all_subscription_amount: floor_yen(subscriptions.total_monthly_revenue),
            subscriptions,
            generated_at: now,
        }
    }
}

fn created_in(month: &MonthWindow, entities: &[EntityRecord]) -> u64 {
    entities
        .iter()
        .filter_map(|e| e.created_at)
        .filter(|at| month.contains(*at))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnet_core::types::SubscriptionRecord;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_overview_counts() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap();
        let users = vec![
            EntityRecord {
                id: "u1".into(),
                created_at: Some(now),
                ..Default::default()
            },
            EntityRecord {
                id: "u2".into(),
                created_at: Some(now - Duration::days(40)),
                ..Default::default()
            },
        ];
        let teams = vec![EntityRecord {
            id: "t1".into(),
            created_at: Some(now - Duration::days(1)),
            ..Default::default()
        }];
        let subs = vec![SubscriptionRecord {
            path: "teams/t1/subscription/iOS".into(),
            product_id: Some("com.sk.bNet.teamPlatina.yearly".into()),
            status: Some("active".into()),
            created_at: Some(now),
            ..Default::default()
        }];

        let overview = DashboardOverview::build(
            &SubscriptionAggregator::default(),
            AggregationInput {
                subscriptions: &subs,
                users: &users,
                teams: &teams,
            },
            now,
        );

        assert_eq!(overview.user_count, 2);
        assert_eq!(overview.users_this_month, 1);
        assert_eq!(overview.teams_this_month, 1);
        assert_eq!(overview.all_subscription_amount, 1616);
        assert_eq!(overview.subscriptions.subscribed_team_count, 1);
        assert_eq!(overview.subscriptions.team_adoption_rate, 100.0);
    }
}
