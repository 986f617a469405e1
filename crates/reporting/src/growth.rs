//! Growth statistics for one entity collection (users or teams).

use std::collections::HashMap;

use bnet_core::calendar::{trailing_months, window_index, MonthWindow, TRAILING_MONTHS};
use bnet_core::types::{EntityRecord, Scope};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::debug;

/// Bucket for entities without a prefecture.
pub const UNSET_PREFECTURE: &str = "未設定";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSummary {
    pub scope: Scope,
    pub total: u64,
    /// Label of the current month, e.g. `2025/6`.
    pub month_label: String,
    /// Created on or after the start of the current month.
    pub this_month: u64,
    pub last_month: u64,
    /// `(this − last) / last × 100`; `None` when last month had none.
    pub month_over_month_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupPoint {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefectureCount {
    pub prefecture: String,
    pub count: u64,
}

/// Everything the users/teams pages show.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthReport {
    pub summary: GrowthSummary,
    pub trend: Vec<SignupPoint>,
    pub prefectures: Vec<PrefectureCount>,
    pub recent: Vec<EntityRecord>,
}

impl GrowthReport {
    pub fn build(
        scope: Scope,
        entities: &[EntityRecord],
        now: DateTime<Utc>,
        offset: FixedOffset,
        recent_limit: usize,
    ) -> Self {
        let report = Self {
            summary: growth_summary(scope, entities, now, offset),
            trend: signup_trend(entities, now, offset),
            prefectures: prefecture_breakdown(entities),
            recent: recent_entities(entities, recent_limit),
        };
        debug!(
            scope = %scope,
            total = report.summary.total,
            this_month = report.summary.this_month,
            prefectures = report.prefectures.len(),
            "Growth report built"
        );
        report
    }
}

pub fn growth_summary(
    scope: Scope,
    entities: &[EntityRecord],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> GrowthSummary {
    let current = MonthWindow::containing(now, offset);
    let previous = current.shifted_back(1, offset);

    let mut this_month = 0u64;
    let mut last_month = 0u64;
    for created in entities.iter().filter_map(|e| e.created_at) {
        if created >= current.start {
            this_month += 1;
        } else if previous.contains(created) {
            last_month += 1;
        }
    }

    let month_over_month_rate = (last_month > 0)
        .then(|| (this_month as f64 - last_month as f64) / last_month as f64 * 100.0);

    GrowthSummary {
        scope,
        total: entities.len() as u64,
        month_label: current.label(),
        this_month,
        last_month,
        month_over_month_rate,
    }
}

/// New entities per month over the trailing window, oldest first.
pub fn signup_trend(entities: &[EntityRecord], now: DateTime<Utc>, offset: FixedOffset) -> Vec<SignupPoint> {
    let windows = trailing_months(now, offset, TRAILING_MONTHS);
    let mut counts = vec![0u64; windows.len()];
    for created in entities.iter().filter_map(|e| e.created_at) {
        if let Some(i) = window_index(&windows, created) {
            counts[i] += 1;
        }
    }
    windows
        .iter()
        .zip(counts)
        .map(|(w, count)| SignupPoint {
            label: w.label(),
            count,
        })
        .collect()
}

/// Entities per prefecture, largest first, ties by name.
pub fn prefecture_breakdown(entities: &[EntityRecord]) -> Vec<PrefectureCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for entity in entities {
        let prefecture = entity
            .prefecture
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(UNSET_PREFECTURE);
        *counts.entry(prefecture).or_default() += 1;
    }
    let mut list: Vec<_> = counts
        .into_iter()
        .map(|(prefecture, count)| PrefectureCount {
            prefecture: prefecture.to_string(),
            count,
        })
        .collect();
    list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.prefecture.cmp(&b.prefecture)));
    list
}

/// Newest `limit` entities; undated ones sort last.
pub fn recent_entities(entities: &[EntityRecord], limit: usize) -> Vec<EntityRecord> {
    let mut list = entities.to_vec();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list.truncate(limit);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap()
    }

    fn entity(id: &str, days_ago: Option<i64>, prefecture: Option<&str>) -> EntityRecord {
        EntityRecord {
            id: id.into(),
            created_at: days_ago.map(|d| now() - Duration::days(d)),
            prefecture: prefecture.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn test_growth_summary_rate() {
        let entities = vec![
            entity("a", Some(0), None),
            entity("b", Some(1), None),
            entity("c", Some(2), None),
            entity("d", Some(31), None),
            entity("e", Some(35), None),
            entity("f", Some(200), None),
            entity("g", None, None),
        ];
        let summary = growth_summary(Scope::Team, &entities, now(), jst());
        assert_eq!(summary.total, 7);
        assert_eq!(summary.this_month, 3);
        assert_eq!(summary.last_month, 2);
        assert_eq!(summary.month_over_month_rate, Some(50.0));
        assert_eq!(summary.month_label, "2025/6");
    }

    #[test]
    fn test_growth_rate_absent_without_last_month() {
        let entities = vec![entity("a", Some(0), None)];
        let summary = growth_summary(Scope::Personal, &entities, now(), jst());
        assert_eq!(summary.month_over_month_rate, None);
    }

    #[test]
    fn test_signup_trend_six_points() {
        let entities = vec![entity("a", Some(0), None), entity("b", Some(62), None)];
        let trend = signup_trend(&entities, now(), jst());
        assert_eq!(trend.len(), 6);
        assert_eq!(trend[5].label, "2025/6");
        assert_eq!(trend[5].count, 1);
        assert_eq!(trend[3].label, "2025/4");
        assert_eq!(trend[3].count, 1);
    }

    #[test]
    fn test_prefecture_breakdown() {
        let entities = vec![
            entity("a", None, Some("東京")),
            entity("b", None, Some("沖縄")),
            entity("c", None, Some("沖縄")),
            entity("d", None, None),
            entity("e", None, Some("  ")),
        ];
        let breakdown = prefecture_breakdown(&entities);
        assert_eq!(breakdown[0].count, 2);
        assert_eq!(breakdown.len(), 3);
        let unset = breakdown.iter().find(|p| p.prefecture == UNSET_PREFECTURE).unwrap();
        assert_eq!(unset.count, 2);
    }

    #[test]
    fn test_recent_entities_limit_and_order() {
        let entities = vec![
            entity("old", Some(10), None),
            entity("undated", None, None),
            entity("new", Some(1), None),
        ];
        let recent = recent_entities(&entities, 2);
        let ids: Vec<_> = recent.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
