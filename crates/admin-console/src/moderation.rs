//! User report review. Reports arrive from the app with status `open`;
//! an administrator resolves them or reopens a resolved one.

use bnet_core::types::{Report, REPORT_OPEN, REPORT_RESOLVED};
use bnet_core::{AdminError, AdminResult};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::session::AdminSession;

/// Display label for a report's `contentType`.
pub fn content_type_label(content_type: &str) -> &str {
    match content_type {
        "user_profile" => "ユーザー",
        "team_profile" => "チーム",
        other => other,
    }
}

/// Display label for a report's `reason`.
pub fn reason_label(reason: &str) -> &str {
    match reason {
        "inappropriate" => "不適切な内容",
        "spam" => "スパム・宣伝",
        "abuse" => "暴言・嫌がらせ",
        "other" => "その他",
        other => other,
    }
}

/// Newest first.
pub async fn list_reports(session: &AdminSession) -> AdminResult<Vec<Report>> {
    session.store().list_reports().await
}

pub async fn get_report(session: &AdminSession, id: &str) -> AdminResult<Report> {
    session
        .store()
        .get_report(id)
        .await?
        .ok_or_else(|| AdminError::not_found("report", id))
}

pub async fn resolve_report(
    session: &AdminSession,
    id: &str,
    now: DateTime<Utc>,
) -> AdminResult<Report> {
    let report = session
        .store()
        .update_report_status(id, REPORT_RESOLVED, Some(now))
        .await?;
    info!(session_id = %session.id(), report_id = %id, "Report resolved");
    Ok(report)
}

pub async fn reopen_report(session: &AdminSession, id: &str) -> AdminResult<Report> {
    let report = session
        .store()
        .update_report_status(id, REPORT_OPEN, None)
        .await?;
    info!(session_id = %session.id(), report_id = %id, "Report reopened");
    Ok(report)
}

/// Count for the header badge.
pub async fn open_count(session: &AdminSession) -> AdminResult<u64> {
    session.store().count_reports_with_status(REPORT_OPEN).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bnet_core::config::AppConfig;
    use bnet_store::MemoryStore;
    use chrono::{Duration, TimeZone};

    use crate::session::AdminIdentity;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap()
    }

    fn report(id: &str, hours_ago: i64) -> Report {
        Report {
            id: id.into(),
            content_type: "team_profile".into(),
            reason: "abuse".into(),
            details: Some("チーム紹介文に暴言".into()),
            status: Some(REPORT_OPEN.into()),
            reporter_user_id: Some("u2".into()),
            reported_user_id: "u7".into(),
            created_at: Some(now() - Duration::hours(hours_ago)),
            resolved_at: None,
        }
    }

    fn session() -> (Arc<MemoryStore>, AdminSession) {
        let store = Arc::new(MemoryStore::new());
        store.insert_report(report("r1", 10));
        store.insert_report(report("r2", 1));
        let identity = AdminIdentity {
            email: "ops@b-net.jp".into(),
            signed_in_at: Utc::now(),
        };
        let session = AdminSession::new(identity, store.clone(), &AppConfig::default()).unwrap();
        (store, session)
    }

    #[test]
    fn test_labels() {
        assert_eq!(content_type_label("user_profile"), "ユーザー");
        assert_eq!(content_type_label("team_profile"), "チーム");
        assert_eq!(content_type_label("post"), "post");
        assert_eq!(reason_label("spam"), "スパム・宣伝");
        assert_eq!(reason_label("inappropriate"), "不適切な内容");
        assert_eq!(reason_label("abuse"), "暴言・嫌がらせ");
        assert_eq!(reason_label("other"), "その他");
        assert_eq!(reason_label("copyright"), "copyright");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_, session) = session();
        let ids: Vec<_> = list_reports(&session)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r2", "r1"]);
    }

    #[tokio::test]
    async fn test_resolve_and_reopen_follow_open_count() {
        let (_, session) = session();
        assert_eq!(open_count(&session).await.unwrap(), 2);

        let resolved = resolve_report(&session, "r1", now()).await.unwrap();
        assert!(resolved.is_resolved());
        assert_eq!(resolved.resolved_at, Some(now()));
        assert_eq!(open_count(&session).await.unwrap(), 1);

        let reopened = reopen_report(&session, "r1").await.unwrap();
        assert!(!reopened.is_resolved());
        assert_eq!(reopened.resolved_at, None);
        assert_eq!(open_count(&session).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_report() {
        let (_, session) = session();
        let err = get_report(&session, "nope").await.unwrap_err();
        assert!(matches!(err, AdminError::NotFound { kind: "report", .. }));
        assert!(resolve_report(&session, "nope", now()).await.is_err());
    }
}
