//! End-to-end console flow over a snapshot: sign in, load every page, run
//! the campaign scripts and moderation actions, then persist and reload.

use std::sync::Arc;

use bnet_admin_console::session::{AdminSession, AllowListAuthenticator};
use bnet_admin_console::{announcements, campaigns, moderation, pages, AnnouncementDraft};
use bnet_billing::Tier;
use bnet_core::config::AppConfig;
use bnet_core::types::{EntityRecord, Report, Scope, SubscriptionRecord, REPORT_OPEN};
use bnet_store::{DocumentStore, MemoryStore, Snapshot};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap()
}

fn snapshot() -> Snapshot {
    let user = |id: &str, days_ago: i64, prefecture: &str| EntityRecord {
        id: id.into(),
        created_at: Some(now() - Duration::days(days_ago)),
        prefecture: Some(prefecture.into()),
        ..Default::default()
    };
    let sub = |path: &str, product: &str, status: &str| SubscriptionRecord {
        path: path.into(),
        product_id: Some(product.into()),
        status: Some(status.into()),
        created_at: Some(now() - Duration::days(1)),
        ..Default::default()
    };
    Snapshot {
        users: vec![user("u1", 0, "東京"), user("u2", 3, "東京"), user("u3", 45, "沖縄")],
        teams: vec![user("t1", 2, "沖縄"), user("t2", 90, "大阪")],
        subscriptions: vec![
            sub("users/u1/subscription/iOS", "com.sk.bNet.app.personal1month", "active"),
            sub("users/u2/subscription/iOS", "com.sk.bNet.app.personal1month", "active"),
            sub("users/u3/subscription/iOS", "com.sk.bNet.app.personal12month", "active"),
            sub("teams/t1/subscription/iOS", "com.sk.bNet.teamGold.yearly", "active"),
            sub("teams/t2/subscription/iOS", "com.sk.bNet.teamPlatina.monthly", "canceled"),
        ],
        announcements: vec![],
        reports: vec![Report {
            id: "r1".into(),
            content_type: "user_profile".into(),
            reason: "spam".into(),
            details: None,
            status: Some(REPORT_OPEN.into()),
            reporter_user_id: Some("u2".into()),
            reported_user_id: "u3".into(),
            created_at: Some(now() - Duration::hours(5)),
            resolved_at: None,
        }],
    }
}

#[tokio::test]
async fn test_console_flow() {
    let mut config = AppConfig::default();
    config.admin.allowed_emails = vec!["ops@b-net.jp".into()];
    let auth = AllowListAuthenticator::from_config(&config.admin);
    let store = Arc::new(MemoryStore::from_snapshot(snapshot()));

    assert!(AdminSession::sign_in(&auth, "intruder@b-net.jp", "pw", store.clone(), &config)
        .await
        .is_err());
    let session = AdminSession::sign_in(&auth, "ops@b-net.jp", "pw", store.clone(), &config)
        .await
        .unwrap();

    // Subscriptions page
    let summary = pages::load_subscription_summary(&session, now()).await.unwrap();
    assert_eq!(summary.personal_subscription_count(), 3);
    assert_eq!(summary.personal.monthly_revenue, 580.0 * 2.0 + 500.0);
    assert_eq!(summary.tier(Tier::TeamGold).yearly_count, 1);
    assert_eq!(summary.team_subscription_count(), 1);
    assert_eq!(summary.team_adoption_rate, 50.0);
    assert_eq!(summary.ignored_records, 1);
    assert_eq!(summary.trend.labels.last().map(String::as_str), Some("2025/6"));

    // Dashboard and growth pages
    let overview = pages::load_dashboard(&session, now()).await.unwrap();
    assert_eq!(overview.user_count, 3);
    assert_eq!(overview.users_this_month, 2);
    assert_eq!(overview.all_subscription_amount, 1660 + 150);

    let teams = pages::load_growth(&session, Scope::Team, now()).await.unwrap();
    assert_eq!(teams.summary.total, 2);
    assert_eq!(teams.summary.this_month, 1);

    // Campaign grant then revoke leaves the original documents
    let granted = campaigns::grant_campaign(&session, Scope::Team, now()).await.unwrap();
    assert_eq!((granted.checked, granted.created), (2, 0));
    let granted = campaigns::grant_campaign(&session, Scope::Personal, now()).await.unwrap();
    assert_eq!(granted.created, 0);

    store
        .put_subscription(SubscriptionRecord {
            path: "teams/t2/subscription/android".into(),
            product_id: Some("com.sk.bNet.teamPlatina.yearly".into()),
            status: Some("active".into()),
            campaign: Some(config.campaign.label.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    let revoked = campaigns::revoke_campaign_without_expiry(&session, Scope::Team)
        .await
        .unwrap();
    assert_eq!(revoked.checked, 3);
    assert_eq!(revoked.deleted, 1);

    // Announcements and moderation
    let draft = AnnouncementDraft {
        title: "メンテナンスのお知らせ".into(),
        content: "6/20 2:00〜4:00 はご利用いただけません".into(),
        is_important: true,
        prefectures_input: String::new(),
    };
    let created = announcements::create_announcement(&session, &draft).await.unwrap();
    assert!(created.prefectures.is_empty());

    assert_eq!(moderation::open_count(&session).await.unwrap(), 1);
    moderation::resolve_report(&session, "r1", now()).await.unwrap();
    assert_eq!(moderation::open_count(&session).await.unwrap(), 0);

    // Persist and reload
    let path = std::env::temp_dir().join(format!("bnet-flow-{}.json", uuid::Uuid::new_v4()));
    store.to_snapshot().save(&path).await.unwrap();
    let reloaded = Snapshot::load(&path).await.unwrap();
    assert_eq!(reloaded.announcements.len(), 1);
    assert_eq!(reloaded.subscriptions.len(), 5);
    assert!(reloaded.reports[0].resolved_at.is_some());
    tokio::fs::remove_file(&path).await.unwrap();

    session.close();
}
