//! B-Net admin CLI: dashboard, subscription and growth reports, campaign
//! scripts, announcements and report moderation over a snapshot file.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use bnet_admin_console::pages::{self, PageState};
use bnet_admin_console::session::{AdminSession, AllowListAuthenticator};
use bnet_admin_console::{announcements, campaigns, moderation, AnnouncementDraft};
use bnet_billing::aggregator::floor_yen;
use bnet_billing::{AggregateSummary, Tier};
use bnet_core::config::AppConfig;
use bnet_core::types::Scope;
use bnet_reporting::{DashboardOverview, GrowthReport};
use bnet_store::{MemoryStore, Snapshot};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "bnet-admin")]
#[command(about = "B-Net administration console")]
#[command(version)]
struct Cli {
    /// Snapshot file to read and write (overrides config)
    #[arg(long, env = "BNET_ADMIN__STORE__SNAPSHOT_PATH")]
    data: Option<PathBuf>,

    /// Administrator email
    #[arg(long, env = "BNET_ADMIN_EMAIL")]
    email: String,

    /// Administrator password
    #[arg(long, env = "BNET_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    /// Print JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Registered users/teams, this month's increase and revenue
    Dashboard,

    /// Subscription counts, revenue and the six-month trend
    Subscriptions,

    /// Growth, prefecture breakdown and recent registrations
    Growth {
        #[arg(value_enum)]
        scope: ScopeArg,
    },

    /// Campaign subscription scripts
    Campaign {
        #[command(subcommand)]
        action: CampaignAction,
    },

    /// In-app announcements
    Notice {
        #[command(subcommand)]
        action: NoticeAction,
    },

    /// User reports
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },
}

#[derive(Subcommand, Debug)]
enum CampaignAction {
    /// Grant the campaign subscription to every entity without one
    Grant {
        #[arg(value_enum)]
        scope: ScopeArg,
        /// Skip the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Delete campaign subscriptions that have no expiry date
    Revoke {
        #[arg(value_enum)]
        scope: ScopeArg,
        /// Skip the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum NoticeAction {
    /// List announcements, newest first
    List,
    /// Publish an announcement
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value_t = false)]
        important: bool,
        /// Comma-separated prefectures (default: all)
        #[arg(long, default_value = "")]
        prefectures: String,
    },
    /// Delete an announcement by id
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ReportsAction {
    /// List reports, newest first
    List,
    /// Show one report
    Show { id: String },
    /// Mark a report resolved
    Resolve { id: String },
    /// Reopen a resolved report
    Reopen { id: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Users,
    Teams,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Users => Scope::Personal,
            ScopeArg::Teams => Scope::Team,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bnet_admin=info,bnet_admin_console=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(data) = &cli.data {
        config.store.snapshot_path = data.display().to_string();
    }
    let snapshot_path = PathBuf::from(&config.store.snapshot_path);

    info!(
        snapshot = %snapshot_path.display(),
        utc_offset_minutes = config.reporting.utc_offset_minutes,
        "bnet-admin starting"
    );

    let store = Arc::new(MemoryStore::from_snapshot(Snapshot::load(&snapshot_path).await?));
    let auth = AllowListAuthenticator::from_config(&config.admin);
    let session =
        AdminSession::sign_in(&auth, &cli.email, &cli.password, store.clone(), &config).await?;

    let out = Output { json: cli.json };
    let now = Utc::now();
    let mutated = match cli.command {
        Commands::Dashboard => {
            let page = PageState::from_result(
                pages::load_dashboard(&session, now).await,
                pages::DASHBOARD_LOAD_FAILED,
                |_| false,
            );
            out.page(page, |o| print_dashboard(o, session.offset()))?;
            false
        }
        Commands::Subscriptions => {
            let page = pages::subscription_page(&session, now).await;
            out.page(page, print_subscriptions)?;
            false
        }
        Commands::Growth { scope } => {
            let scope = Scope::from(scope);
            let page = PageState::from_result(
                pages::load_growth(&session, scope, now).await,
                pages::growth_load_failed(scope),
                |r| r.summary.total == 0,
            );
            out.page(page, |r| print_growth(r, session.offset()))?;
            false
        }
        Commands::Campaign { action } => cmd_campaign(&session, &out, action, now).await?,
        Commands::Notice { action } => cmd_notice(&session, &out, action).await?,
        Commands::Reports { action } => cmd_reports(&session, &out, action, now).await?,
    };

    if mutated {
        store.to_snapshot().save(&snapshot_path).await?;
    }
    session.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_campaign(
    session: &AdminSession,
    out: &Output,
    action: CampaignAction,
    now: DateTime<Utc>,
) -> anyhow::Result<bool> {
    match action {
        CampaignAction::Grant { scope, yes } => {
            let scope = Scope::from(scope);
            let prompt = format!(
                "Grant \"{}\" subscriptions to every entry in {}?",
                session.campaign().label,
                scope.collection()
            );
            if !yes && !confirm(&prompt)? {
                eprintln!("Cancelled.");
                return Ok(false);
            }
            let outcome = campaigns::grant_campaign(session, scope, now).await?;
            out.emit(&outcome, |o| {
                println!("Checked {} {}, created {}.", o.checked, scope.collection(), o.created)
            })?;
            Ok(outcome.created > 0)
        }
        CampaignAction::Revoke { scope, yes } => {
            let scope = Scope::from(scope);
            let prompt = format!(
                "Delete \"{}\" subscriptions without an expiry date in {}?",
                session.campaign().label,
                scope.collection()
            );
            if !yes && !confirm(&prompt)? {
                eprintln!("Cancelled.");
                return Ok(false);
            }
            let outcome = campaigns::revoke_campaign_without_expiry(session, scope).await?;
            out.emit(&outcome, |o| {
                println!("Checked {} subscriptions, deleted {}.", o.checked, o.deleted)
            })?;
            Ok(outcome.deleted > 0)
        }
    }
}

async fn cmd_notice(session: &AdminSession, out: &Output, action: NoticeAction) -> anyhow::Result<bool> {
    let offset = session.offset();
    match action {
        NoticeAction::List => {
            let list = announcements::list_announcements(session).await?;
            out.emit(&list, |list| {
                if list.is_empty() {
                    println!("No announcements.");
                }
                for a in list {
                    let scope = if a.prefectures.is_empty() {
                        "全国".to_string()
                    } else {
                        a.prefectures.join(",")
                    };
                    println!(
                        "{}  {}  {}{}  [{}]",
                        a.id,
                        format_time(a.timestamp, offset),
                        if a.is_important { "★ " } else { "" },
                        a.title,
                        scope
                    );
                }
            })?;
            Ok(false)
        }
        NoticeAction::Create {
            title,
            content,
            important,
            prefectures,
        } => {
            let draft = AnnouncementDraft {
                title,
                content,
                is_important: important,
                prefectures_input: prefectures,
            };
            let created = announcements::create_announcement(session, &draft).await?;
            out.emit(&created, |a| println!("Created announcement {}", a.id))?;
            Ok(true)
        }
        NoticeAction::Delete { id, yes } => {
            if !yes && !confirm("このお知らせを削除しますか？")? {
                eprintln!("Cancelled.");
                return Ok(false);
            }
            announcements::delete_announcement(session, &id).await?;
            out.emit(&serde_json::json!({ "deleted": id }), |_| {
                println!("Deleted announcement {id}")
            })?;
            Ok(true)
        }
    }
}

async fn cmd_reports(
    session: &AdminSession,
    out: &Output,
    action: ReportsAction,
    now: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let offset = session.offset();
    match action {
        ReportsAction::List => {
            let reports = moderation::list_reports(session).await?;
            let open = moderation::open_count(session).await?;
            out.emit(&reports, |reports| {
                println!("Open reports: {open}");
                println!();
                for r in reports {
                    println!(
                        "{:<24} {}  {:<8} {:<8} {:<12} reported={}",
                        r.id,
                        format_time(r.created_at, offset),
                        if r.is_resolved() { "対応済み" } else { "未対応" },
                        moderation::content_type_label(&r.content_type),
                        moderation::reason_label(&r.reason),
                        r.reported_user_id
                    );
                }
            })?;
            Ok(false)
        }
        ReportsAction::Show { id } => {
            let r = moderation::get_report(session, &id).await?;
            out.emit(&r, |r| {
                println!("Report {}", r.id);
                println!("  Type:       {}", moderation::content_type_label(&r.content_type));
                println!("  Reason:     {}", moderation::reason_label(&r.reason));
                println!("  Details:    {}", r.details.as_deref().unwrap_or("-"));
                println!("  Reporter:   {}", r.reporter_user_id.as_deref().unwrap_or("-"));
                println!("  Reported:   {}", r.reported_user_id);
                println!("  Status:     {}", r.status.as_deref().unwrap_or("open"));
                println!("  Created:    {}", format_time(r.created_at, offset));
                println!("  Resolved:   {}", format_time(r.resolved_at, offset));
            })?;
            Ok(false)
        }
        ReportsAction::Resolve { id } => {
            let r = moderation::resolve_report(session, &id, now).await?;
            out.emit(&r, |r| println!("Resolved report {}", r.id))?;
            Ok(true)
        }
        ReportsAction::Reopen { id } => {
            let r = moderation::reopen_report(session, &id).await?;
            out.emit(&r, |r| println!("Reopened report {}", r.id))?;
            Ok(true)
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }

    fn page<T: Serialize>(&self, page: PageState<T>, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        match page {
            PageState::Ready(value) => self.emit(&value, text),
            PageState::Empty if self.json => {
                println!("{}", serde_json::to_string_pretty(&PageState::<T>::Empty)?);
                Ok(())
            }
            PageState::Empty => {
                println!("No data.");
                Ok(())
            }
            PageState::Failed(message) => anyhow::bail!(message),
        }
    }
}

fn print_dashboard(o: &DashboardOverview, offset: FixedOffset) {
    println!("=== B-Net Dashboard ({}) ===", format_time(Some(o.generated_at), offset));
    println!();
    println!("  Registered users:     {:>8}  (+{} this month)", o.user_count, o.users_this_month);
    println!("  Registered teams:     {:>8}  (+{} this month)", o.team_count, o.teams_this_month);
    println!("  Subscriptions:        {:>8}", o.subscriptions.total_subscription_count());
    println!("  Monthly revenue:      {:>8}", format_yen(o.all_subscription_amount));
}

fn print_subscriptions(s: &AggregateSummary) {
    println!("=== Subscriptions ===");
    println!();
    println!(
        "  {:<14} {:>8} {:>8} {:>12} {:>14}",
        "Plan", "Monthly", "Yearly", "Revenue/mo", "Revenue/yr"
    );
    for tier in Tier::ALL {
        let stats = s.tier(tier);
        println!(
            "  {:<14} {:>8} {:>8} {:>12} {:>14}",
            tier_label(tier),
            stats.monthly_count,
            stats.yearly_count,
            format_yen(floor_yen(stats.monthly_revenue)),
            format_yen(stats.yearly_revenue)
        );
    }
    println!(
        "  {:<14} {:>8} {:>8} {:>12} {:>14}",
        "Total",
        "",
        s.total_subscription_count(),
        format_yen(floor_yen(s.total_monthly_revenue)),
        format_yen(s.total_yearly_revenue)
    );
    println!();
    println!(
        "  Users:  {}/{} subscribed ({:.1}%)",
        s.subscribed_user_count, s.total_user_count, s.user_adoption_rate
    );
    println!(
        "  Teams:  {}/{} subscribed ({:.1}%)",
        s.subscribed_team_count, s.total_team_count, s.team_adoption_rate
    );
    println!();
    println!("  Last six months");
    for ((label, revenue), signups) in s
        .trend
        .labels
        .iter()
        .zip(&s.trend.revenue)
        .zip(&s.trend.signups)
    {
        println!(
            "    {:<8} {:>12}  signups {:>5}",
            label,
            format_yen(floor_yen(*revenue)),
            signups
        );
    }
}

fn print_growth(r: &GrowthReport, offset: FixedOffset) {
    let s = &r.summary;
    println!("=== {} ===", s.scope.collection());
    println!();
    println!("  Total:        {}", s.total);
    println!("  {} new:   {}", s.month_label, s.this_month);
    println!("  Last month:   {}", s.last_month);
    match s.month_over_month_rate {
        Some(rate) => println!("  Growth:       {rate:+.1}%"),
        None => println!("  Growth:       -"),
    }
    println!();
    println!("  Registrations");
    for point in &r.trend {
        println!("    {:<8} {:>5}", point.label, point.count);
    }
    println!();
    println!("  Prefectures");
    for p in &r.prefectures {
        println!("    {:<10} {:>5}", p.prefecture, p.count);
    }
    println!();
    println!("  Recent");
    for e in &r.recent {
        println!(
            "    {:<28} {}  {:<10} {}",
            e.id,
            format_time(e.created_at, offset),
            e.prefecture.as_deref().unwrap_or("-"),
            e.display_name.as_deref().unwrap_or("")
        );
    }
}

fn tier_label(tier: Tier) -> &'static str {
    match tier {
        Tier::Personal => "Personal",
        Tier::TeamGold => "Team Gold",
        Tier::TeamPlatina => "Team Platina",
    }
}

fn format_time(at: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    at.map(|t| t.with_timezone(&offset).format("%Y/%m/%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_yen(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("¥{grouped}")
}

/// Prompts go to stderr; stdout carries command output only.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    confirm_with(prompt, std::io::stdin().lock(), std::io::stderr())
}

fn confirm_with(prompt: &str, mut input: impl BufRead, mut prompt_out: impl Write) -> anyhow::Result<bool> {
    write!(prompt_out, "{prompt} [y/N] ")?;
    prompt_out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_yen() {
        assert_eq!(format_yen(0), "¥0");
        assert_eq!(format_yen(580), "¥580");
        assert_eq!(format_yen(16150), "¥16,150");
        assert_eq!(format_yen(1234567), "¥1,234,567");
    }

    #[test]
    fn test_cli_parses_campaign() {
        let cli = Cli::try_parse_from([
            "bnet-admin",
            "--email",
            "ops@b-net.jp",
            "--password",
            "pw",
            "campaign",
            "grant",
            "teams",
            "--yes",
        ])
        .unwrap();
        match cli.command {
            Commands::Campaign {
                action: CampaignAction::Grant { scope, yes },
            } => {
                assert_eq!(Scope::from(scope), Scope::Team);
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_format_time_uses_offset() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let at = DateTime::parse_from_rfc3339("2025-05-31T15:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_time(Some(at), jst), "2025/06/01 00:30");
        assert_eq!(format_time(None, jst), "-");
    }

    #[test]
    fn test_confirm_reads_answer_and_prompts_to_writer() {
        let mut prompt_out = Vec::new();
        assert!(confirm_with("削除しますか？", &b"Y\n"[..], &mut prompt_out).unwrap());
        assert_eq!(String::from_utf8(prompt_out).unwrap(), "削除しますか？ [y/N] ");

        assert!(!confirm_with("削除しますか？", &b"\n"[..], std::io::sink()).unwrap());
        assert!(!confirm_with("削除しますか？", &b""[..], std::io::sink()).unwrap());
    }

    #[test]
    fn test_notice_delete_requires_confirmation_flag() {
        let args = ["bnet-admin", "--email", "ops@b-net.jp", "--password", "pw", "notice", "delete", "n1"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Notice {
                action: NoticeAction::Delete { id, yes },
            } => {
                assert_eq!(id, "n1");
                assert!(!yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(args.iter().copied().chain(["--yes"])).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Notice {
                action: NoticeAction::Delete { yes: true, .. }
            }
        ));
    }
}
