use chrono::FixedOffset;
use serde::Deserialize;

use crate::error::{AdminError, AdminResult};

/// Root application configuration. Loaded from environment variables
/// with the prefix `BNET_ADMIN__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    /// Offset used to cut calendar months, in minutes east of UTC.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_campaign_label")]
    pub label: String,
    /// Document id used for granted subscriptions under `subscription/`.
    #[serde(default = "default_platform_doc_id")]
    pub platform_doc_id: String,
    #[serde(default = "default_personal_product_id")]
    pub personal_product_id: String,
    #[serde(default = "default_team_product_id")]
    pub team_product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub allowed_emails: Vec<String>,
}

// Default functions
fn default_utc_offset_minutes() -> i32 {
    9 * 60
}
fn default_recent_limit() -> usize {
    100
}
fn default_campaign_label() -> String {
    "キャンペーン中".to_string()
}
fn default_platform_doc_id() -> String {
    "iOS".to_string()
}
fn default_personal_product_id() -> String {
    "com.sk.bNet.app.personal12month".to_string()
}
fn default_team_product_id() -> String {
    "com.sk.bNet.teamPlatina.yearly".to_string()
}
fn default_snapshot_path() -> String {
    "data/snapshot.json".to_string()
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            label: default_campaign_label(),
            platform_doc_id: default_platform_doc_id(),
            personal_product_id: default_personal_product_id(),
            team_product_id: default_team_product_id(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reporting: ReportingConfig::default(),
            campaign: CampaignConfig::default(),
            store: StoreConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl ReportingConfig {
    /// The fixed offset month boundaries are computed in.
    pub fn offset(&self) -> AdminResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            AdminError::Config(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("BNET_ADMIN")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("admin.allowed_emails"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.reporting.utc_offset_minutes, 540);
        assert_eq!(config.campaign.platform_doc_id, "iOS");
        assert_eq!(config.campaign.label, "キャンペーン中");
        assert!(config.admin.allowed_emails.is_empty());
    }

    #[test]
    fn test_offset_bounds() {
        let jst = ReportingConfig::default().offset().unwrap();
        assert_eq!(jst.local_minus_utc(), 9 * 3600);

        let bad = ReportingConfig {
            utc_offset_minutes: 48 * 60,
            ..ReportingConfig::default()
        };
        assert!(matches!(bad.offset(), Err(AdminError::Config(_))));
    }

    #[test]
    fn test_load_from_env() {
        let vars = [
            ("BNET_ADMIN__ADMIN__ALLOWED_EMAILS", "a@x.jp,b@y.jp"),
            ("BNET_ADMIN__REPORTING__UTC_OFFSET_MINUTES", "0"),
            ("BNET_ADMIN__CAMPAIGN__LABEL", "夏,キャンペーン"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let loaded = AppConfig::load();
        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let config = loaded.unwrap();
        assert_eq!(config.admin.allowed_emails, vec!["a@x.jp", "b@y.jp"]);
        assert_eq!(config.reporting.utc_offset_minutes, 0);
        assert_eq!(config.reporting.offset().unwrap().local_minus_utc(), 0);
        assert_eq!(config.campaign.label, "夏,キャンペーン");
        assert_eq!(config.campaign.platform_doc_id, "iOS");
    }
}
