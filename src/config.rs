use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use time::{Time, UtcOffset};

pub const DEFAULT_PUSH_ICON: &str = "/static/icons/icon-192x192.png";
pub const DEFAULT_PUSH_TTL_SECONDS: u32 = 24 * 60 * 60;
pub const DEFAULT_SMS_ENDPOINT: &str = "https://api.nexmo.com/v1/messages";
pub const DEFAULT_SMS_COUNTRY_CODE: &str = "57";

pub fn default_log_filter() -> &'static str {
    "agenda=info"
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub database_path: PathBuf,
    pub listen: SocketAddr,
    /// Offset of the business' wall clock; stored dates and times are local to it.
    pub utc_offset: UtcOffset,
    pub scheduler: SchedulerConfig,
    pub push: PushConfig,
    pub sms: Option<SmsConfig>,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub tick: std::time::Duration,
    pub daily_summary_at: Time,
}

#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    pub ttl_seconds: u32,
    pub icon: String,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_key: String,
    pub api_secret: String,
    pub from: String,
    pub country_code: String,
    pub endpoint: String,
}

/// Optional TOML file. Every field may be overridden by a CLI flag or env var.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub app_name: Option<String>,
    pub database: Option<PathBuf>,
    pub listen: Option<SocketAddr>,
    pub utc_offset: Option<String>,
    pub scheduler: FileSchedulerConfig,
    pub push: FilePushConfig,
    pub sms: FileSmsConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSchedulerConfig {
    pub enabled: Option<bool>,
    pub tick_seconds: Option<u64>,
    pub daily_summary_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilePushConfig {
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    pub ttl_seconds: Option<u32>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSmsConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub from: Option<String>,
    pub country_code: Option<String>,
    pub endpoint: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read config file {}: {err}", path.display()))?;
        Self::parse(&contents)
            .map_err(|err| format!("invalid config file {}: {err}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Agenda".to_string(),
            database_path: "agenda.db".into(),
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            utc_offset: UtcOffset::UTC,
            scheduler: SchedulerConfig {
                enabled: false,
                tick: std::time::Duration::from_secs(60),
                daily_summary_at: Time::from_hms(7, 0, 0).expect("valid time"),
            },
            push: PushConfig {
                ttl_seconds: DEFAULT_PUSH_TTL_SECONDS,
                icon: DEFAULT_PUSH_ICON.to_string(),
                ..PushConfig::default()
            },
            sms: None,
        }
    }
}
