use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::watch::domain::LocationId;
use crate::watch::eligibility::{weekday_from_index, EligibilityRules};
use crate::watch::notifier::{EmailSettings, DEFAULT_SMTP_HOST};
use crate::watch::policy::NotificationMode;
use crate::watch::service::WatchPlan;
use crate::watch::source::SourceConfig;

/// Layout of `latest_interview_date`, e.g. `December 31, 2025`.
pub const CUTOFF_DATE_FORMAT: &str = "%B %d, %Y";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Top-level configuration for a watcher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub plan: WatchPlan,
    pub source: SourceConfig,
    /// Absent when notifications should only be logged.
    pub email: Option<EmailSettings>,
    pub locations_file: Option<PathBuf>,
    pub telemetry: TelemetryConfig,
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

/// Values taken from the process environment (or `.env`) that win over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub gmail_app_password: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            log_level: non_empty_var("APP_LOG_LEVEL"),
            gmail_app_password: non_empty_var("GMAIL_APP_PASSWORD"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings file as written by users; every field is validated in [`WatchConfig::from_json`].
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    latest_interview_date: Option<String>,
    enrollment_location_id: Option<Vec<LocationId>>,
    weekday_filter_hour: Option<i64>,
    weekday_filter_day: Option<Vec<i64>>,
    no_spamming: Option<bool>,
    poll_interval: Option<i64>,
    gmail_sender: Option<String>,
    gmail_recipients: Option<Vec<String>>,
    gmail_app_password: Option<String>,
    smtp_host: Option<String>,
    logfile: Option<PathBuf>,
    locations_file: Option<PathBuf>,
    api_base_url: Option<String>,
    slot_limit: Option<i64>,
    request_timeout: Option<i64>,
}

impl WatchConfig {
    /// Reads the JSON settings file at `path`, applying `.env` and environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&raw, path.parent(), EnvOverrides::from_env())
    }

    /// Validates settings JSON. Relative paths resolve against `base_dir`.
    pub fn from_json(
        raw: &str,
        base_dir: Option<&Path>,
        overrides: EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let settings: RawSettings = serde_json::from_str(raw).map_err(ConfigError::Json)?;
        Self::from_settings(settings, base_dir, overrides)
    }

    fn from_settings(
        settings: RawSettings,
        base_dir: Option<&Path>,
        overrides: EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let cutoff_raw = required(settings.latest_interview_date, "latest_interview_date")?;
        let cutoff_date = NaiveDate::parse_from_str(cutoff_raw.trim(), CUTOFF_DATE_FORMAT)
            .map_err(|err| {
                ConfigError::invalid(
                    "latest_interview_date",
                    format!("'{cutoff_raw}' is not a date like 'December 31, 2025' ({err})"),
                )
            })?;

        let mut locations = required(settings.enrollment_location_id, "enrollment_location_id")?;
        if locations.is_empty() {
            return Err(ConfigError::MissingSetting("enrollment_location_id"));
        }
        let mut seen = std::collections::HashSet::new();
        locations.retain(|location| seen.insert(location.clone()));

        let hour = required(settings.weekday_filter_hour, "weekday_filter_hour")?;
        let excluded_through_hour = u32::try_from(hour)
            .ok()
            .filter(|hour| *hour <= 23)
            .ok_or_else(|| {
                ConfigError::invalid("weekday_filter_hour", format!("{hour} is not an hour 0-23"))
            })?;

        let excluded_weekdays = required(settings.weekday_filter_day, "weekday_filter_day")?
            .into_iter()
            .map(|day| {
                u8::try_from(day)
                    .ok()
                    .and_then(weekday_from_index)
                    .ok_or_else(|| {
                        ConfigError::invalid(
                            "weekday_filter_day",
                            format!("{day} is not a weekday index 0 (Monday) - 6 (Sunday)"),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let no_spamming = required(settings.no_spamming, "no_spamming")?;

        let poll_interval = positive_seconds(
            required(settings.poll_interval, "poll_interval")?,
            "poll_interval",
        )?;

        let mut source = SourceConfig::default();
        if let Some(base_url) = settings.api_base_url {
            let base_url = base_url.trim();
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::invalid(
                    "api_base_url",
                    format!("'{base_url}' must start with http:// or https://"),
                ));
            }
            source.api_base_url = base_url.to_string();
        }
        if let Some(limit) = settings.slot_limit {
            source.slot_limit = u32::try_from(limit)
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| {
                    ConfigError::invalid("slot_limit", format!("{limit} must be a positive count"))
                })?;
        }
        if let Some(timeout) = settings.request_timeout {
            source.request_timeout = positive_seconds(timeout, "request_timeout")?;
        }

        let email = email_settings(
            settings.gmail_sender,
            settings.gmail_recipients,
            overrides.gmail_app_password.or(settings.gmail_app_password),
            settings.smtp_host,
        )?;

        let telemetry = TelemetryConfig {
            log_level: overrides.log_level.unwrap_or_else(|| "info".to_string()),
            log_file: settings.logfile.map(|path| resolve(base_dir, path)),
        };

        Ok(Self {
            plan: WatchPlan {
                locations,
                rules: EligibilityRules::new(cutoff_date, excluded_through_hour, excluded_weekdays),
                mode: NotificationMode::from_no_spamming(no_spamming),
                poll_interval,
            },
            source,
            email,
            locations_file: settings.locations_file.map(|path| resolve(base_dir, path)),
            telemetry,
        })
    }
}

fn required<T>(value: Option<T>, name: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::MissingSetting(name))
}

fn positive_seconds(value: i64, name: &'static str) -> Result<Duration, ConfigError> {
    u64::try_from(value)
        .ok()
        .filter(|seconds| *seconds > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::invalid(name, format!("{value} must be a positive number of seconds")))
}

fn resolve(base_dir: Option<&Path>, path: PathBuf) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() && !base.as_os_str().is_empty() => base.join(path),
        _ => path,
    }
}

fn email_settings(
    sender: Option<String>,
    recipients: Option<Vec<String>>,
    password: Option<String>,
    smtp_host: Option<String>,
) -> Result<Option<EmailSettings>, ConfigError> {
    let sender = match sender.map(|value| value.trim().to_string()) {
        Some(sender) if !sender.is_empty() => sender,
        _ => {
            if recipients.as_ref().is_some_and(|list| !list.is_empty()) {
                return Err(ConfigError::MissingSetting("gmail_sender"));
            }
            return Ok(None);
        }
    };

    let recipients: Vec<String> = recipients
        .unwrap_or_default()
        .into_iter()
        .map(|recipient| recipient.trim().to_string())
        .filter(|recipient| !recipient.is_empty())
        .collect();
    if recipients.is_empty() {
        return Err(ConfigError::MissingSetting("gmail_recipients"));
    }

    let password = password
        .filter(|password| !password.is_empty())
        .ok_or(ConfigError::MissingSetting("gmail_app_password"))?;

    Ok(Some(EmailSettings {
        smtp_host: smtp_host
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
        sender,
        recipients,
        password,
    }))
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    MissingSetting(&'static str),
    InvalidSetting {
        name: &'static str,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: String) -> Self {
        Self::InvalidSetting { name, reason }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "unable to read config file {}: {}", path.display(), source)
            }
            ConfigError::Json(err) => write!(f, "config file is not valid JSON: {}", err),
            ConfigError::MissingSetting(name) => {
                write!(f, "missing setting {} in config file", name)
            }
            ConfigError::InvalidSetting { name, reason } => {
                write!(f, "invalid setting {}: {}", name, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json(err) => Some(err),
            ConfigError::MissingSetting(_) | ConfigError::InvalidSetting { .. } => None,
        }
    }
}
