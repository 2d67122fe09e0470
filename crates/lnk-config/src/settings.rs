use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// How long a soft-warning signal widens pacing jitter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CautionPolicy {
    /// Widen jitter for the next action only, then return to normal.
    NextAction,
    /// Widen jitter for the remainder of the run.
    #[default]
    RestOfRun,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub automation: AutomationSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub platform: PlatformSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationSettings {
    /// Default per-window connection ceiling for new campaigns.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Minimum spacing between dispatched actions, seconds.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,

    /// Jitter added on top of the minimum spacing, seconds. Jitter only
    /// adds time; the floor is never undercut.
    #[serde(default = "default_jitter_secs")]
    pub jitter_secs: u64,

    /// Cap on candidates gathered by one scan.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Cap on result pages fetched by one scan.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Transient page-fetch errors tolerated before a scan gives up.
    #[serde(default = "default_max_page_retries")]
    pub max_page_retries: u32,

    /// Base for exponential retry backoff, milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Minutes east of UTC for the account's window-reset boundary.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default)]
    pub caution_policy: CautionPolicy,

    /// Jitter multiplier applied while caution is raised.
    #[serde(default = "default_caution_factor")]
    pub caution_factor: u32,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            min_delay_secs: default_min_delay_secs(),
            jitter_secs: default_jitter_secs(),
            search_limit: default_search_limit(),
            max_pages: default_max_pages(),
            max_page_retries: default_max_page_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            utc_offset_minutes: 0,
            caution_policy: CautionPolicy::default(),
            caution_factor: default_caution_factor(),
        }
    }
}

impl AutomationSettings {
    pub fn min_delay(&self) -> Duration {
        Duration::from_secs(self.min_delay_secs)
    }

    pub fn jitter_range(&self) -> Duration {
        Duration::from_secs(self.jitter_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Hours a persisted session blob stays fresh before re-login.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            expiry_hours: default_expiry_hours(),
        }
    }
}

fn default_daily_limit() -> u32 {
    20
}

fn default_min_delay_secs() -> u64 {
    30
}

fn default_jitter_secs() -> u64 {
    60
}

fn default_search_limit() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_page_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_caution_factor() -> u32 {
    2
}

fn default_expiry_hours() -> u64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Base URL of the platform the HTTP driver talks to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout, seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.linkedin.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Default config path: `{config_dir}/linkup/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "linkup").map(|d| d.config_dir().join("config.toml"))
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file
    /// is absent, then apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) if p.exists() => {
                let contents = std::fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read config: {}", p.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config: {}", p.display()))?
            }
            _ => Settings::default(),
        };
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Environment overrides for the operational knobs.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_u32("DAILY_CONNECTION_LIMIT") {
            self.automation.daily_limit = v;
        }
        if let Some(v) = env_u64("CONNECTION_DELAY_MIN") {
            self.automation.min_delay_secs = v;
        }
        if let Some(v) = env_u64("CONNECTION_DELAY_MAX") {
            self.automation.jitter_secs = v.saturating_sub(self.automation.min_delay_secs);
        }
        if let Some(v) = env_u32("SEARCH_LIMIT") {
            self.automation.search_limit = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.automation.daily_limit > 0,
            "daily_limit must be positive"
        );
        anyhow::ensure!(
            self.automation.caution_factor >= 1,
            "caution_factor must be at least 1"
        );
        Ok(())
    }
}

fn env_u32(name: &str) -> Option<u32> {
    env_parse(name)
}

fn env_u64(name: &str) -> Option<u64> {
    env_parse(name)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}
