use log::{LevelFilter, warn};
use std::str::FromStr;
use std::time::Duration;
use volley_engine::MissingDatePolicy;

const DEFAULT_CONFIG: &str = "config.json";
const DEFAULT_REFRESH_SECS: u64 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the loader reads from. `fixtures` / `standings` override the file
/// names given in the club config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub config: String,
    pub fixtures: Option<String>,
    pub standings: Option<String>,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            config: DEFAULT_CONFIG.to_string(),
            fixtures: None,
            standings: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub sources: SourceSettings,
    /// `None` disables the periodic reload.
    pub refresh_every: Option<Duration>,
    pub missing_dates: MissingDatePolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            sources: SourceSettings::default(),
            refresh_every: Some(Duration::from_secs(DEFAULT_REFRESH_SECS)),
            missing_dates: MissingDatePolicy::default(),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from `RMVOLLEY_*` variables. Unparseable values are logged
    /// and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(config) = var("RMVOLLEY_CONFIG") {
            settings.sources.config = config;
        }
        settings.sources.fixtures = var("RMVOLLEY_FIXTURES");
        settings.sources.standings = var("RMVOLLEY_STANDINGS");

        if let Some(raw) = var("RMVOLLEY_REFRESH_SECS") {
            match raw.parse::<u64>() {
                Ok(0) => settings.refresh_every = None,
                Ok(secs) => settings.refresh_every = Some(Duration::from_secs(secs)),
                Err(e) => warn!("ignoring RMVOLLEY_REFRESH_SECS={raw}: {e}"),
            }
        }

        if let Some(raw) = var("RMVOLLEY_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(0) => warn!("ignoring RMVOLLEY_TIMEOUT_SECS=0"),
                Ok(secs) => settings.sources.timeout = Duration::from_secs(secs),
                Err(e) => warn!("ignoring RMVOLLEY_TIMEOUT_SECS={raw}: {e}"),
            }
        }

        if let Some(raw) = var("RMVOLLEY_LOG") {
            match LevelFilter::from_str(&raw) {
                Ok(level) => settings.log_level = Some(level),
                Err(e) => warn!("ignoring RMVOLLEY_LOG={raw}: {e}"),
            }
        }

        if let Some(raw) = var("RMVOLLEY_MISSING_DATES") {
            match raw.parse::<MissingDatePolicy>() {
                Ok(policy) => settings.missing_dates = policy,
                Err(e) => warn!("ignoring RMVOLLEY_MISSING_DATES: {e}"),
            }
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let settings = settings_from(&[]);
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.sources.config, "config.json");
        assert_eq!(settings.refresh_every, Some(Duration::from_secs(300)));
    }

    #[test]
    fn reads_overrides() {
        let settings = settings_from(&[
            ("RMVOLLEY_CONFIG", "https://club.example/config.json"),
            ("RMVOLLEY_FIXTURES", "/data/gare.json"),
            ("RMVOLLEY_REFRESH_SECS", "60"),
            ("RMVOLLEY_TIMEOUT_SECS", "3"),
            ("RMVOLLEY_LOG", "debug"),
            ("RMVOLLEY_MISSING_DATES", "first"),
        ]);
        assert_eq!(settings.sources.config, "https://club.example/config.json");
        assert_eq!(settings.sources.fixtures.as_deref(), Some("/data/gare.json"));
        assert_eq!(settings.sources.standings, None);
        assert_eq!(settings.refresh_every, Some(Duration::from_secs(60)));
        assert_eq!(settings.sources.timeout, Duration::from_secs(3));
        assert_eq!(settings.log_level, Some(LevelFilter::Debug));
        assert_eq!(settings.missing_dates, MissingDatePolicy::First);
    }

    #[test]
    fn zero_refresh_disables_reload() {
        assert_eq!(settings_from(&[("RMVOLLEY_REFRESH_SECS", "0")]).refresh_every, None);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let settings = settings_from(&[
            ("RMVOLLEY_REFRESH_SECS", "soon"),
            ("RMVOLLEY_TIMEOUT_SECS", "0"),
            ("RMVOLLEY_LOG", "loud"),
            ("RMVOLLEY_MISSING_DATES", "never"),
            ("RMVOLLEY_CONFIG", "   "),
        ]);
        assert_eq!(settings, AppSettings::default());
    }
}
