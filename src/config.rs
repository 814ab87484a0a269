use std::{
    env,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use serde::{
    Serialize, Deserialize
};

use crate::error::ConfigError;

pub const LOG_SERVER_URL_VAR: &str = "LOG_SERVER_URL";
pub const LOG_PUSH_URL_VAR: &str = "LOG_PUSH_URL";

const DEFAULT_LOG_SERVER_URL: &str = "http://localhost:8081";
const DEFAULT_PUSH_URL: &str = "http://localhost:4000/events";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    // base url of the log server, `/logs` is appended
    pub url: String,

    pub poll_interval_secs: u64,

    // per request, the push stream is exempt
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: DEFAULT_LOG_SERVER_URL.to_string(),
            poll_interval_secs: 5,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub enabled: bool,

    // full url of the event stream
    pub url: String,

    // wait this long before re-opening a dropped stream
    pub reconnect_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            enabled: true,
            url: DEFAULT_PUSH_URL.to_string(),
            reconnect_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            page_size: crate::view::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Settings as read from `config.toml`, then overridden by the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,

    pub push: PushConfig,

    pub view: ViewConfig,
}

impl Config {
    // an explicit path must exist, the default path is optional
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),

            None => default_path().filter(|p| p.is_file()),
        };
        let mut config = match path {
            Some(p) => {
                let text = fs::read_to_string(&p)
                    .map_err(|e| ConfigError::Io { path: p.clone(), source: e })?;
                log::debug!("Loaded config from `{}`.", p.display());
                Self::from_toml_str(&text)?
            },

            None => Config::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| env::var(name).ok());
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(LOG_SERVER_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.source.url = url.trim().to_string();
        }
        if let Some(url) = lookup(LOG_PUSH_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.push.url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.url.trim().is_empty() {
            return Err(ConfigError::Invalid("`source.url` is empty".to_string()));
        }
        if self.source.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("`source.poll_interval_secs` must be at least 1".to_string()));
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Invalid("`source.timeout_secs` must be at least 1".to_string()));
        }
        if self.push.enabled && self.push.url.trim().is_empty() {
            return Err(ConfigError::Invalid("`push.url` is empty".to_string()));
        }
        if self.push.enabled && self.push.reconnect_secs == 0 {
            return Err(ConfigError::Invalid("`push.reconnect_secs` must be at least 1".to_string()));
        }
        if self.view.page_size == 0 {
            return Err(ConfigError::Invalid("`view.page_size` must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn logs_endpoint(&self) -> String {
        format!("{}/logs", self.source.url.trim_end_matches('/'))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.source.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.push.reconnect_secs)
    }
}

// ~/.sentinel/config.toml
pub fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".sentinel").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logs_endpoint(), "http://localhost:8081/logs");
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.view.page_size, 10);
        assert!(config.push.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(r#"
            [source]
            url = "http://logs.internal:9000/"

            [view]
            page_size = 25
        "#).unwrap();
        assert_eq!(config.logs_endpoint(), "http://logs.internal:9000/logs");
        assert_eq!(config.source.poll_interval_secs, 5);
        assert_eq!(config.view.page_size, 25);
        assert_eq!(config.push, PushConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml_str("[source]\nurl = \"http://from-file\"\n").unwrap();
        config.apply_env_with(|name| match name {
            LOG_SERVER_URL_VAR => Some("http://from-env:8081".to_string()),
            LOG_PUSH_URL_VAR => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.source.url, "http://from-env:8081");
        // blank values are treated as unset
        assert_eq!(config.push.url, DEFAULT_PUSH_URL);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = Config::from_toml_str("[view]\npage_size = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let config = Config::from_toml_str("[source]\npoll_interval_secs = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            Config::from_toml_str("[view]\npage_size = \"ten\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[push]\nenabled = false\nreconnect_secs = 7").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert!(!config.push.enabled);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(7));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
