//! Runtime settings.
//!
//! Layered in this order, later layers winning: built-in defaults, an
//! optional TOML file (`--config`), environment variables, CLI flags (the
//! binary applies those last).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use ygo_db_fetch::Politeness;
use ygo_db_fetch::retry::DEFAULT_MAX_RETRIES;
use ygo_db_fetch::url::{DEFAULT_BASE_URL, DEFAULT_LOCALE, Urls};

use crate::SyncError;
use crate::registry::DatasetSpec;

pub const DATA_DIR_ENV: &str = "YGO_DB_DATA_DIR";
pub const DELAY_MS_ENV: &str = "YGO_DB_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory holding the dataset files.
    pub data_dir: PathBuf,
    pub base_url: String,
    pub locale: String,
    /// Fixed delay between requests.
    pub delay_ms: u64,
    /// Random delay range `[min, max]`; replaces `delay_ms` when set.
    pub jitter_ms: Option<[u64; 2]>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Netscape `cookies.txt` to use instead of bootstrapping a session.
    pub cookies: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("output/data"),
            base_url: DEFAULT_BASE_URL.to_owned(),
            locale: DEFAULT_LOCALE.to_owned(),
            delay_ms: 1000,
            jitter_ms: None,
            timeout_secs: 120,
            max_retries: DEFAULT_MAX_RETRIES,
            cookies: None,
        }
    }
}

impl SyncConfig {
    /// Reads a TOML settings file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] if the file cannot be read and
    /// [`SyncError::Config`] if it is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, SyncError> {
        let text = std::fs::read_to_string(path).map_err(|e| SyncError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(toml::de::from_str(&text)?)
    }

    /// Defaults, then `path` when given, then environment overrides.
    ///
    /// # Errors
    ///
    /// See [`SyncConfig::from_file`] and [`SyncConfig::apply_env`].
    pub fn load(path: Option<&Path>) -> Result<Self, SyncError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Applies `YGO_DB_DATA_DIR` and `YGO_DB_DELAY_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] if the delay is not a number.
    pub fn apply_env(&mut self) -> Result<(), SyncError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SyncError> {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(delay) = lookup(DELAY_MS_ENV).filter(|v| !v.is_empty()) {
            self.delay_ms = delay.trim().parse().map_err(|_| SyncError::InvalidConfig {
                message: format!("{DELAY_MS_ENV} must be a number of milliseconds, got '{delay}'"),
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn politeness(&self) -> Politeness {
        Politeness::from_settings(self.delay_ms, self.jitter_ms)
    }

    #[must_use]
    pub fn urls(&self) -> Urls {
        Urls::new(&self.base_url, &self.locale)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Location of `spec`'s file.
    #[must_use]
    pub fn dataset_path(&self, spec: &DatasetSpec) -> PathBuf {
        self.data_dir.join(&spec.file_name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("output/data"));
        assert_eq!(config.politeness(), Politeness::Fixed { ms: 1000 });
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config: SyncConfig = toml::de::from_str(
            "data_dir = \"/srv/ygo\"\njitter_ms = [1000, 3000]\n",
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/ygo"));
        assert_eq!(config.locale, "ja");
        assert_eq!(
            config.politeness(),
            Politeness::Jitter {
                min_ms: 1000,
                max_ms: 3000
            }
        );
    }

    #[test]
    fn environment_wins_over_file() {
        let env: HashMap<&str, &str> = [(DATA_DIR_ENV, "/tmp/data"), (DELAY_MS_ENV, " 250 ")]
            .into_iter()
            .collect();
        let mut config = SyncConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| (*v).to_owned()))
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.delay_ms, 250);
    }

    #[test]
    fn bad_delay_is_rejected() {
        let mut config = SyncConfig::default();
        let result = config.apply_overrides(|k| (k == DELAY_MS_ENV).then(|| "soon".to_owned()));
        assert!(matches!(result, Err(SyncError::InvalidConfig { .. })));
    }

    #[test]
    fn reads_settings_file() {
        let path = std::env::temp_dir().join(format!("ygo_db_sync_config_{}.toml", std::process::id()));
        std::fs::write(&path, "delay_ms = 0\nlocale = \"en\"\n").unwrap();
        let config = SyncConfig::from_file(&path).unwrap();
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.urls().session(), format!("{DEFAULT_BASE_URL}faq_search.action?ope=1&request_locale=en"));
        std::fs::remove_file(&path).unwrap();
    }
}
