//! `arlo.ron` settings. A missing file means defaults; command-line flags
//! override whatever the file says.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arlo_core::AuditFlow;
use arlo_engine::{ApiSettings, EngineSettings, PollSettings};
use arlo_logging::{arlo_info, LogDestination};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "arlo.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub election_id: Option<String>,
    pub flow: AuditFlow,
    pub poll_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub output_dir: PathBuf,
    pub log_destination: LogTarget,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let poll = PollSettings::default();
        Self {
            base_url: ApiSettings::default().base_url,
            election_id: None,
            flow: AuditFlow::default(),
            poll_timeout_ms: poll.timeout.as_millis() as u64,
            poll_interval_ms: poll.interval.as_millis() as u64,
            connect_timeout_ms: 10_000,
            output_dir: PathBuf::from("sheets"),
            log_destination: LogTarget::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                arlo_info!("no config at {path:?}, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn level(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            timeout: Duration::from_millis(self.poll_timeout_ms),
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn engine_settings(&self, election_id: &str) -> EngineSettings {
        EngineSettings {
            api: self.api_settings(),
            poll: self.poll_settings(),
            election_id: election_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.poll_timeout_ms, 120_000);
        assert_eq!(config.poll_interval_ms, 1_000);
        assert_eq!(config.level().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            r#"(
                base_url: "https://arlo.example.org",
                election_id: Some("e1"),
                flow: multi,
                log_destination: Both,
            )"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "https://arlo.example.org");
        assert_eq!(config.election_id.as_deref(), Some("e1"));
        assert_eq!(config.flow, AuditFlow::Multi);
        assert_eq!(config.log_destination, LogTarget::Both);
        assert_eq!(config.poll_interval_ms, 1_000);
        assert_eq!(
            config.engine_settings("e1").poll.timeout,
            Duration::from_secs(120)
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "(base_url: ").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_ron() {
        let config = AppConfig {
            election_id: Some("e9".to_string()),
            output_dir: PathBuf::from("out"),
            ..AppConfig::default()
        };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new()).unwrap();
        assert_eq!(ron::from_str::<AppConfig>(&text).unwrap(), config);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let config = AppConfig {
            log_level: "loud".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.level(), Err(ConfigError::LogLevel(_))));
    }
}
