//! Configuration for the Drill Sensor Agent.

use crate::core::windowing::DEFAULT_FEED_CAPACITY;
use crate::monitor::DEFAULT_WINDOW_SIZE;
use crate::predictor::PredictorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the drill agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time between generated samples
    #[serde(with = "duration_serde")]
    pub sample_interval: Duration,

    /// Number of most recent samples the feed retains
    pub feed_capacity: usize,

    /// Samples per prediction window
    pub window_size: usize,

    /// Lowest rpm the generator emits once wear drives speed down
    pub rpm_floor: u32,

    /// Seed for reproducible runs (entropy when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// IANA timezone used when printing timestamps
    pub display_timezone: String,

    /// Path for storing run statistics
    pub data_path: PathBuf,

    /// Port for the dashboard API
    pub server_port: u16,

    /// Prediction endpoints
    pub predictor: PredictorConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drill-sensor-agent");

        Self {
            sample_interval: Duration::from_secs(5),
            feed_capacity: DEFAULT_FEED_CAPACITY,
            window_size: DEFAULT_WINDOW_SIZE,
            rpm_floor: 0,
            seed: None,
            display_timezone: "UTC".to_string(),
            data_path: data_dir,
            server_port: 8787,
            predictor: PredictorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drill-sensor-agent")
            .join("config.json")
    }

    /// Path of the persisted run statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("run_stats.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Parsed display timezone.
    pub fn timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.display_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| {
                ConfigError::Invalid(format!("unknown timezone '{}'", self.display_timezone))
            })
    }

    /// Check that the settings can drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "sample_interval must be at least one second".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.window_size > self.feed_capacity {
            return Err(ConfigError::Invalid(format!(
                "window_size ({}) cannot exceed feed_capacity ({})",
                self.window_size, self.feed_capacity
            )));
        }
        self.timezone()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sample_interval, Duration::from_secs(5));
        assert_eq!(config.feed_capacity, 50);
        assert_eq!(config.window_size, 20);
        assert_eq!(config.rpm_floor, 0);
        assert!(!config.predictor.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"sample_interval": 2, "predictor": {"enabled": true}}"#)
                .unwrap();
        assert_eq!(config.sample_interval, Duration::from_secs(2));
        assert_eq!(config.window_size, 20);
        assert!(config.predictor.enabled);
        assert_eq!(config.predictor.rul_path, "/predict");
    }

    #[test]
    fn test_validation_rejects_bad_windows() {
        let mut config = Config {
            window_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.window_size = 60;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.window_size = 20;
        config.display_timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("drill-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");

        let config = Config {
            seed: Some(1234),
            display_timezone: "Europe/Oslo".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.seed, Some(1234));
        assert_eq!(loaded.timezone().unwrap(), chrono_tz::Europe::Oslo);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
