//! Dashboard configuration.
//!
//! Settings are layered: built-in defaults, then an optional config file
//! (any format the `config` crate recognises by extension), then
//! `SENSORWATCH_*` environment variables. CLI flags are applied on top by the
//! binary.
//!
//! ```toml
//! base_url = "http://co2meter.local"
//! co2_interval_ms = 5000
//! ordering = "latest"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::{Metric, MetricChannel};

/// Prefix for environment overrides, e.g. `SENSORWATCH_BASE_URL`.
pub const ENV_PREFIX: &str = "SENSORWATCH";

/// Which response wins when requests for one metric overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Apply every response as it arrives; the last to complete wins.
    #[default]
    Arrival,
    /// Drop responses older than one already applied for the same metric.
    ///
    /// Only applied responses count: a newer response whose body fails to
    /// parse is skipped and does not block an older valid one that arrives
    /// after it.
    Latest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Sensor web server, without a trailing path.
    pub base_url: String,
    pub co2_path: String,
    pub temperature_path: String,
    pub humidity_path: String,
    pub table_path: String,
    pub co2_interval_ms: u64,
    pub temperature_interval_ms: u64,
    pub humidity_interval_ms: u64,
    pub table_interval_ms: u64,
    /// Spacing of trend samples. Zero keeps every reading.
    pub history_interval_ms: u64,
    /// Gauge animation length for each new reading.
    pub animation_secs: f64,
    /// CO2 level that raises the alarm indicator.
    pub co2_alarm_ppm: f64,
    pub ordering: ResponseOrdering,
    /// Where table sort state is persisted. Not persisted when unset.
    pub table_state_file: Option<PathBuf>,
    /// Log destination. Logging is off when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://co2meter.local".to_string(),
            co2_path: Metric::Co2.default_path().to_string(),
            temperature_path: Metric::Temperature.default_path().to_string(),
            humidity_path: Metric::Humidity.default_path().to_string(),
            table_path: "/table".to_string(),
            co2_interval_ms: 5_000,
            temperature_interval_ms: 30_000,
            humidity_interval_ms: 30_000,
            table_interval_ms: 60_000,
            history_interval_ms: 60_000,
            animation_secs: 2.0,
            co2_alarm_ppm: 1800.0,
            ordering: ResponseOrdering::Arrival,
            table_state_file: None,
            log_file: None,
        }
    }
}

impl DashboardConfig {
    /// Load defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`DashboardConfig::load`] but reading environment overrides from
    /// `env` instead of the process environment when provided.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let config: DashboardConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must be an http(s) URL: {}", self.base_url);
        }
        for (name, ms) in [
            ("co2_interval_ms", self.co2_interval_ms),
            ("temperature_interval_ms", self.temperature_interval_ms),
            ("humidity_interval_ms", self.humidity_interval_ms),
            ("table_interval_ms", self.table_interval_ms),
        ] {
            if ms == 0 {
                bail!("{} must be greater than zero", name);
            }
        }
        if !self.animation_secs.is_finite() || self.animation_secs < 0.0 {
            bail!("animation_secs must be a non-negative number");
        }
        Ok(())
    }

    /// The three polling channels in display order.
    pub fn channels(&self) -> Vec<MetricChannel> {
        Metric::ALL
            .into_iter()
            .map(|metric| {
                let (path, ms) = match metric {
                    Metric::Co2 => (&self.co2_path, self.co2_interval_ms),
                    Metric::Temperature => (&self.temperature_path, self.temperature_interval_ms),
                    Metric::Humidity => (&self.humidity_path, self.humidity_interval_ms),
                };
                MetricChannel::new(metric, path.clone(), Duration::from_millis(ms))
            })
            .collect()
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_secs_f64(self.animation_secs.max(0.0))
    }

    pub fn table_interval(&self) -> Duration {
        Duration::from_millis(self.table_interval_ms)
    }

    pub fn history_interval(&self) -> Duration {
        Duration::from_millis(self.history_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::load_with_env(None, empty_env()).unwrap();
        assert_eq!(config, DashboardConfig::default());

        let channels = config.channels();
        assert_eq!(channels[0], MetricChannel::with_defaults(Metric::Co2));
        assert_eq!(channels[1], MetricChannel::with_defaults(Metric::Temperature));
        assert_eq!(channels[2], MetricChannel::with_defaults(Metric::Humidity));
        assert_eq!(config.animation_duration(), Duration::from_secs(2));
        assert_eq!(config.table_interval(), Duration::from_secs(60));
        assert_eq!(config.history_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
base_url = "http://192.168.1.40"
co2_interval_ms = 2000
ordering = "latest"
table_state_file = "/tmp/table.json"
"#
        )
        .unwrap();

        let config = DashboardConfig::load_with_env(Some(file.path()), empty_env()).unwrap();
        assert_eq!(config.base_url, "http://192.168.1.40");
        assert_eq!(config.co2_interval_ms, 2000);
        assert_eq!(config.temperature_interval_ms, 30_000);
        assert_eq!(config.ordering, ResponseOrdering::Latest);
        assert_eq!(config.table_state_file, Some(PathBuf::from("/tmp/table.json")));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "co2_interval_ms = 2000").unwrap();

        let mut env = config::Map::new();
        env.insert("SENSORWATCH_CO2_INTERVAL_MS".to_string(), "1000".to_string());
        env.insert("SENSORWATCH_ANIMATION_SECS".to_string(), "0.5".to_string());

        let config = DashboardConfig::load_with_env(Some(file.path()), Some(env)).unwrap();
        assert_eq!(config.co2_interval_ms, 1000);
        assert_eq!(config.animation_secs, 0.5);
    }

    #[test]
    fn test_zero_history_interval_is_allowed() {
        let config = DashboardConfig {
            history_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.history_interval(), Duration::ZERO);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let config = DashboardConfig {
            humidity_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = DashboardConfig {
            base_url: "co2meter.local".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
