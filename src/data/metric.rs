//! Sensor metrics and their polling channels.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::band::{BandSet, CO2_BANDS, HUMIDITY_BANDS, TEMPERATURE_BANDS};
use super::format::LabelFormat;

/// One of the three readings the sensor serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Co2,
    Temperature,
    Humidity,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 3] = [Metric::Co2, Metric::Temperature, Metric::Humidity];

    /// Position in [`Metric::ALL`].
    pub fn index(self) -> usize {
        match self {
            Metric::Co2 => 0,
            Metric::Temperature => 1,
            Metric::Humidity => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Co2 => "CO2",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Co2 => "ppm",
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
        }
    }

    /// Default endpoint path on the sensor's web server.
    pub fn default_path(self) -> &'static str {
        match self {
            Metric::Co2 => "/co2",
            Metric::Temperature => "/temp",
            Metric::Humidity => "/humidity",
        }
    }

    /// Default poll interval. CO2 changes fastest.
    pub fn default_interval(self) -> Duration {
        match self {
            Metric::Co2 => Duration::from_millis(5_000),
            Metric::Temperature | Metric::Humidity => Duration::from_millis(30_000),
        }
    }

    /// Gauge construction options for this metric.
    pub fn gauge_options(self) -> GaugeOptions {
        match self {
            Metric::Co2 => GaugeOptions {
                max: 2500.0,
                initial: 400.0,
                label: LabelFormat::Grouped,
                bands: CO2_BANDS,
            },
            Metric::Temperature => GaugeOptions {
                max: 50.0,
                initial: 20.0,
                label: LabelFormat::TwoDecimals,
                bands: TEMPERATURE_BANDS,
            },
            Metric::Humidity => GaugeOptions {
                max: 100.0,
                initial: 50.0,
                label: LabelFormat::TwoDecimals,
                bands: HUMIDITY_BANDS,
            },
        }
    }
}

/// Options a gauge is constructed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeOptions {
    /// Upper end of the range; the lower end is always 0.
    pub max: f64,
    /// Value shown before the first reading arrives.
    pub initial: f64,
    pub label: LabelFormat,
    pub bands: BandSet,
}

/// A metric bound to its endpoint and cadence.
///
/// Built once at startup from configuration and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricChannel {
    pub metric: Metric,
    pub path: String,
    pub interval: Duration,
}

impl MetricChannel {
    pub fn new(metric: Metric, path: impl Into<String>, interval: Duration) -> Self {
        Self {
            metric,
            path: path.into(),
            interval,
        }
    }

    /// Channel with the metric's default path and interval.
    pub fn with_defaults(metric: Metric) -> Self {
        Self::new(metric, metric.default_path(), metric.default_interval())
    }
}
