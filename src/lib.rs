// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # sensorwatch
//!
//! A live terminal dashboard for an indoor air-quality sensor.
//!
//! The sensor exposes one plain-text endpoint per metric (CO2, temperature,
//! humidity) and a JSON history table. This crate polls each metric on its own
//! cadence, animates a colour-banded gauge toward every new reading, and
//! reloads the history table once a minute.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │ (gauges) │    │(render) │    │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐     ┌───────────────┐                          │
//! │  │ source  │◀────│ PollScheduler │◀── HttpFetcher           │
//! │  │ (input) │◀────│ TableRefresher│                          │
//! │  └─────────┘     └───────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, response ordering, view navigation
//! - **[`source`]**: Per-metric timers, the HTTP fetcher ([`MetricFetcher`] trait)
//!   and the channel-backed [`ReadingSource`] the UI drains
//! - **[`data`]**: Colour bands, label formatting, gauge animation, trend history
//!   and the parsed history table
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered settings (file, `SENSORWATCH_*` environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll the sensor advertised over mDNS
//! sensorwatch
//!
//! # Poll a specific host and log to a file
//! sensorwatch --url http://192.168.1.40 --log-file sensorwatch.log
//!
//! # Fetch once and write the readings as JSON
//! sensorwatch --export readings.json
//! ```
//!
//! ### As a library with a channel source
//!
//! ```
//! use std::time::Instant;
//! use sensorwatch::{App, ChannelSource, DashboardConfig, Metric, Reading};
//!
//! let (tx, source) = ChannelSource::create("http://co2meter.local");
//! let mut app = App::new(Box::new(source), &DashboardConfig::default());
//!
//! tx.send(Reading { metric: Metric::Co2, seq: 1, body: "612".into() }).unwrap();
//! app.update(Instant::now());
//!
//! assert_eq!(app.gauge(Metric::Co2).target(), 612.0);
//! ```
//!
//! ### Polling a sensor
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensorwatch::{ChannelSource, DashboardConfig, HttpFetcher, MetricFetcher, PollScheduler};
//!
//! # tokio_test::block_on(async {
//! let config = DashboardConfig::default();
//! let fetcher: Arc<dyn MetricFetcher> = Arc::new(HttpFetcher::new(config.base_url.clone()));
//! let (tx, source) = ChannelSource::create(&config.base_url);
//! let handle = PollScheduler::new(fetcher, tx).spawn(&config.channels());
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, View};
pub use config::{DashboardConfig, ResponseOrdering};
pub use data::{
    parse_reading, Band, BandSet, GaugeOptions, GaugeState, History, LabelFormat, Metric,
    MetricChannel, Rgb, TableSnapshot, TableUiState,
};
pub use error::FetchError;
pub use source::{
    ChannelSource, HttpFetcher, MetricFetcher, PollHandle, PollScheduler, Reading, ReadingSource,
    RefreshHandle, TableRefresher, TableView,
};
