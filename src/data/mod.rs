//! Data models for the dashboard.
//!
//! ## Submodules
//!
//! - [`band`]: Value-to-color banding ([`BandSet`], [`Rgb`])
//! - [`format`]: Gauge label formatting
//! - [`gauge`]: Animated gauge state ([`GaugeState`])
//! - [`history`]: Recent readings for sparklines
//! - [`metric`]: The three sensor metrics and their polling channels
//! - [`table`]: The server-backed history table
//!
//! ## Data Flow
//!
//! ```text
//! Reading (raw body)
//!        │
//!        ▼
//! gauge::parse_reading()
//!        │
//!        ├──▶ GaugeState::set_value_animated()
//!        │
//!        └──▶ History::record() (for sparklines)
//! ```

pub mod band;
pub mod format;
pub mod gauge;
pub mod history;
pub mod metric;
pub mod table;

pub use band::{Band, BandSet, Rgb};
pub use format::LabelFormat;
pub use gauge::{parse_reading, AnimationStatus, GaugeState};
pub use history::History;
pub use metric::{GaugeOptions, Metric, MetricChannel};
pub use table::{TableSnapshot, TableUiState};
