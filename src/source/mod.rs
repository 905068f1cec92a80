//! Sensor polling and the sources the UI reads from.
//!
//! Network work happens on tokio tasks: the [`PollScheduler`] runs one timer per
//! metric and the [`TableRefresher`] reloads the history table. Results travel
//! over channels and the UI thread drains them through a [`ReadingSource`], so
//! gauge state is only ever touched from one place.
//!
//! Responses can complete out of order. Each [`Reading`] carries the sequence
//! number its request was dispatched with, which lets the consumer decide
//! whether a late response should still be applied.

mod channel;
mod fetch;
mod scheduler;
mod table;

pub use channel::ChannelSource;
pub use fetch::{no_cache_headers, HttpFetcher, MetricFetcher};
pub use scheduler::{Dispatcher, PollHandle, PollScheduler};
pub use table::{RefreshHandle, TableRefresher, TableUpdate, TableView};

use std::fmt::Debug;

use crate::data::Metric;

/// A successful fetch for one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub metric: Metric,
    /// Per-metric dispatch order, starting at 1.
    pub seq: u64,
    /// Raw response body.
    pub body: String,
}

/// Trait for receiving readings on the UI thread.
///
/// # Example
///
/// ```
/// use sensorwatch::{ChannelSource, ReadingSource};
///
/// let (_tx, mut source) = ChannelSource::create("http://co2meter.local");
/// assert!(source.poll().is_none());
/// ```
pub trait ReadingSource: Send + Debug {
    /// Return the next pending reading without blocking.
    fn poll(&mut self) -> Option<Reading>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Returns an error message if the source can no longer deliver readings.
    fn error(&self) -> Option<&str>;
}
