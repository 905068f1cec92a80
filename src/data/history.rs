//! Reading history for sparklines.
//!
//! Readings arrive at each metric's poll cadence, but the trend is sampled on
//! its own fixed clock (one point a minute by default), so every metric's
//! sparkline spans the same stretch of time.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use super::metric::Metric;

/// Maximum number of readings kept per metric.
pub const MAX_HISTORY_SIZE: usize = 96;

/// Default spacing between trend samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(60);

/// Tracks recent readings per metric for trend display.
#[derive(Debug, Clone)]
pub struct History {
    interval: Duration,
    readings: HashMap<Metric, VecDeque<(Instant, f64)>>,
    next_due: HashMap<Metric, Instant>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_interval(DEFAULT_SAMPLE_INTERVAL)
    }
}

impl History {
    /// Create a new empty history sampling once a minute.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most one reading per `interval`.
    /// A zero interval keeps every reading.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            readings: HashMap::new(),
            next_due: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offer a reading. It is kept only when the metric's next sample is due,
    /// dropping the oldest point once full. Returns whether it was kept.
    pub fn record(&mut self, metric: Metric, value: f64, at: Instant) -> bool {
        if let Some(&due) = self.next_due.get(&metric) {
            if at < due {
                return false;
            }
        }

        // Fixed cadence; after a gap longer than one interval, restart from now.
        let due = match self.next_due.get(&metric) {
            Some(&due) if due + self.interval > at => due + self.interval,
            _ => at + self.interval,
        };
        self.next_due.insert(metric, due);

        let entries = self.readings.entry(metric).or_default();
        entries.push_back((at, value));
        if entries.len() > MAX_HISTORY_SIZE {
            entries.pop_front();
        }
        true
    }

    pub fn len(&self, metric: Metric) -> usize {
        self.readings.get(&metric).map_or(0, VecDeque::len)
    }

    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.readings
            .get(&metric)
            .map(|entries| entries.iter().map(|(_, v)| *v).collect())
            .unwrap_or_default()
    }

    /// Sparkline levels (0-7) with values scaled against `[0, max]`.
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn sparkline(&self, metric: Metric, max: f64) -> Vec<u8> {
        let Some(entries) = self.readings.get(&metric) else {
            return Vec::new();
        };
        if entries.len() < 2 || max <= 0.0 {
            return Vec::new();
        }

        entries
            .iter()
            .map(|(_, v)| {
                let normalized = (v.clamp(0.0, max) / max * 7.0).round() as u8;
                normalized.min(7)
            })
            .collect()
    }

    /// Change per minute between the two most recent readings.
    pub fn rate_per_minute(&self, metric: Metric) -> Option<f64> {
        let entries = self.readings.get(&metric)?;
        if entries.len() < 2 {
            return None;
        }
        let (t1, v1) = entries[entries.len() - 1];
        let (t0, v0) = entries[entries.len() - 2];
        let elapsed = t1.saturating_duration_since(t0).as_secs_f64();

        if elapsed > 0.0 {
            Some((v1 - v0) / elapsed * 60.0)
        } else {
            None
        }
    }
}
