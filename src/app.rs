//! Application state and navigation logic.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::{DashboardConfig, ResponseOrdering};
use crate::data::{parse_reading, GaugeState, History, Metric, TableSnapshot, TableUiState};
use crate::source::{PollHandle, Reading, ReadingSource, RefreshHandle, TableUpdate};
use crate::ui::Theme;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The three animated gauges with trend sparklines.
    Gauges,
    /// The server-backed history table.
    Table,
}

impl View {
    /// All views in tab order.
    pub const ALL: [View; 2] = [View::Gauges, View::Table];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Gauges => View::Table,
            View::Table => View::Gauges,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        // Two views: previous and next coincide.
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Gauges => "Gauges",
            View::Table => "Table",
        }
    }
}

/// Main application state.
///
/// All gauge and table state lives here and is only changed from the UI
/// thread, by draining the reading and table channels in [`App::update`].
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Readings
    source: Box<dyn ReadingSource>,
    gauges: [GaugeState; 3],
    applied_seq: [u64; 3],
    pub history: History,
    pub ordering: ResponseOrdering,
    pub animation: Duration,
    pub co2_alarm_ppm: f64,

    // Table
    table_updates: Option<mpsc::UnboundedReceiver<TableUpdate>>,
    pub table: Option<TableSnapshot>,
    pub table_error: Option<String>,
    pub table_loaded_at: Option<Instant>,
    pub table_state: TableUiState,
    table_state_file: Option<PathBuf>,
    pub selected_row: usize,

    // Background work, kept alive for the lifetime of the app
    poller: Option<PollHandle>,
    table_refresher: Option<RefreshHandle>,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `source`.
    pub fn new(source: Box<dyn ReadingSource>, config: &DashboardConfig) -> Self {
        let table_state = config
            .table_state_file
            .as_deref()
            .map(TableUiState::load)
            .unwrap_or_default();

        Self {
            running: true,
            current_view: View::Gauges,
            show_help: false,
            source,
            gauges: Metric::ALL.map(|m| GaugeState::new(m.gauge_options())),
            applied_seq: [0; 3],
            history: History::with_interval(config.history_interval()),
            ordering: config.ordering,
            animation: config.animation_duration(),
            co2_alarm_ppm: config.co2_alarm_ppm,
            table_updates: None,
            table: None,
            table_error: None,
            table_loaded_at: None,
            table_state,
            table_state_file: config.table_state_file.clone(),
            selected_row: 0,
            poller: None,
            table_refresher: None,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Receive table loads from `updates`.
    pub fn with_table_updates(mut self, updates: mpsc::UnboundedReceiver<TableUpdate>) -> Self {
        self.table_updates = Some(updates);
        self
    }

    /// Keep the poll timers alive and use them for manual refresh.
    pub fn with_poller(mut self, poller: PollHandle) -> Self {
        self.poller = Some(poller);
        self
    }

    /// Keep the table refresher alive and use it for manual refresh.
    pub fn with_table_refresher(mut self, refresher: RefreshHandle) -> Self {
        self.table_refresher = Some(refresher);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns a description of the reading source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn source_error(&self) -> Option<&str> {
        self.source.error()
    }

    pub fn gauge(&self, metric: Metric) -> &GaugeState {
        &self.gauges[metric.index()]
    }

    /// Whether the CO2 reading has reached the alarm level.
    pub fn co2_alarm_active(&self) -> bool {
        self.gauge(Metric::Co2).last_update().is_some()
            && self.gauge(Metric::Co2).target() >= self.co2_alarm_ppm
    }

    /// Drain pending readings and table loads, then advance animations.
    pub fn update(&mut self, now: Instant) {
        while let Some(reading) = self.source.poll() {
            self.apply_reading(reading, now);
        }

        let mut updates = Vec::new();
        if let Some(rx) = self.table_updates.as_mut() {
            while let Ok(update) = rx.try_recv() {
                updates.push(update);
            }
        }
        for update in updates {
            self.apply_table_update(update, now);
        }

        for gauge in &mut self.gauges {
            gauge.tick(now);
        }
    }

    /// Apply one reading to its gauge. Returns whether the gauge changed.
    pub fn apply_reading(&mut self, reading: Reading, now: Instant) -> bool {
        let idx = reading.metric.index();

        if self.ordering == ResponseOrdering::Latest && reading.seq <= self.applied_seq[idx] {
            debug!(
                metric = reading.metric.label(),
                seq = reading.seq,
                applied = self.applied_seq[idx],
                "discarding stale response"
            );
            return false;
        }

        let value = match parse_reading(&reading.body) {
            Ok(v) => v,
            Err(e) => {
                debug!(metric = reading.metric.label(), seq = reading.seq, error = %e, "skipping reading");
                return false;
            }
        };

        self.gauges[idx].set_value_animated(value, self.animation, now);
        self.history.record(reading.metric, value, now);
        self.applied_seq[idx] = self.applied_seq[idx].max(reading.seq);
        true
    }

    /// Replace the table with a fresh load, or record why it failed.
    ///
    /// A failed reload keeps the previous rows on screen.
    pub fn apply_table_update(&mut self, update: TableUpdate, now: Instant) {
        match update {
            Ok(snapshot) => {
                if self.selected_row >= snapshot.rows.len() {
                    self.selected_row = snapshot.rows.len().saturating_sub(1);
                }
                self.table = Some(snapshot);
                self.table_error = None;
                self.table_loaded_at = Some(now);
            }
            Err(e) => {
                self.table_error = Some(e.to_string());
            }
        }
    }

    /// Fetch every metric and the table now.
    pub fn force_refresh(&mut self) {
        if let Some(ref poller) = self.poller {
            poller.refresh_all();
        }
        if let Some(ref refresher) = self.table_refresher {
            refresher.reload_now();
        }
        self.set_status_message("Refreshing...".to_string());
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    fn table_len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.rows.len())
    }

    /// Move table selection down by n rows.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.table_len().saturating_sub(1);
        self.selected_row = (self.selected_row + n).min(max);
    }

    /// Move table selection up by n rows.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_row = self.selected_row.saturating_sub(n);
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_first(&mut self) {
        self.selected_row = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_row = self.table_len().saturating_sub(1);
    }

    /// Cycle to the next table sort column.
    pub fn cycle_sort(&mut self) {
        let columns = self.table.as_ref().map_or(0, |t| t.columns.len());
        if columns == 0 {
            return;
        }
        self.table_state.sort_column = (self.table_state.sort_column + 1) % columns;
        self.persist_table_state();
    }

    /// Toggle table sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.table_state.ascending = !self.table_state.ascending;
        self.persist_table_state();
    }

    fn persist_table_state(&mut self) {
        let Some(path) = self.table_state_file.clone() else {
            return;
        };
        if let Err(e) = self.table_state.save(&path) {
            self.set_status_message(format!("Could not save table state: {}", e));
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
        if let Some(ref poller) = self.poller {
            poller.shutdown();
        }
        if let Some(ref refresher) = self.table_refresher {
            refresher.shutdown();
        }
    }

    /// Current readings as JSON.
    pub fn readings_json(&self) -> serde_json::Value {
        let gauges: Vec<serde_json::Value> = Metric::ALL
            .iter()
            .map(|&metric| {
                let gauge = self.gauge(metric);
                serde_json::json!({
                    "metric": metric,
                    "unit": metric.unit(),
                    "value": gauge.target(),
                    "label": metric.gauge_options().label.format(gauge.target()),
                    "band": metric.gauge_options().bands.band_for(gauge.target()).name,
                    "color": metric.gauge_options().bands.color_for(gauge.target()).to_string(),
                    "updated_secs_ago": gauge.last_update().map(|t| t.elapsed().as_secs_f64()),
                })
            })
            .collect();

        serde_json::json!({
            "source": self.source_description(),
            "co2_alarm": self.co2_alarm_active(),
            "gauges": gauges,
        })
    }

    /// Export current readings to a JSON file.
    pub fn export_readings(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.readings_json())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Export the loaded table to a CSV file.
    pub fn export_table_csv(&self, path: &Path) -> Result<()> {
        let Some(ref table) = self.table else {
            anyhow::bail!("No table data to export");
        };
        table.export_csv(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::source::ChannelSource;
    use tempfile::TempDir;

    fn reading(metric: Metric, seq: u64, body: &str) -> Reading {
        Reading {
            metric,
            seq,
            body: body.to_string(),
        }
    }

    fn app_with(config: &DashboardConfig) -> (mpsc::UnboundedSender<Reading>, App) {
        let (tx, source) = ChannelSource::create("test");
        (tx, App::new(Box::new(source), config))
    }

    fn table_json() -> &'static str {
        r#"{"data": [
            {"time": "12:00", "co2": 900},
            {"time": "12:01", "co2": 450},
            {"time": "12:02", "co2": 1300}
        ]}"#
    }

    #[test]
    fn test_readings_drive_gauges() {
        let (tx, mut app) = app_with(&DashboardConfig::default());
        let t0 = Instant::now();

        tx.send(reading(Metric::Co2, 1, "450")).unwrap();
        tx.send(reading(Metric::Temperature, 1, "32.456")).unwrap();
        tx.send(reading(Metric::Humidity, 1, "-5")).unwrap();
        app.update(t0);
        app.update(t0 + Duration::from_secs(2));

        let co2 = app.gauge(Metric::Co2);
        assert_eq!(co2.current(), 450.0);
        assert_eq!(co2.label(), "450");
        assert_eq!(co2.band().name, "light-blue");

        let temp = app.gauge(Metric::Temperature);
        assert_eq!(temp.label(), "32.46");
        assert_eq!(temp.band().name, "orange-red");

        assert_eq!(app.gauge(Metric::Humidity).band().name, "orange");
        assert_eq!(app.history.len(Metric::Co2), 1);
    }

    #[test]
    fn test_malformed_body_leaves_gauge_unchanged() {
        let (tx, mut app) = app_with(&DashboardConfig::default());
        let t0 = Instant::now();

        tx.send(reading(Metric::Co2, 1, "Internal Server Error")).unwrap();
        tx.send(reading(Metric::Co2, 2, "")).unwrap();
        app.update(t0);

        assert_eq!(app.gauge(Metric::Co2).current(), 400.0);
        assert!(app.gauge(Metric::Co2).last_update().is_none());
        assert_eq!(app.history.len(Metric::Co2), 0);

        // Later readings still apply.
        tx.send(reading(Metric::Co2, 3, "500")).unwrap();
        app.update(t0);
        assert_eq!(app.gauge(Metric::Co2).target(), 500.0);
    }

    #[test]
    fn test_arrival_ordering_last_to_arrive_wins() {
        let (tx, mut app) = app_with(&DashboardConfig::default());
        let t0 = Instant::now();

        // Request 2 completed first, request 1 straggled in afterwards.
        tx.send(reading(Metric::Co2, 2, "900")).unwrap();
        tx.send(reading(Metric::Co2, 1, "600")).unwrap();
        app.update(t0);

        assert_eq!(app.gauge(Metric::Co2).target(), 600.0);
    }

    #[test]
    fn test_latest_ordering_discards_stale() {
        let config = DashboardConfig {
            ordering: ResponseOrdering::Latest,
            ..Default::default()
        };
        let (tx, mut app) = app_with(&config);
        let t0 = Instant::now();

        tx.send(reading(Metric::Co2, 2, "900")).unwrap();
        tx.send(reading(Metric::Co2, 1, "600")).unwrap();
        tx.send(reading(Metric::Temperature, 1, "21")).unwrap();
        app.update(t0);

        assert_eq!(app.gauge(Metric::Co2).target(), 900.0);
        assert_eq!(app.gauge(Metric::Temperature).target(), 21.0);
    }

    #[test]
    fn test_latest_ordering_skips_malformed_newer_response() {
        let config = DashboardConfig {
            ordering: ResponseOrdering::Latest,
            ..Default::default()
        };
        let (tx, mut app) = app_with(&config);
        let t0 = Instant::now();

        tx.send(reading(Metric::Co2, 2, "garbage")).unwrap();
        tx.send(reading(Metric::Co2, 1, "600")).unwrap();
        app.update(t0);
        assert_eq!(app.gauge(Metric::Co2).target(), 600.0);

        // Once seq 3 is applied, seq 1 and 2 are both stale.
        tx.send(reading(Metric::Co2, 3, "700")).unwrap();
        tx.send(reading(Metric::Co2, 2, "650")).unwrap();
        app.update(t0);
        assert_eq!(app.gauge(Metric::Co2).target(), 700.0);
    }

    #[test]
    fn test_trend_history_samples_once_a_minute() {
        let (tx, mut app) = app_with(&DashboardConfig::default());
        let t0 = Instant::now();

        for i in 0..240u64 {
            tx.send(reading(Metric::Co2, i + 1, "650")).unwrap();
            app.update(t0 + Duration::from_secs(i * 5));
        }

        assert_eq!(app.gauge(Metric::Co2).target(), 650.0);
        assert!((20..=21).contains(&app.history.len(Metric::Co2)));
    }

    #[test]
    fn test_rapid_updates_trend_to_last() {
        let (tx, mut app) = app_with(&DashboardConfig::default());
        let t0 = Instant::now();

        tx.send(reading(Metric::Co2, 1, "1500")).unwrap();
        app.update(t0);
        tx.send(reading(Metric::Co2, 2, "700")).unwrap();
        app.update(t0 + Duration::from_millis(200));
        app.update(t0 + Duration::from_secs(3));

        assert_eq!(app.gauge(Metric::Co2).current(), 700.0);
    }

    #[test]
    fn test_co2_alarm() {
        let (tx, mut app) = app_with(&DashboardConfig::default());
        assert!(!app.co2_alarm_active());

        tx.send(reading(Metric::Co2, 1, "1800")).unwrap();
        app.update(Instant::now());
        assert!(app.co2_alarm_active());
    }

    #[test]
    fn test_table_updates_and_failures() {
        let (_tx, app) = app_with(&DashboardConfig::default());
        let (table_tx, table_rx) = mpsc::unbounded_channel();
        let mut app = app.with_table_updates(table_rx);
        let now = Instant::now();

        table_tx.send(TableSnapshot::from_json(table_json())).unwrap();
        app.update(now);
        assert_eq!(app.table.as_ref().unwrap().rows.len(), 3);
        assert!(app.table_error.is_none());

        table_tx.send(Err(FetchError::Status(503))).unwrap();
        app.update(now);
        assert_eq!(app.table.as_ref().unwrap().rows.len(), 3);
        assert!(app.table_error.as_ref().unwrap().contains("503"));
    }

    #[test]
    fn test_table_selection_is_clamped() {
        let (_tx, mut app) = app_with(&DashboardConfig::default());
        let now = Instant::now();
        app.apply_table_update(TableSnapshot::from_json(table_json()), now);

        app.select_next_n(10);
        assert_eq!(app.selected_row, 2);
        app.select_prev();
        assert_eq!(app.selected_row, 1);
        app.select_first();
        assert_eq!(app.selected_row, 0);
        app.select_last();
        assert_eq!(app.selected_row, 2);

        app.apply_table_update(TableSnapshot::from_json(r#"{"data": [{"a": 1}]}"#), now);
        assert_eq!(app.selected_row, 0);
    }

    #[test]
    fn test_sort_state_is_persisted() {
        let dir = TempDir::new().unwrap();
        let state_file = dir.path().join("table_state.json");
        let config = DashboardConfig {
            table_state_file: Some(state_file.clone()),
            ..Default::default()
        };

        let (_tx, mut app) = app_with(&config);
        app.apply_table_update(TableSnapshot::from_json(table_json()), Instant::now());
        app.cycle_sort();
        app.toggle_sort_direction();

        let (_tx2, reopened) = app_with(&config);
        assert_eq!(reopened.table_state.sort_column, 1);
        assert!(!reopened.table_state.ascending);
    }

    #[test]
    fn test_cycle_sort_without_table_is_noop() {
        let (_tx, mut app) = app_with(&DashboardConfig::default());
        app.cycle_sort();
        assert_eq!(app.table_state.sort_column, 0);
    }

    #[test]
    fn test_export_readings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("readings.json");
        let (tx, mut app) = app_with(&DashboardConfig::default());
        tx.send(reading(Metric::Temperature, 1, "32.456")).unwrap();
        app.update(Instant::now());

        app.export_readings(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let temp = &json["gauges"][1];
        assert_eq!(temp["metric"], "temperature");
        assert_eq!(temp["label"], "32.46");
        assert_eq!(temp["color"], "#f74d0a");
        assert!(json["gauges"][0]["updated_secs_ago"].is_null());
    }

    #[test]
    fn test_export_table_requires_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        let (_tx, mut app) = app_with(&DashboardConfig::default());
        assert!(app.export_table_csv(&path).is_err());

        app.apply_table_update(TableSnapshot::from_json(table_json()), Instant::now());
        app.export_table_csv(&path).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with("time,co2\n"));
    }

    #[test]
    fn test_view_cycle() {
        let (_tx, mut app) = app_with(&DashboardConfig::default());
        assert_eq!(app.current_view, View::Gauges);
        app.next_view();
        assert_eq!(app.current_view, View::Table);
        app.prev_view();
        assert_eq!(app.current_view, View::Gauges);
        assert_eq!(View::ALL.map(|v| v.label()), ["Gauges", "Table"]);
    }
}
