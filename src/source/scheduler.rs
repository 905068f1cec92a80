//! Per-metric poll timers.
//!
//! Every metric gets its own repeating task. A tick never waits on a fetch:
//! the request is spawned as a separate task, so a slow or failing endpoint
//! cannot delay its own cadence or any other metric's.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::data::{Metric, MetricChannel};

use super::{MetricFetcher, Reading};

/// Lower bound on a timer period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Issues fetches for one channel and forwards successful bodies.
#[derive(Clone)]
pub struct Dispatcher {
    channel: MetricChannel,
    fetcher: Arc<dyn MetricFetcher>,
    sender: mpsc::UnboundedSender<Reading>,
    last_seq: Arc<AtomicU64>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channel", &self.channel)
            .field("last_seq", &self.last_seq.load(Ordering::Relaxed))
            .finish()
    }
}

impl Dispatcher {
    pub fn metric(&self) -> Metric {
        self.channel.metric
    }

    /// Sequence number of the most recent dispatch (0 before the first).
    pub fn last_seq(&self) -> u64 {
        self.last_seq.load(Ordering::Relaxed)
    }

    /// Spawn one fetch and return its sequence number.
    pub fn dispatch(&self, runtime: &Handle) -> u64 {
        let seq = self.last_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let metric = self.channel.metric;
        let path = self.channel.path.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();

        runtime.spawn(async move {
            match fetcher.fetch(&path).await {
                Ok(body) => {
                    // Receiver gone means the UI is shutting down.
                    let _ = sender.send(Reading { metric, seq, body });
                }
                Err(e) => {
                    debug!(metric = metric.label(), seq, error = %e, "dropping failed fetch");
                }
            }
        });
        seq
    }
}

/// Builds and starts the per-metric timers.
pub struct PollScheduler {
    fetcher: Arc<dyn MetricFetcher>,
    sender: mpsc::UnboundedSender<Reading>,
}

impl PollScheduler {
    pub fn new(fetcher: Arc<dyn MetricFetcher>, sender: mpsc::UnboundedSender<Reading>) -> Self {
        Self { fetcher, sender }
    }

    /// Start one timer per channel. Must be called from within a tokio runtime.
    ///
    /// Each timer fires immediately, then once per interval until the handle
    /// is shut down.
    pub fn spawn(&self, channels: &[MetricChannel]) -> PollHandle {
        let runtime = Handle::current();
        let mut dispatchers = Vec::with_capacity(channels.len());
        let mut tasks = Vec::with_capacity(channels.len());

        for channel in channels {
            let dispatcher = Dispatcher {
                channel: channel.clone(),
                fetcher: Arc::clone(&self.fetcher),
                sender: self.sender.clone(),
                last_seq: Arc::new(AtomicU64::new(0)),
            };
            tasks.push(spawn_timer(dispatcher.clone(), channel.interval, runtime.clone()));
            dispatchers.push(dispatcher);
        }

        PollHandle {
            runtime,
            dispatchers,
            tasks,
        }
    }
}

fn spawn_timer(dispatcher: Dispatcher, period: Duration, runtime: Handle) -> JoinHandle<()> {
    runtime.clone().spawn(async move {
        let mut ticker = tokio::time::interval(period.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            dispatcher.dispatch(&runtime);
        }
    })
}

/// Running poll timers.
#[derive(Debug)]
pub struct PollHandle {
    runtime: Handle,
    dispatchers: Vec<Dispatcher>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollHandle {
    /// Fetch every metric now, outside the regular cadence.
    pub fn refresh_all(&self) {
        for dispatcher in &self.dispatchers {
            let seq = dispatcher.dispatch(&self.runtime);
            debug!(metric = dispatcher.metric().label(), seq, "manual refresh");
        }
    }

    pub fn dispatchers(&self) -> &[Dispatcher] {
        &self.dispatchers
    }

    /// Stop all timers. Fetches already in flight run to completion.
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Counts calls per path; `/co2` can be made to fail or stall.
    #[derive(Default)]
    struct FakeFetcher {
        calls: Mutex<HashMap<String, usize>>,
        fail_co2: bool,
        co2_delay: Option<Duration>,
    }

    impl FakeFetcher {
        fn calls(&self, path: &str) -> usize {
            self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl MetricFetcher for FakeFetcher {
        async fn fetch(&self, path: &str) -> Result<String, FetchError> {
            *self.calls.lock().unwrap().entry(path.to_string()).or_default() += 1;
            if path == "/co2" {
                if let Some(delay) = self.co2_delay {
                    tokio::time::sleep(delay).await;
                }
                if self.fail_co2 {
                    return Err(FetchError::Status(500));
                }
            }
            Ok("42".to_string())
        }
    }

    fn default_channels() -> Vec<MetricChannel> {
        Metric::ALL.into_iter().map(MetricChannel::with_defaults).collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Reading>) -> Vec<Reading> {
        let mut out = Vec::new();
        while let Ok(r) = rx.try_recv() {
            out.push(r);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_for_every_metric() {
        let fetcher = Arc::new(FakeFetcher::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = PollScheduler::new(fetcher.clone(), tx).spawn(&default_channels());

        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(fetcher.calls("/co2"), 1);
        assert_eq!(fetcher.calls("/temp"), 1);
        assert_eq!(fetcher.calls("/humidity"), 1);
        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_cadences() {
        let fetcher = Arc::new(FakeFetcher::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let _handle = PollScheduler::new(fetcher.clone(), tx).spawn(&default_channels());

        tokio::time::sleep(Duration::from_millis(30_001)).await;

        // Ticks at 0, 5, ..., 30s for CO2; 0 and 30s for the slow pair.
        assert_eq!(fetcher.calls("/co2"), 7);
        assert_eq!(fetcher.calls("/temp"), 2);
        assert_eq!(fetcher.calls("/humidity"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_ticks() {
        let fetcher = Arc::new(FakeFetcher {
            fail_co2: true,
            ..Default::default()
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = PollScheduler::new(fetcher.clone(), tx).spawn(&default_channels());

        tokio::time::sleep(Duration::from_millis(10_001)).await;

        assert_eq!(fetcher.calls("/co2"), 3);
        let readings = drain(&mut rx);
        assert!(readings.iter().all(|r| r.metric != Metric::Co2));
        assert_eq!(readings.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_does_not_block_next_tick() {
        let fetcher = Arc::new(FakeFetcher {
            co2_delay: Some(Duration::from_secs(12)),
            ..Default::default()
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = PollScheduler::new(fetcher.clone(), tx).spawn(&default_channels());

        tokio::time::sleep(Duration::from_millis(10_001)).await;
        assert_eq!(fetcher.calls("/co2"), 3);
        assert!(drain(&mut rx).iter().all(|r| r.metric != Metric::Co2));

        tokio::time::sleep(Duration::from_secs(2)).await;
        let co2: Vec<u64> = drain(&mut rx)
            .into_iter()
            .filter(|r| r.metric == Metric::Co2)
            .map(|r| r.seq)
            .collect();
        assert_eq!(co2, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_numbers_are_per_metric() {
        let fetcher = Arc::new(FakeFetcher::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = PollScheduler::new(fetcher.clone(), tx).spawn(&default_channels());

        tokio::time::sleep(Duration::from_millis(10_001)).await;

        let readings = drain(&mut rx);
        let co2: Vec<u64> =
            readings.iter().filter(|r| r.metric == Metric::Co2).map(|r| r.seq).collect();
        let temp: Vec<u64> =
            readings.iter().filter(|r| r.metric == Metric::Temperature).map(|r| r.seq).collect();
        assert_eq!(co2, vec![1, 2, 3]);
        assert_eq!(temp, vec![1]);
        assert_eq!(handle.dispatchers()[0].metric(), Metric::Co2);
        assert_eq!(handle.dispatchers()[0].last_seq(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_all_and_shutdown() {
        let fetcher = Arc::new(FakeFetcher::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = PollScheduler::new(fetcher.clone(), tx).spawn(&default_channels());

        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.refresh_all();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fetcher.calls("/temp"), 2);

        handle.shutdown();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.calls("/temp"), 2);
        assert_eq!(fetcher.calls("/co2"), 2);
    }
}
