//! Channel-based reading source.
//!
//! The poll scheduler pushes readings into an unbounded tokio channel and the
//! UI drains it once per frame.

use tokio::sync::mpsc;

use super::{Reading, ReadingSource};

/// A reading source fed by the poll scheduler.
///
/// # Example
///
/// ```
/// use sensorwatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("http://co2meter.local");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<Reading>,
    description: String,
    last_error: Option<String>,
}

impl ChannelSource {
    /// Wrap the receiving end of a reading channel.
    pub fn new(receiver: mpsc::UnboundedReceiver<Reading>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("polling: {}", source_description),
            last_error: None,
        }
    }

    /// Create a channel pair for sending readings to a ChannelSource.
    pub fn create(source_description: &str) -> (mpsc::UnboundedSender<Reading>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, source_description))
    }
}

impl ReadingSource for ChannelSource {
    fn poll(&mut self) -> Option<Reading> {
        match self.receiver.try_recv() {
            Ok(reading) => Some(reading),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.last_error = Some("Poller stopped".to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
