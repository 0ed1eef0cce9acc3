//! Live feed of the most recent samples.
//!
//! The feed is the in-process stand-in for the sample store: appends are
//! stamped with a monotonically non-decreasing `recorded_at`, only the most
//! recent `capacity` samples are retained, and every append pushes the
//! current window to subscribers.

use crate::sensor::types::Sample;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of retained samples.
pub const DEFAULT_FEED_CAPACITY: usize = 50;

/// Queued updates per subscriber before new ones are dropped.
const SUBSCRIBER_BUFFER: usize = 16;

/// Snapshot pushed to subscribers after each append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedUpdate {
    /// Retained samples, oldest first
    pub samples: Vec<Sample>,
    /// Total appends since the feed was created
    pub sequence: u64,
}

impl FeedUpdate {
    /// The newest `len` samples of this update, oldest first.
    pub fn window(&self, len: usize) -> &[Sample] {
        let start = self.samples.len().saturating_sub(len);
        &self.samples[start..]
    }
}

/// Feed errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The feed no longer accepts samples
    Closed,
    /// Internal lock was poisoned by a panicking writer
    Poisoned,
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Closed => write!(f, "Sample feed is closed"),
            FeedError::Poisoned => write!(f, "Sample feed lock poisoned"),
        }
    }
}

impl std::error::Error for FeedError {}

struct FeedInner {
    samples: VecDeque<Sample>,
    subscribers: Vec<Sender<FeedUpdate>>,
    last_recorded: Option<DateTime<Utc>>,
    appended: u64,
    closed: bool,
}

/// Bounded, append-only sample feed.
pub struct SampleFeed {
    capacity: usize,
    inner: Mutex<FeedInner>,
}

impl SampleFeed {
    /// Create a feed retaining at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(FeedInner {
                samples: VecDeque::with_capacity(capacity),
                subscribers: Vec::new(),
                last_recorded: None,
                appended: 0,
                closed: false,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FeedInner>, FeedError> {
        self.inner.lock().map_err(|_| FeedError::Poisoned)
    }

    /// Append a sample, stamping `recorded_at`, and notify subscribers.
    ///
    /// Returns the stored sample.
    pub fn append(&self, mut sample: Sample) -> Result<Sample, FeedError> {
        let mut inner = self.lock()?;
        if inner.closed {
            return Err(FeedError::Closed);
        }

        // Readers must never observe time going backwards
        let now = Utc::now();
        let recorded_at = match inner.last_recorded {
            Some(last) if last > now => last,
            _ => now,
        };
        sample.recorded_at = Some(recorded_at);
        inner.last_recorded = Some(recorded_at);

        if inner.samples.len() == self.capacity {
            inner.samples.pop_front();
        }
        inner.samples.push_back(sample.clone());
        inner.appended += 1;

        if !inner.subscribers.is_empty() {
            let update = FeedUpdate {
                samples: inner.samples.iter().cloned().collect(),
                sequence: inner.appended,
            };
            inner.subscribers.retain(|tx| match tx.try_send(update.clone()) {
                Ok(()) => true,
                // Lagging subscriber, it will catch up on a later update
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
        }

        tracing::debug!(
            sequence = inner.appended,
            retained = inner.samples.len(),
            "Sample appended to feed"
        );

        Ok(sample)
    }

    /// Most recent `limit` samples, newest first.
    pub fn latest(&self, limit: usize) -> Vec<Sample> {
        match self.lock() {
            Ok(inner) => inner.samples.iter().rev().take(limit).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Most recent `len` samples, oldest first.
    pub fn window(&self, len: usize) -> Vec<Sample> {
        let mut samples = self.latest(len);
        samples.reverse();
        samples
    }

    /// Register for a push of the retained window after every append.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<FeedUpdate> {
        let (tx, rx) = bounded(SUBSCRIBER_BUFFER);
        if let Ok(mut inner) = self.lock() {
            if !inner.closed {
                inner.subscribers.push(tx);
            }
        }
        rx
    }

    /// Stop accepting samples and disconnect all subscribers.
    pub fn close(&self) {
        if let Ok(mut inner) = self.lock() {
            inner.closed = true;
            inner.subscribers.clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|inner| inner.closed).unwrap_or(true)
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.samples.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total appends since creation, including evicted samples.
    pub fn appended(&self) -> u64 {
        self.lock().map(|inner| inner.appended).unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SampleFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// Thread-safe shared feed.
pub type SharedFeed = Arc<SampleFeed>;

/// Create a new shared feed.
pub fn create_shared_feed(capacity: usize) -> SharedFeed {
    Arc::new(SampleFeed::new(capacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample(temperature: f64) -> Sample {
        Sample::new(temperature, 4900, 10.0, 2.0, 15.0)
    }

    #[test]
    fn test_append_stamps_recorded_at() {
        let feed = SampleFeed::new(5);
        let stored = feed.append(sample(30.0)).unwrap();
        assert!(stored.is_recorded());
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.appended(), 1);
    }

    #[test]
    fn test_feed_retains_most_recent() {
        let feed = SampleFeed::new(3);
        for i in 0..5 {
            feed.append(sample(i as f64)).unwrap();
        }

        assert_eq!(feed.len(), 3);
        assert_eq!(feed.appended(), 5);

        let latest: Vec<f64> = feed.latest(10).iter().map(|s| s.temperature).collect();
        assert_eq!(latest, vec![4.0, 3.0, 2.0]);

        let window: Vec<f64> = feed.window(2).iter().map(|s| s.temperature).collect();
        assert_eq!(window, vec![3.0, 4.0]);
    }

    #[test]
    fn test_recorded_at_is_non_decreasing() {
        let feed = SampleFeed::new(100);
        for i in 0..50 {
            feed.append(sample(i as f64)).unwrap();
        }
        let window = feed.window(50);
        for pair in window.windows(2) {
            assert!(pair[0].recorded_at <= pair[1].recorded_at);
        }
    }

    #[test]
    fn test_subscriber_receives_window() {
        let feed = SampleFeed::new(4);
        let rx = feed.subscribe();

        feed.append(sample(1.0)).unwrap();
        feed.append(sample(2.0)).unwrap();

        let first = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.samples.len(), 1);

        let second = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.window(1)[0].temperature, 2.0);
        assert_eq!(second.window(10).len(), 2);
    }

    #[test]
    fn test_closed_feed_rejects_appends() {
        let feed = SampleFeed::new(4);
        let rx = feed.subscribe();
        feed.close();

        assert_eq!(feed.append(sample(1.0)), Err(FeedError::Closed));
        assert!(feed.is_closed());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let feed = SampleFeed::new(4);
        let rx = feed.subscribe();
        drop(rx);

        // Must not fail even though the only subscriber went away
        feed.append(sample(1.0)).unwrap();
        assert_eq!(feed.len(), 1);
    }
}
