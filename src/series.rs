//! In-memory series buffers, one per signal.
//!
//! The poller is the only writer. Every buffer sits behind a `watch` channel as an
//! `Arc<SeriesBuffer>` snapshot: appends are copy-on-write, so readers holding an
//! older snapshot never observe a partially extended buffer. Subscribers are woken
//! only when an append actually added points.

use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::watch;

use crate::signals::Signal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("{timestamps} timestamps but {values} values")]
    LengthMismatch { timestamps: usize, values: usize },
}

/// How new points are merged into a buffer.
///
/// The default keeps every fetched point, duplicates included, without bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendPolicy {
    /// Only append points strictly newer than the buffer's last timestamp.
    pub deduplicate: bool,
    /// Drop the oldest points beyond this many.
    pub max_points: Option<usize>,
}

/// Parallel timestamp/value vectors of equal length, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesBuffer {
    timestamps: Vec<DateTime<Tz>>,
    values: Vec<f64>,
}

impl SeriesBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `SeriesError::LengthMismatch` if the vectors differ in length.
    pub fn from_parts(timestamps: Vec<DateTime<Tz>>, values: Vec<f64>) -> Result<Self, SeriesError> {
        let mut buffer = Self::new();
        buffer.extend(timestamps, values, AppendPolicy::default())?;
        Ok(buffer)
    }

    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Tz>] {
        &self.timestamps
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() || self.values.is_empty()
    }

    #[must_use]
    pub fn first_timestamp(&self) -> Option<&DateTime<Tz>> {
        self.timestamps.first()
    }

    #[must_use]
    pub fn last_timestamp(&self) -> Option<&DateTime<Tz>> {
        self.timestamps.last()
    }

    pub fn points(&self) -> impl Iterator<Item = (&DateTime<Tz>, f64)> {
        self.timestamps.iter().zip(self.values.iter().copied())
    }

    /// Append points in order, returning how many were added.
    ///
    /// # Errors
    ///
    /// Returns `SeriesError::LengthMismatch` without touching the buffer if the
    /// inputs differ in length.
    pub fn extend(
        &mut self,
        timestamps: Vec<DateTime<Tz>>,
        values: Vec<f64>,
        policy: AppendPolicy,
    ) -> Result<usize, SeriesError> {
        if timestamps.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }

        let mut appended = 0;
        for (ts, value) in timestamps.into_iter().zip(values) {
            if policy.deduplicate && self.timestamps.last().is_some_and(|last| ts <= *last) {
                continue;
            }
            self.timestamps.push(ts);
            self.values.push(value);
            appended += 1;
        }

        if let Some(max) = policy.max_points
            && self.timestamps.len() > max
        {
            let excess = self.timestamps.len() - max;
            self.timestamps.drain(..excess);
            self.values.drain(..excess);
        }

        Ok(appended)
    }
}

/// Writer side: owns the three buffers. Not `Clone`, so there is one writer.
pub struct SeriesStore {
    senders: [watch::Sender<Arc<SeriesBuffer>>; 3],
    policy: AppendPolicy,
}

impl SeriesStore {
    #[must_use]
    pub fn new(policy: AppendPolicy) -> Self {
        Self {
            senders: std::array::from_fn(|_| watch::Sender::new(Arc::new(SeriesBuffer::new()))),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> AppendPolicy {
        self.policy
    }

    /// Append converted points to `signal`'s buffer and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns `SeriesError::LengthMismatch` if the inputs differ in length.
    pub fn append(
        &self,
        signal: Signal,
        timestamps: Vec<DateTime<Tz>>,
        values: Vec<f64>,
    ) -> Result<usize, SeriesError> {
        if timestamps.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        if timestamps.is_empty() {
            return Ok(0);
        }

        let policy = self.policy;
        let mut outcome = Ok(0);
        self.senders[signal.index()].send_if_modified(|buffer| {
            outcome = Arc::make_mut(buffer).extend(timestamps, values, policy);
            matches!(outcome, Ok(n) if n > 0)
        });
        outcome
    }

    #[must_use]
    pub fn snapshot(&self, signal: Signal) -> Arc<SeriesBuffer> {
        Arc::clone(&self.senders[signal.index()].borrow())
    }

    /// Reader handles for all three buffers.
    #[must_use]
    pub fn subscribe(&self) -> SeriesFeeds {
        SeriesFeeds {
            receivers: std::array::from_fn(|i| self.senders[i].subscribe()),
        }
    }
}

/// Reader side, cheap to clone into request handlers.
#[derive(Clone)]
pub struct SeriesFeeds {
    receivers: [watch::Receiver<Arc<SeriesBuffer>>; 3],
}

impl SeriesFeeds {
    /// Latest published buffer for `signal`.
    #[must_use]
    pub fn snapshot(&self, signal: Signal) -> Arc<SeriesBuffer> {
        Arc::clone(&self.receivers[signal.index()].borrow())
    }

    /// A fresh receiver, e.g. for a streaming subscriber.
    #[must_use]
    pub fn receiver(&self, signal: Signal) -> watch::Receiver<Arc<SeriesBuffer>> {
        self.receivers[signal.index()].clone()
    }
}
