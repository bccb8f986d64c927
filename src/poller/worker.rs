use chrono_tz::Tz;

use crate::error::AppResult;
use crate::series::SeriesStore;
use crate::signals::{Signal, SignalDefinition};
use crate::sth::{SensorSample, SthClient};
use crate::timeconv;

/// What one tick did for one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Samples were fetched; this many points were added to the buffer.
    Appended(usize),
    /// The fetch yielded nothing; the buffer is untouched.
    NoData,
    /// Samples could not be converted; the buffer is untouched.
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub outcomes: Vec<(Signal, PollOutcome)>,
}

impl PollReport {
    #[must_use]
    pub fn outcome(&self, signal: Signal) -> Option<&PollOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == signal)
            .map(|(_, outcome)| outcome)
    }

    /// Points appended for `signal` this tick.
    #[must_use]
    pub fn appended(&self, signal: Signal) -> usize {
        match self.outcome(signal) {
            Some(PollOutcome::Appended(n)) => *n,
            _ => 0,
        }
    }

    #[must_use]
    pub fn total_appended(&self) -> usize {
        Signal::ALL.into_iter().map(|s| self.appended(s)).sum()
    }
}

/// Fetch, convert and append one signal.
///
/// # Errors
///
/// Returns an error if an `attrValue` is not numeric or a `recvTime` matches
/// neither tolerated timestamp shape. Nothing is appended in that case.
pub async fn poll_signal(
    client: &SthClient,
    definition: &SignalDefinition,
    tz: Tz,
    store: &SeriesStore,
) -> AppResult<PollOutcome> {
    let samples = client
        .fetch(
            &definition.entity_type,
            &definition.entity_id,
            &definition.attribute,
            definition.last_n,
        )
        .await;

    if samples.is_empty() {
        return Ok(PollOutcome::NoData);
    }

    let values = samples
        .iter()
        .map(SensorSample::value)
        .collect::<AppResult<Vec<f64>>>()?;
    let raw_times: Vec<&str> = samples.iter().map(|s| s.recv_time.as_str()).collect();
    let timestamps = timeconv::to_local(raw_times.as_slice(), tz)?;

    let appended = store.append(definition.signal, timestamps, values)?;
    Ok(PollOutcome::Appended(appended))
}

/// One tick: every signal in order, each isolated from the others' failures.
pub async fn poll_once(
    client: &SthClient,
    definitions: &[SignalDefinition],
    tz: Tz,
    store: &SeriesStore,
) -> PollReport {
    let mut report = PollReport::default();

    for definition in definitions {
        let outcome = match poll_signal(client, definition, tz, store).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    signal = %definition.signal,
                    "Failed to convert samples, skipping signal this tick"
                );
                PollOutcome::Failed(e.to_string())
            }
        };

        if let PollOutcome::Appended(n) = outcome {
            tracing::debug!(
                signal = %definition.signal,
                appended = n,
                total = store.snapshot(definition.signal).len(),
                "Series updated"
            );
        }

        report.outcomes.push((definition.signal, outcome));
    }

    report
}
