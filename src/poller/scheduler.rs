use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};

use crate::poller::worker;
use crate::series::SeriesStore;
use crate::signals::SignalDefinition;
use crate::sth::SthClient;

/// Everything the polling task owns.
pub struct Poller {
    pub client: Arc<SthClient>,
    pub definitions: Vec<SignalDefinition>,
    pub timezone: Tz,
    pub period: Duration,
    pub store: SeriesStore,
}

/// Run the poll loop forever.
///
/// The first tick fires immediately. A slow tick pushes the next one back
/// instead of letting ticks pile up, so two ticks never run at once.
pub async fn run_poller(poller: Poller) {
    let Poller {
        client,
        definitions,
        timezone,
        period,
        store,
    } = poller;

    tracing::info!(
        period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        signals = definitions.len(),
        sth = %client.base_url(),
        deduplicate = store.policy().deduplicate,
        max_points = ?store.policy().max_points,
        "Starting STH poller"
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tick: u64 = 0;
    loop {
        ticker.tick().await;
        tick += 1;

        let report = worker::poll_once(&client, &definitions, timezone, &store).await;
        tracing::debug!(
            tick,
            appended = report.total_appended(),
            "Poll tick completed"
        );
    }
}

/// Wait for the poll task and log how it ended.
///
/// `run_poller` never returns on its own, so any completion means the charts
/// have stopped updating.
///
/// # Errors
///
/// Returns the `JoinError` if the task panicked or was cancelled.
pub async fn supervise(handle: JoinHandle<()>) -> Result<(), JoinError> {
    let result = handle.await;
    match &result {
        Ok(()) => tracing::error!("STH poller exited, charts will no longer update"),
        Err(e) if e.is_panic() => {
            tracing::error!(error = %e, "STH poller panicked, charts will no longer update");
        }
        Err(e) => tracing::warn!(error = %e, "STH poller cancelled"),
    }
    result
}
