//! End-to-end tests: one poll tick against a stand-in STH server.
//!
//! Run with: cargo test --test poller_test

mod common;

use axum::http::StatusCode;
use chrono::Timelike;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{ok, spawn_mock_sth, sth_body};
use sth_dashboard::poller::{self, PollOutcome, Poller};
use sth_dashboard::render;
use sth_dashboard::series::{AppendPolicy, SeriesStore};
use sth_dashboard::signals::{self, Signal};
use sth_dashboard::sth::SthClient;

const LUMINOSITY: [(&str, &str); 3] = [
    ("2024-01-01T12:00:00.000Z", "10.0"),
    ("2024-01-01T12:00:10.000Z", "12.0"),
    ("2024-01-01T12:00:20.000Z", "14.0"),
];

#[tokio::test]
async fn one_tick_fills_the_luminosity_buffer() {
    let mock = spawn_mock_sth(HashMap::from([(
        "luminosity".to_string(),
        ok(sth_body("luminosity", &LUMINOSITY)),
    )]))
    .await;
    let config = mock.config();
    let client = SthClient::new(&config).unwrap();
    let store = SeriesStore::new(config.append_policy());
    let definitions = signals::definitions(&config);

    let report = poller::poll_once(&client, &definitions, config.local_timezone, &store).await;

    assert_eq!(report.outcome(Signal::Luminosity), Some(&PollOutcome::Appended(3)));
    // Humidity and temperature are 404 on the mock
    assert_eq!(report.outcome(Signal::Humidity), Some(&PollOutcome::NoData));
    assert_eq!(report.outcome(Signal::Temperature), Some(&PollOutcome::NoData));

    let buffer = store.snapshot(Signal::Luminosity);
    assert_eq!(buffer.values(), &[10.0, 12.0, 14.0]);
    let hours: Vec<u32> = buffer.timestamps().iter().map(Timelike::hour).collect();
    assert_eq!(hours, vec![9, 9, 9]);
    assert!(buffer.timestamps().windows(2).all(|w| w[0] < w[1]));

    let figure = render::render(Signal::Luminosity, &buffer);
    assert_eq!(figure.mean(), Some(12.0));

    assert!(store.snapshot(Signal::Humidity).is_empty());
    assert!(store.snapshot(Signal::Temperature).is_empty());
}

#[tokio::test]
async fn signals_are_fetched_in_order() {
    let mock = spawn_mock_sth(HashMap::new()).await;
    let config = mock.config();
    let client = SthClient::new(&config).unwrap();
    let store = SeriesStore::new(AppendPolicy::default());

    poller::poll_once(
        &client,
        &signals::definitions(&config),
        config.local_timezone,
        &store,
    )
    .await;

    let requests = mock.requests();
    let attributes: Vec<&str> = requests.iter().map(|r| r.attribute.as_str()).collect();
    assert_eq!(attributes, vec!["luminosity", "humidity", "temperature"]);
    assert_eq!(requests[0].entity_type, "Lamp");
    assert_eq!(requests[0].entity_id, "urn:ngsi-ld:Lamp:003");
    assert_eq!(requests[1].entity_id, "urn:ngsi-ld:DHT:001");
    assert!(requests.iter().all(|r| r.last_n.as_deref() == Some("10")));
}

#[tokio::test]
async fn failures_stay_with_their_signal() {
    let mock = spawn_mock_sth(HashMap::from([
        (
            "luminosity".to_string(),
            (StatusCode::SERVICE_UNAVAILABLE, String::new()),
        ),
        (
            "humidity".to_string(),
            ok(sth_body("humidity", &[("yesterday at noon", "55.0")])),
        ),
        (
            "temperature".to_string(),
            ok(sth_body(
                "temperature",
                &[("2024-01-01T12:00:00Z", "22.5"), ("2024-01-01T12:00:10Z", "23.0")],
            )),
        ),
    ]))
    .await;
    let config = mock.config();
    let client = SthClient::new(&config).unwrap();
    let store = SeriesStore::new(config.append_policy());

    let report = poller::poll_once(
        &client,
        &signals::definitions(&config),
        config.local_timezone,
        &store,
    )
    .await;

    assert_eq!(report.outcome(Signal::Luminosity), Some(&PollOutcome::NoData));
    assert!(matches!(
        report.outcome(Signal::Humidity),
        Some(PollOutcome::Failed(_))
    ));
    assert_eq!(report.appended(Signal::Temperature), 2);

    assert!(store.snapshot(Signal::Luminosity).is_empty());
    assert!(store.snapshot(Signal::Humidity).is_empty());
    assert_eq!(store.snapshot(Signal::Temperature).values(), &[22.5, 23.0]);
}

#[tokio::test]
async fn non_numeric_value_leaves_buffer_untouched() {
    let mock = spawn_mock_sth(HashMap::from([(
        "luminosity".to_string(),
        ok(sth_body(
            "luminosity",
            &[("2024-01-01T12:00:00Z", "10"), ("2024-01-01T12:00:10Z", "n/a")],
        )),
    )]))
    .await;
    let config = mock.config();
    let client = SthClient::new(&config).unwrap();
    let store = SeriesStore::new(config.append_policy());
    let definitions = signals::definitions(&config);

    let result = poller::poll_signal(&client, &definitions[0], config.local_timezone, &store).await;

    assert!(result.is_err());
    assert!(store.snapshot(Signal::Luminosity).is_empty());
}

#[tokio::test]
async fn repeated_ticks_accumulate_duplicates_by_default() {
    let mock = spawn_mock_sth(HashMap::from([(
        "luminosity".to_string(),
        ok(sth_body("luminosity", &LUMINOSITY)),
    )]))
    .await;
    let config = mock.config();
    let client = SthClient::new(&config).unwrap();
    let store = SeriesStore::new(config.append_policy());
    let definitions = signals::definitions(&config);

    for _ in 0..2 {
        poller::poll_once(&client, &definitions, config.local_timezone, &store).await;
    }

    let buffer = store.snapshot(Signal::Luminosity);
    assert_eq!(buffer.values(), &[10.0, 12.0, 14.0, 10.0, 12.0, 14.0]);
}

#[tokio::test]
async fn deduplicating_policy_skips_seen_samples() {
    let mock = spawn_mock_sth(HashMap::from([(
        "luminosity".to_string(),
        ok(sth_body("luminosity", &LUMINOSITY)),
    )]))
    .await;
    let mut config = mock.config();
    config.series_deduplicate = true;
    let client = SthClient::new(&config).unwrap();
    let store = SeriesStore::new(config.append_policy());
    let definitions = signals::definitions(&config);

    let first = poller::poll_once(&client, &definitions, config.local_timezone, &store).await;
    let second = poller::poll_once(&client, &definitions, config.local_timezone, &store).await;

    assert_eq!(first.appended(Signal::Luminosity), 3);
    assert_eq!(second.appended(Signal::Luminosity), 0);
    assert_eq!(store.snapshot(Signal::Luminosity).len(), 3);
}

#[tokio::test]
async fn scheduler_publishes_to_subscribers() {
    let mock = spawn_mock_sth(HashMap::from([(
        "luminosity".to_string(),
        ok(sth_body("luminosity", &LUMINOSITY)),
    )]))
    .await;
    let config = mock.config();
    let store = SeriesStore::new(config.append_policy());
    let feeds = store.subscribe();
    let mut receiver = feeds.receiver(Signal::Luminosity);

    let task = tokio::spawn(poller::run_poller(Poller {
        client: Arc::new(SthClient::new(&config).unwrap()),
        definitions: signals::definitions(&config),
        timezone: config.local_timezone,
        period: Duration::from_secs(3600),
        store,
    }));

    // The first tick fires immediately
    tokio::time::timeout(Duration::from_secs(5), receiver.changed())
        .await
        .expect("timed out waiting for the first tick")
        .unwrap();
    assert_eq!(feeds.snapshot(Signal::Luminosity).len(), 3);

    task.abort();
}

#[tokio::test]
async fn supervisor_reports_a_crashed_poller() {
    let handle: tokio::task::JoinHandle<()> = tokio::spawn(async {
        panic!("poll loop blew up");
    });

    let err = poller::supervise(handle).await.unwrap_err();
    assert!(err.is_panic());
}

#[tokio::test]
async fn supervisor_reports_a_cancelled_poller() {
    let mock = spawn_mock_sth(HashMap::new()).await;
    let config = mock.config();
    let handle = tokio::spawn(poller::run_poller(Poller {
        client: Arc::new(SthClient::new(&config).unwrap()),
        definitions: signals::definitions(&config),
        timezone: config.local_timezone,
        period: Duration::from_secs(3600),
        store: SeriesStore::new(AppendPolicy::default()),
    }));
    handle.abort();

    let err = poller::supervise(handle).await.unwrap_err();
    assert!(err.is_cancelled());
}
