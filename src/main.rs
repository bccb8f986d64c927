use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sth_dashboard::common::AppState;
use sth_dashboard::config::Config;
use sth_dashboard::poller::{self, Poller};
use sth_dashboard::routes;
use sth_dashboard::series::SeriesStore;
use sth_dashboard::signals;
use sth_dashboard::sth::SthClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sth_dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sth-dashboard...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        sth = %config.sth_base_url(),
        service = %config.fiware_service,
        servicepath = %config.fiware_servicepath,
        timezone = config.local_timezone.name(),
        poll_interval_ms = config.poll_interval_ms,
        last_n = config.poll_last_n,
        "Configuration loaded"
    );

    let client = SthClient::new(&config)?;
    let store = SeriesStore::new(config.append_policy());
    let state = AppState::new(config.clone(), store.subscribe());

    // The poller owns the only write handle to the series buffers
    let poll_task = tokio::spawn(poller::run_poller(Poller {
        client: Arc::new(client),
        definitions: signals::definitions(&config),
        timezone: config.local_timezone,
        period: config.poll_interval(),
        store,
    }));
    tokio::spawn(poller::supervise(poll_task));

    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting dashboard server");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
