pub mod dashboard;
pub mod health;
mod rate_limit;
pub mod signals;
pub mod stream;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use rate_limit::ClientIpKeyExtractor;

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        signals::list_signals,
        signals::get_figure,
        signals::get_series,
    ),
    components(
        schemas(
            crate::signals::Signal,
            signals::SignalResponse,
            signals::SeriesResponse,
            crate::render::ChartFigure,
            crate::render::Trace,
            crate::render::Line,
            crate::render::Layout,
            crate::render::Title,
            crate::render::Axis,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "signals", description = "Luminosity, humidity and temperature series and charts"),
    ),
    info(
        title = "STH Dashboard API",
        description = "Live charts of FIWARE STH sensor history",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let data_routes_base = Router::new()
        .route("/signals", get(signals::list_signals))
        .route("/signals/{signal}/figure", get(signals::get_figure))
        .route("/signals/{signal}/series", get(signals::get_series));

    let limiter = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        None
    } else {
        let built = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish();
        if built.is_none() {
            tracing::warn!(
                per_second = config.rate_limit_per_second,
                burst = config.rate_limit_burst,
                "Invalid rate limit settings, rate limiting DISABLED"
            );
        } else {
            tracing::info!(
                data_rate = %format!("{}/s burst {}", config.rate_limit_per_second, config.rate_limit_burst),
                "Rate limiting configured"
            );
        }
        built
    };

    let data_routes = match limiter {
        Some(limiter) => data_routes_base.layer(GovernorLayer {
            config: Arc::new(limiter),
        }),
        None => data_routes_base,
    };

    // The event stream is long-lived, keep it out of the limiter
    let api_routes = Router::new()
        .merge(data_routes)
        .route("/stream", get(stream::stream_figures))
        .layer(RequestBodyLimitLayer::new(64 * 1024));

    let page_routes = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/healthz", get(health::healthz));

    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(page_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
