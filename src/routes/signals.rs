use axum::{
    extract::{Path, Query, State},
    http::{
        header::{self, HeaderMap, HeaderValue},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::render::{self, ChartFigure};
use crate::series::SeriesBuffer;
use crate::signals::Signal;
use crate::timeconv::format_local;

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignalResponse {
    pub signal: Signal,
    pub label: String,
    pub entity_type: String,
    pub entity_id: String,
    pub attribute: String,
    /// Points currently buffered
    pub points: usize,
    /// Oldest buffered timestamp (local time)
    pub first: Option<String>,
    /// Newest buffered timestamp (local time)
    pub last: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeriesResponse {
    pub signal: Signal,
    /// Local timestamps in append order
    pub timestamps: Vec<String>,
    /// Values, same length as timestamps
    pub values: Vec<f64>,
    /// Mean of all values (null when empty)
    pub mean: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SeriesQuery {
    /// Response format: json (default), ndjson, csv
    #[serde(default = "default_format")]
    pub format: String,
}

fn determine_format(query_format: &str, headers: &HeaderMap) -> String {
    // Query parameter takes precedence
    if query_format != "json" {
        return query_format.to_lowercase();
    }

    // Then the Accept header
    if let Some(accept) = headers.get(header::ACCEPT)
        && let Ok(accept_str) = accept.to_str()
    {
        if accept_str.contains("application/x-ndjson") {
            return "ndjson".to_string();
        }
        if accept_str.contains("text/csv") {
            return "csv".to_string();
        }
    }

    "json".to_string()
}

fn build_csv_response(signal: Signal, buffer: &SeriesBuffer) -> AppResult<Response> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    // Header row: time plus the signal column
    writer
        .write_record(["time", signal.slug()])
        .map_err(|e| AppError::Internal(e.to_string()))?;
    for (ts, value) in buffer.points() {
        writer
            .write_record([format_local(ts), value.to_string()])
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"))
        .body(axum::body::Body::from(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn build_ndjson_response(signal: Signal, buffer: &SeriesBuffer) -> AppResult<Response> {
    let mut body = String::new();
    for (ts, value) in buffer.points() {
        let mut obj = serde_json::Map::new();
        obj.insert("time".to_string(), serde_json::json!(format_local(ts)));
        obj.insert(signal.slug().to_string(), serde_json::json!(value));
        body.push_str(&serde_json::Value::Object(obj).to_string());
        body.push('\n');
    }

    Response::builder()
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-ndjson"),
        )
        .body(axum::body::Body::from(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// List the dashboard signals
#[utoipa::path(
    get,
    path = "/api/signals",
    responses(
        (status = 200, description = "Signals retrieved successfully", body = Vec<SignalResponse>),
    ),
    tag = "signals"
)]
pub async fn list_signals(State(state): State<AppState>) -> Json<Vec<SignalResponse>> {
    let response = state
        .definitions
        .iter()
        .map(|definition| {
            let snapshot = state.feeds.snapshot(definition.signal);
            SignalResponse {
                signal: definition.signal,
                label: definition.signal.label().to_string(),
                entity_type: definition.entity_type.clone(),
                entity_id: definition.entity_id.clone(),
                attribute: definition.attribute.clone(),
                points: snapshot.len(),
                first: snapshot.first_timestamp().map(format_local),
                last: snapshot.last_timestamp().map(format_local),
            }
        })
        .collect();

    Json(response)
}

/// Current chart for one signal
///
/// Returns a Plotly figure: the readings trace and the dashed mean line. An
/// empty buffer yields a figure without traces or layout.
#[utoipa::path(
    get,
    path = "/api/signals/{signal}/figure",
    params(
        ("signal" = Signal, Path, description = "luminosity, humidity or temperature"),
    ),
    responses(
        (status = 200, description = "Figure rendered", body = ChartFigure),
        (status = 404, description = "Unknown signal"),
    ),
    tag = "signals"
)]
pub async fn get_figure(
    State(state): State<AppState>,
    Path(signal): Path<String>,
) -> AppResult<Json<ChartFigure>> {
    let signal: Signal = signal.parse()?;
    let snapshot = state.feeds.snapshot(signal);

    Ok(Json(render::render(signal, &snapshot)))
}

/// Raw buffered series for one signal
///
/// Supports JSON, CSV, and NDJSON formats.
#[utoipa::path(
    get,
    path = "/api/signals/{signal}/series",
    params(
        ("signal" = Signal, Path, description = "luminosity, humidity or temperature"),
        SeriesQuery
    ),
    responses(
        (status = 200, description = "Series retrieved successfully", body = SeriesResponse),
        (status = 400, description = "Unsupported format"),
        (status = 404, description = "Unknown signal"),
    ),
    tag = "signals"
)]
pub async fn get_series(
    State(state): State<AppState>,
    Path(signal): Path<String>,
    Query(query): Query<SeriesQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let signal: Signal = signal.parse()?;
    let format = determine_format(&query.format, &headers);
    let snapshot = state.feeds.snapshot(signal);

    match format.as_str() {
        "csv" => build_csv_response(signal, &snapshot),
        "ndjson" => build_ndjson_response(signal, &snapshot),
        "json" => Ok((
            StatusCode::OK,
            Json(SeriesResponse {
                signal,
                timestamps: snapshot.timestamps().iter().map(format_local).collect(),
                values: snapshot.values().to_vec(),
                mean: render::mean(snapshot.values()),
            }),
        )
            .into_response()),
        other => Err(AppError::BadRequest(format!(
            "Unsupported format '{other}', expected json, csv or ndjson"
        ))),
    }
}
