//! Shared helpers: a stand-in STH server on an ephemeral port.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use sth_dashboard::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub entity_type: String,
    pub entity_id: String,
    pub attribute: String,
    pub last_n: Option<String>,
    pub fiware_service: Option<String>,
    pub fiware_servicepath: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    responses: Arc<HashMap<String, (StatusCode, String)>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockSth {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockSth {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Default config pointed at this server, rate limiting off.
    pub fn config(&self) -> Config {
        Config {
            sth_host: self.addr.ip().to_string(),
            sth_port: self.addr.port(),
            disable_rate_limiting: true,
            ..Config::default()
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn history(
    State(state): State<MockState>,
    Path((entity_type, entity_id, attribute)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(RecordedRequest {
        entity_type,
        entity_id,
        attribute: attribute.clone(),
        last_n: query.get("lastN").cloned(),
        fiware_service: header_value(&headers, "fiware-service"),
        fiware_servicepath: header_value(&headers, "fiware-servicepath"),
    });

    let (status, body) = state
        .responses
        .get(&attribute)
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, String::new()));

    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

/// Serve `responses` keyed by attribute name; unknown attributes get a 404.
pub async fn spawn_mock_sth(responses: HashMap<String, (StatusCode, String)>) -> MockSth {
    let state = MockState {
        responses: Arc::new(responses),
        requests: Arc::default(),
    };
    let requests = Arc::clone(&state.requests);

    let app = Router::new()
        .route(
            "/STH/v1/contextEntities/type/{entity_type}/id/{entity_id}/attributes/{attribute}",
            get(history),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockSth { addr, requests }
}

/// A well-formed STH body holding `samples` as `(recvTime, attrValue)` pairs.
pub fn sth_body(attribute: &str, samples: &[(&str, &str)]) -> String {
    let values: Vec<_> = samples
        .iter()
        .map(|(recv_time, attr_value)| {
            json!({
                "_id": "5f1e0c6b2a3d",
                "recvTime": recv_time,
                "attrName": attribute,
                "attrType": "Number",
                "attrValue": attr_value,
            })
        })
        .collect();

    json!({
        "contextResponses": [{
            "contextElement": {
                "attributes": [{ "name": attribute, "values": values }],
                "id": "urn:ngsi-ld:Lamp:003",
                "isPattern": false,
                "type": "Lamp"
            },
            "statusCode": { "code": "200", "reasonPhrase": "OK" }
        }]
    })
    .to_string()
}

pub fn ok(body: String) -> (StatusCode, String) {
    (StatusCode::OK, body)
}
