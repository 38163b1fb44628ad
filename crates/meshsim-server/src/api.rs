//! The control-plane HTTP API.
//!
//! Wire contract (field casing matches the control client):
//!
//! - `POST /create_peer` `{StartCoord: [lat, lon], Script, Meta}` → `{id}`
//! - `POST /delete_peer` `{ID}` → `{ok: true}`
//! - `POST /send_msg` `{ID, Data, TargetIDs}` → `{ok: true}`; empty
//!   `TargetIDs` broadcasts to the peer's current neighbors
//! - `GET /state_overview` → `{TS, Actors}`
//! - `GET /health` → liveness probe
//!
//! Every failure is a JSON body with a non-2xx status.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use meshsim_core::{Error, GeoCoord, MeshSim, Metadata, Overview, PeerId};

type AppState = Arc<MeshSim>;

/// Build the API router.
pub fn build_router(sim: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/create_peer", post(create_peer))
        .route("/delete_peer", post(delete_peer))
        .route("/send_msg", post(send_msg))
        .route("/state_overview", get(state_overview))
        .layer(CorsLayer::permissive())
        .with_state(sim)
}

/// An API failure, rendered as a JSON error body.
#[derive(Debug)]
pub enum ApiError {
    /// The request body did not parse.
    BadRequest(String),
    /// A simulator operation failed.
    Core(Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Core(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Core(e) => {
                let status = match &e {
                    Error::InvalidCoordinate(_) | Error::InvalidScript(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    Error::NotFound(_) => StatusCode::NOT_FOUND,
                    Error::ResourceExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
                    Error::Shutdown => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, e.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// --- Health ---

async fn health() -> &'static str {
    "OK"
}

// --- Peer lifecycle ---

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePeerRequest {
    #[serde(rename = "StartCoord")]
    pub start_coord: [f64; 2],
    #[serde(rename = "Script")]
    pub script: String,
    #[serde(rename = "Meta", default)]
    pub meta: Metadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePeerResponse {
    pub id: PeerId,
}

async fn create_peer(
    State(sim): State<AppState>,
    body: Result<Json<CreatePeerRequest>, JsonRejection>,
) -> Result<Json<CreatePeerResponse>, ApiError> {
    let Json(req) = body?;
    let coord = GeoCoord::new(req.start_coord[0], req.start_coord[1]);
    let id = sim
        .sessions()
        .create_script_peer(coord, &req.script, req.meta)?;
    Ok(Json(CreatePeerResponse { id }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletePeerRequest {
    #[serde(rename = "ID")]
    pub id: PeerId,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

async fn delete_peer(
    State(sim): State<AppState>,
    body: Result<Json<DeletePeerRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(req) = body?;
    sim.sessions().delete_peer(&req.id)?;
    Ok(Json(Ack { ok: true }))
}

// --- Message injection ---

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMsgRequest {
    #[serde(rename = "ID")]
    pub id: PeerId,
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "TargetIDs", default)]
    pub target_ids: Vec<PeerId>,
}

async fn send_msg(
    State(sim): State<AppState>,
    body: Result<Json<SendMsgRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(req) = body?;
    sim.send_message(req.id, req.target_ids, req.data).await?;
    Ok(Json(Ack { ok: true }))
}

// --- Observation ---

async fn state_overview(State(sim): State<AppState>) -> Json<Overview> {
    Json(sim.overview())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshsim_core::SimConfig;
    use std::time::Duration;

    fn test_sim() -> AppState {
        Arc::new(MeshSim::start(SimConfig {
            tick_interval: Duration::from_millis(10),
            ..SimConfig::default()
        }))
    }

    fn create_request(script: &str) -> CreatePeerRequest {
        CreatePeerRequest {
            start_coord: [53.904153, 27.556925],
            script: script.to_string(),
            meta: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn router_builds() {
        let sim = test_sim();
        let _router = build_router(Arc::clone(&sim));
        sim.shutdown();
    }

    #[test]
    fn create_request_wire_shape() {
        let body = r#"{"StartCoord": [53.9, 27.5], "Script": "let x = 1;", "Meta": {"color": "red"}}"#;
        let req: CreatePeerRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.start_coord, [53.9, 27.5]);
        assert_eq!(req.meta.get("color").map(String::as_str), Some("red"));
    }

    #[test]
    fn meta_defaults_to_empty() {
        let body = r#"{"StartCoord": [53.9, 27.5], "Script": "let x = 1;"}"#;
        let req: CreatePeerRequest = serde_json::from_str(body).unwrap();
        assert!(req.meta.is_empty());
    }

    #[test]
    fn response_shapes() {
        let resp = CreatePeerResponse {
            id: PeerId::from("abc"),
        };
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"id":"abc"}"#);
        assert_eq!(serde_json::to_string(&Ack { ok: true }).unwrap(), r#"{"ok":true}"#);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn create_and_delete_roundtrip() {
        let sim = test_sim();
        let Json(created) = create_peer(
            State(Arc::clone(&sim)),
            Ok(Json(create_request("let x = 1;"))),
        )
        .await
        .expect("create should succeed");

        assert!(sim.registry().lookup(&created.id).is_some());

        let Json(ack) = delete_peer(
            State(Arc::clone(&sim)),
            Ok(Json(DeletePeerRequest {
                id: created.id.clone(),
            })),
        )
        .await
        .expect("delete should succeed");
        assert!(ack.ok);
        assert!(sim.registry().lookup(&created.id).is_none());
        sim.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn invalid_script_maps_to_bad_request() {
        let sim = test_sim();
        let err = create_peer(
            State(Arc::clone(&sim)),
            Ok(Json(create_request("let broken = ;"))),
        )
        .await
        .expect_err("parse error must fail");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(sim.registry().is_empty());
        sim.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unknown_peer_maps_to_not_found() {
        let sim = test_sim();
        let err = delete_peer(
            State(Arc::clone(&sim)),
            Ok(Json(DeletePeerRequest {
                id: PeerId::from("no-such-peer"),
            })),
        )
        .await
        .expect_err("unknown id must fail");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        sim.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overview_lists_created_peers() {
        let sim = test_sim();
        let Json(created) = create_peer(
            State(Arc::clone(&sim)),
            Ok(Json(create_request("let x = 1;"))),
        )
        .await
        .unwrap();

        let Json(overview) = state_overview(State(Arc::clone(&sim))).await;
        assert!(overview.actors.contains_key(&created.id));
        sim.shutdown();
    }
}
