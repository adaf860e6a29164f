//! JSON worker surface. Each request is one-shot: the whole computation runs
//! on a blocking thread and the finished result (or an error string) is
//! returned. Nothing streams and nothing is cancelled.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::graph::{Graph, Node, NodeKey, ParseKeyError, Terrain};
use crate::path::{PathResult, find_shortest_path};
use crate::search::{AnimationStep, replay_path, run_animated_search};

/// Upper bound on `width * height` per request.
pub const MAX_CELLS: usize = 1_000_000;

const DEFAULT_SEED: u32 = 42;
const DEFAULT_WIDTH: usize = 50;
const DEFAULT_HEIGHT: usize = 50;
const DEFAULT_DETAIL: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid grid size {width}x{height}: must be non-empty and at most {max} cells", max = MAX_CELLS)]
    InvalidSize { width: usize, height: usize },
    #[error("detail must be a positive finite number, got {0}")]
    InvalidDetail(f64),
    #[error(transparent)]
    BadKey(#[from] ParseKeyError),
    #[error("node {0} is not part of the graph")]
    UnknownNode(NodeKey),
    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GraphRequest {
    pub seed: Option<u32>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub detail: Option<f64>,
}

impl GraphRequest {
    fn resolve(&self) -> Result<Terrain, ApiError> {
        let width = self.width.unwrap_or(DEFAULT_WIDTH);
        let height = self.height.unwrap_or(DEFAULT_HEIGHT);
        let cells = width.checked_mul(height).unwrap_or(usize::MAX);
        if cells == 0 || cells > MAX_CELLS {
            return Err(ApiError::InvalidSize { width, height });
        }
        let detail = self.detail.unwrap_or(DEFAULT_DETAIL);
        if !(detail.is_finite() && detail > 0.0) {
            return Err(ApiError::InvalidDetail(detail));
        }
        Ok(Terrain {
            width,
            height,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            detail,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    #[serde(flatten)]
    pub terrain: GraphRequest,
    pub start: String,
    pub end: String,
}

impl RouteRequest {
    fn endpoints(&self) -> Result<(NodeKey, NodeKey), ApiError> {
        Ok((self.start.parse()?, self.end.parse()?))
    }
}

/// Graph as sent to clients: nodes ordered by key, adjacency keyed by `"x,y"`.
#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub width: usize,
    pub height: usize,
    pub nodes: Vec<Node>,
    pub edges: BTreeMap<NodeKey, Vec<NodeKey>>,
}

impl From<&Graph> for GraphResponse {
    fn from(graph: &Graph) -> Self {
        let mut nodes: Vec<Node> = graph.nodes().copied().collect();
        nodes.sort_by_key(Node::key);
        let edges = graph
            .keys()
            .map(|k| (k, graph.neighbors(k).to_vec()))
            .collect();
        Self {
            width: graph.width(),
            height: graph.height(),
            nodes,
            edges,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StepsResponse {
    pub steps: Vec<AnimationStep>,
}

async fn graph_handler(Json(req): Json<GraphRequest>) -> Result<Json<GraphResponse>, ApiError> {
    let terrain = req.resolve()?;
    let response = tokio::task::spawn_blocking(move || GraphResponse::from(&terrain.generate())).await?;
    Ok(Json(response))
}

async fn path_handler(Json(req): Json<RouteRequest>) -> Result<Json<PathResult>, ApiError> {
    let terrain = req.terrain.resolve()?;
    let (start, end) = req.endpoints()?;
    let result = tokio::task::spawn_blocking(move || {
        let graph = terrain.generate();
        find_shortest_path(start, end, &graph)
    })
    .await?;
    Ok(Json(result))
}

async fn animate_handler(Json(req): Json<RouteRequest>) -> Result<Json<StepsResponse>, ApiError> {
    let terrain = req.terrain.resolve()?;
    let (start, end) = req.endpoints()?;
    let steps = tokio::task::spawn_blocking(move || {
        let graph = terrain.generate();
        check_endpoints(&graph, start, end)?;
        Ok::<_, ApiError>(run_animated_search(start, end, &graph))
    })
    .await??;
    Ok(Json(StepsResponse { steps }))
}

async fn replay_handler(Json(req): Json<RouteRequest>) -> Result<Json<StepsResponse>, ApiError> {
    let terrain = req.terrain.resolve()?;
    let (start, end) = req.endpoints()?;
    let steps = tokio::task::spawn_blocking(move || {
        let graph = terrain.generate();
        check_endpoints(&graph, start, end)?;
        Ok::<_, ApiError>(replay_path(&find_shortest_path(start, end, &graph).path))
    })
    .await??;
    Ok(Json(StepsResponse { steps }))
}

fn check_endpoints(graph: &Graph, start: NodeKey, end: NodeKey) -> Result<(), ApiError> {
    for key in [start, end] {
        if !graph.contains(key) {
            return Err(ApiError::UnknownNode(key));
        }
    }
    Ok(())
}

/// API routes, with `frontend/` served for everything else.
pub fn router() -> Router {
    Router::new()
        .route("/api/graph", post(graph_handler))
        .route("/api/path", post(path_handler))
        .route("/api/animate", post(animate_handler))
        .route("/api/replay", post(replay_handler))
        .fallback_service(ServeDir::new("frontend"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
