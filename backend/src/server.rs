use crate::{
    chains::evm,
    pipeline::{BridgePipeline, PipelineOutcome},
    types::{HealthStatus, ServerConfig, ServiceStatus},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};
use uuid::Uuid;

pub const ALIVE_MESSAGE: &str = "FluidGas Backend is Alive!";
pub const PROMPT_REQUIRED_MESSAGE: &str = "Prompt is required and must be a string.";
pub const ADDRESS_REQUIRED_MESSAGE: &str =
    "userSourceAddress is required and must be a valid EVM address.";
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred while preparing the transaction.";
pub const TIMEOUT_MESSAGE: &str = "Timed out while preparing the transaction. Please try again.";

/// HTTP front door for the bridge pipeline
pub struct ApiServer {
    config: ServerConfig,
    pipeline: Arc<BridgePipeline>,
}

/// Body of `POST /api/prompt/prepare-bridge`
#[derive(Debug, Deserialize)]
pub struct PrepareBridgeRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
    #[serde(default, rename = "userSourceAddress")]
    pub user_source_address: Option<Value>,
    /// Older clients send the Sepolia-specific name.
    #[serde(default, rename = "userSepoliaAddress")]
    pub user_sepolia_address: Option<Value>,
}

impl PrepareBridgeRequest {
    /// The sender address, preferring `userSourceAddress` when both are sent.
    pub fn sender(&self) -> Option<&Value> {
        match &self.user_source_address {
            Some(Value::Null) | None => self.user_sepolia_address.as_ref(),
            address => address.as_ref(),
        }
    }
}

impl ApiServer {
    /// Create new API server
    pub fn new(config: ServerConfig, pipeline: Arc<BridgePipeline>) -> Self {
        Self { config, pipeline }
    }

    /// Start the API server
    pub async fn start(&self) -> Result<(), std::io::Error> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let app = self.create_router();

        let listener = TcpListener::bind(&address).await?;

        info!("FluidGas backend listening on http://{}", address);
        info!("Available endpoints:");
        info!("  GET  / - Liveness");
        info!("  GET  /health - Health check");
        info!("  POST /api/prompt/prepare-bridge - Prepare bridge parameters");

        axum::serve(listener, app).await
    }

    /// Create the router with all endpoints
    pub fn create_router(&self) -> Router {
        create_router(
            Arc::clone(&self.pipeline),
            Duration::from_secs(self.config.request_timeout_secs),
        )
    }
}

pub fn create_router(pipeline: Arc<BridgePipeline>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/prompt/prepare-bridge", post(prepare_bridge))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState {
            pipeline,
            request_timeout,
        })
}

/// Application state
#[derive(Clone)]
struct AppState {
    pipeline: Arc<BridgePipeline>,
    request_timeout: Duration,
}

/// Root endpoint
async fn root() -> &'static str {
    ALIVE_MESSAGE
}

/// Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.pipeline.extractor().is_configured() {
        ServiceStatus::Healthy
    } else {
        ServiceStatus::Degraded
    };

    Json(HealthStatus {
        service: "fluidgas-backend".to_string(),
        status,
        bridge_initialized: state.pipeline.assembler().handle().is_initialized(),
        last_check: Utc::now(),
    })
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// A source address must be non-empty and carry the EVM `0x` prefix.
fn is_source_address(address: &str) -> bool {
    !address.trim().is_empty() && evm::has_address_prefix(address)
}

/// Prepare bridge parameters from a free-text prompt
async fn prepare_bridge(
    State(state): State<AppState>,
    payload: Result<Json<PrepareBridgeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection);
            return bad_request(&rejection.body_text());
        }
    };

    let prompt = match &request.prompt {
        Some(Value::String(prompt)) if !prompt.trim().is_empty() => prompt.clone(),
        _ => return bad_request(PROMPT_REQUIRED_MESSAGE),
    };

    let sender = match request.sender() {
        Some(Value::String(address)) if is_source_address(address) => address.clone(),
        _ => return bad_request(ADDRESS_REQUIRED_MESSAGE),
    };

    let request_id = Uuid::new_v4();
    info!("[{}] Preparing bridge for {}", request_id, sender);

    match tokio::time::timeout(state.request_timeout, state.pipeline.prepare(&prompt, &sender)).await {
        Ok(Ok(PipelineOutcome::Prepared(params))) => {
            info!("[{}] Bridge parameters prepared", request_id);
            (StatusCode::OK, Json(params)).into_response()
        }
        Ok(Ok(PipelineOutcome::Rejected(failure))) => {
            (StatusCode::BAD_REQUEST, Json(failure)).into_response()
        }
        Ok(Err(fault)) => {
            error!("[{}] Error in prepare-bridge: {:?}", request_id, fault);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": UNEXPECTED_ERROR_MESSAGE })),
            )
                .into_response()
        }
        Err(_) => {
            error!(
                "[{}] Request timed out after {:?}",
                request_id, state.request_timeout
            );
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({ "error": TIMEOUT_MESSAGE })),
            )
                .into_response()
        }
    }
}
