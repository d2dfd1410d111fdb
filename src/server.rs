use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::review::{AnalysisRequest, AnalyzeError, Reviewer};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error("Failed to send analysis result")]
    Serialize(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "success": false, "error": self.to_string() }),
            ),
            ApiError::Analyze(AnalyzeError::GitHub(_)) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": self.to_string(), "source": "github" }),
            ),
            ApiError::Analyze(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": self.to_string() }),
            ),
            ApiError::Serialize(err) => {
                error!(error = %err, "could not serialize analysis result");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": self.to_string(), "source": "server" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub fn create_router(reviewer: Arc<Reviewer>) -> Router {
    Router::new()
        .route("/analyze", post(analyze).fallback(method_not_allowed))
        .route("/health", get(health))
        .with_state(reviewer)
        .layer(TraceLayer::new_for_http())
}

/// The body is taken raw so a malformed payload is reported as a bad
/// `prUrl` instead of axum's own JSON rejection.
async fn analyze(State(reviewer): State<Arc<Reviewer>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let request = AnalysisRequest::from_body(&body)?;
    let response = reviewer.analyze(&request).await?;
    Ok(Json(serde_json::to_value(&response)?))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn health(State(reviewer): State<Arc<Reviewer>>) -> Json<Value> {
    let config = reviewer.config();
    let kestra_enabled = config.engine.api_url.as_deref().is_some_and(|url| !url.is_empty());
    Json(json!({
        "success": true,
        "status": "ok",
        "kestraEnabled": kestra_enabled,
        "githubToken": config.github_token().is_some(),
    }))
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(addr: &str, reviewer: Arc<Reviewer>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    info!("  POST /analyze - review a pull request");
    info!("  GET /health - service status");

    axum::serve(listener, create_router(reviewer))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
