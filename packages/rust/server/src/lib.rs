//! HTTP surface for guide generation.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/generate` | Run the pipeline, streaming NDJSON events |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! The generate response body is `application/x-ndjson`: one
//! [`PipelineEvent`] per line, in emission order. Closing the connection
//! cancels the run.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser clients can
//! read the stream directly.

use std::convert::Infallible;

use axum::{
    Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::stream;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use guidecraft_core::{EventSink, Pipeline};
use guidecraft_shared::{GenerateRequest, GuideError, PipelineEvent, Result};

const NDJSON: &str = "application/x-ndjson";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
}

/// Build the router. Exposed separately from [`serve`] for tests.
pub fn router(pipeline: Pipeline) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/generate", post(handle_generate))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { pipeline })
}

/// Bind `bind` and serve until Ctrl-C.
pub async fn serve(bind: &str, pipeline: Pipeline) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| GuideError::Network(format!("failed to bind {bind}: {e}")))?;
    serve_on(listener, pipeline).await
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve_on(listener: TcpListener, pipeline: Pipeline) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "guide server listening");
    }
    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
        })
        .await
        .map_err(|e| GuideError::Network(format!("server error: {e}")))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

fn bad_request(message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "bad_request",
            message: message.into(),
        },
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

// ============ POST /api/generate ============

/// Start a run and stream its events as they are emitted.
///
/// Validation problems inside a well-formed request (such as a blank topic)
/// are reported in-stream as an `error` event; only an unreadable body gets
/// a 400.
async fn handle_generate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    info!(
        topic = %request.topic.trim(),
        max_per_type = ?request.max_per_type,
        "generate requested"
    );

    let (sink, rx) = EventSink::channel();
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.run(request, sink, cancel).await;
    });

    // The guard lives as long as the body; dropping the body cancels the run.
    let lines = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event: PipelineEvent = rx.recv().await?;
        Some((Ok::<_, Infallible>(event.to_line()), (rx, guard)))
    });

    (
        [
            (header::CONTENT_TYPE, NDJSON),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
