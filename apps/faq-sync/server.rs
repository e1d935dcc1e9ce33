use crate::query::QueryService;
use crate::reconciler::Reconciler;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub query: Arc<QueryService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarRequest {
    pub question: String,
    pub num_candidates: u32,
    pub limit: u32,
}

/// Builds the router. Paths without a route fall through to `static_dir`.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/update-embeddings", post(update_embeddings))
        .route(
            "/retrieve-similar-faqs",
            get(retrieve_similar_faqs).post(retrieve_similar_faqs),
        );

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn update_embeddings(State(state): State<AppState>) -> Response {
    let report = match state.reconciler.reconcile().await {
        Ok(report) => report,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Failed to update embeddings",
                    "error": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    match report.outcome() {
        Ok(()) => {
            info!(mutations = report.mutations(), "Embeddings updated");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Embeddings updated successfully!",
                    "report": report,
                })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Embeddings updated with failures");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Failed to update embeddings",
                    "error": e.to_string(),
                    "report": report,
                })),
            )
                .into_response()
        }
    }
}

async fn retrieve_similar_faqs(
    State(state): State<AppState>,
    request: Result<Json<SimilarRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected similarity request");
            return failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state
        .query
        .find_similar(&request.question, request.num_candidates, request.limit)
        .await
    {
        Ok(matches) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": matches,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to retrieve similar FAQs");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn failure(status: StatusCode, error: String) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "message": "Failed to retrieve similar docs",
            "error": error,
        })),
    )
        .into_response()
}
