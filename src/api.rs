// 🌐 REST API - read-only catalog over HTTP (axum)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ErrorResponse {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BooksQuery {
    limit: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /books?limit=n - books by ascending id
async fn list_books(State(state): State<AppState>, Query(query): Query<BooksQuery>) -> Response {
    let limit = match query.limit.as_deref().filter(|raw| !raw.is_empty()) {
        None => None,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(limit) => Some(limit),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("Invalid limit parameter: must be a number")),
                )
                    .into_response()
            }
        },
    };

    match state.db.try_list_books(limit) {
        Ok(books) => {
            tracing::info!("Retrieved {} books (limit {:?})", books.len(), limit);
            (StatusCode::OK, Json(books)).into_response()
        }
        Err(e) => {
            tracing::error!("Error retrieving books: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            )
                .into_response()
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/books", get(list_books))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
