use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::state::AppState;

pub(crate) async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub(crate) async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = state.initial_html.read().await.clone();
    let mut response = Response::new(Body::from(html));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    response
}

pub(crate) async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Response {
    let latest = state.latest.read().await;
    match latest.as_ref() {
        Some(snapshot) => {
            let mut response = Json(snapshot).into_response();
            response.headers_mut().insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=1, stale-if-error=30"),
            );
            response
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "leaderboard cache warming; try again shortly",
        )
            .into_response(),
    }
}
