//! Page and listing handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::preview::PreviewSession;
use super::{AppState, ServerError, NO_STORE};
use crate::content::{PostSummary, MAX_LISTING_PAGES};
use crate::generator::Route;

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pages: Option<usize>,
}

/// `GET /` and `GET /?pages=N`
pub async fn home(
    State(state): State<AppState>,
    session: PreviewSession,
    Query(query): Query<HomeQuery>,
) -> Response {
    let pages = query.pages.unwrap_or(1).clamp(1, MAX_LISTING_PAGES);
    let Some(token) = session.ref_pin() else {
        return state.serve_cached(Route::Home { pages }).await;
    };

    match state.generator.render_home(Some(token), pages).await {
        Ok(html) => ([(header::CACHE_CONTROL, NO_STORE)], Html(html)).into_response(),
        Err(e) => state.error_page(ServerError::Internal(e)),
    }
}

/// `GET /post/:slug`
pub async fn post(
    State(state): State<AppState>,
    session: PreviewSession,
    Path(slug): Path<String>,
) -> Response {
    let Some(token) = session.ref_pin() else {
        return state.serve_cached(Route::Post(slug)).await;
    };

    match state.generator.render_post(&slug, Some(token)).await {
        Ok(Some(html)) => ([(header::CACHE_CONTROL, NO_STORE)], Html(html)).into_response(),
        Ok(None) => state.error_page(ServerError::NotFound(slug)),
        Err(e) => state.error_page(ServerError::Internal(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct MoreQuery {
    cursor: Option<String>,
}

/// Body of `GET /api/posts`
#[derive(Debug, Serialize, Deserialize)]
pub struct MoreResponse {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
    /// Rendered listing entries, ready to append
    pub html: String,
}

/// `GET /api/posts?cursor=<next_page>`
pub async fn more(
    State(state): State<AppState>,
    Query(query): Query<MoreQuery>,
) -> Result<Response, ServerError> {
    let cursor = query
        .cursor
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing cursor".to_string()))?;

    let (page, html) = state
        .generator
        .render_more(&cursor)
        .await
        .map_err(ServerError::from_cursor_error)?;

    Ok((
        [(header::CACHE_CONTROL, NO_STORE)],
        Json(MoreResponse {
            results: page.results,
            next_page: page.next_page,
            html,
        }),
    )
        .into_response())
}

/// Fallback for unknown paths and missing static files
pub async fn not_found(State(state): State<AppState>) -> Response {
    state.error_page(ServerError::NotFound("no such route".to_string()))
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
