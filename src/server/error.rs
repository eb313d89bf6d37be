//! Error types for the HTTP server.
//!
//! Page routes answer with HTML error pages, API routes with a JSON
//! `{"message": ...}` body.

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::helpers::html_escape;
use crate::prismic::PrismicError;

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No post behind the requested slug
    #[error("not found: {0}")]
    NotFound(String),

    /// Preview parameters missing or rejected by the repository
    #[error("invalid preview token")]
    InvalidToken,

    /// Malformed API request
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rendering or content repository failure
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a failed cursor fetch: cursors we refuse are the client's fault
    pub fn from_cursor_error(err: anyhow::Error) -> Self {
        match err.downcast_ref::<PrismicError>() {
            Some(PrismicError::ForeignCursor(cursor)) => {
                Self::BadRequest(format!("cursor not accepted: {}", cursor))
            }
            Some(PrismicError::Url(e)) => Self::BadRequest(format!("invalid cursor: {}", e)),
            _ => Self::Internal(err),
        }
    }

    pub(crate) fn log(&self) {
        match self {
            Self::Internal(err) => tracing::error!(error = %err, "internal server error"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();

        match &self {
            Self::InvalidToken => {
                (status, Json(json!({ "message": "Invalid token" }))).into_response()
            }
            Self::BadRequest(msg) => (status, Json(json!({ "message": msg }))).into_response(),
            Self::NotFound(_) | Self::Internal(_) => {
                let title = if status == StatusCode::NOT_FOUND {
                    "Not Found"
                } else {
                    "Internal Error"
                };
                let page = format!(
                    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head>\
                     <body><h1>{}</h1><a href=\"/\">Back to home</a></body></html>",
                    html_escape(title),
                    html_escape(title)
                );
                (
                    status,
                    [(header::CACHE_CONTROL, "private, no-store")],
                    Html(page),
                )
                    .into_response()
            }
        }
    }
}
