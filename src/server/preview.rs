//! Preview mode: draft content is rendered for editors holding a preview token

use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::convert::Infallible;

use super::{AppState, ServerError, NO_STORE};
use crate::content::resolve_link;

/// Preview token carried by the request's preview cookie, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSession(pub Option<String>);

impl PreviewSession {
    /// Ref to pin repository queries to
    pub fn ref_pin(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for PreviewSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|cookies| cookie_value(cookies, &state.preview_cookie));
        Ok(Self(token))
    }
}

/// Find `name` in a `Cookie` header and percent-decode its value
fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
        .filter(|token| !token.is_empty())
}

fn session_cookie(name: &str, token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        name,
        utf8_percent_encode(token, NON_ALPHANUMERIC)
    )
}

fn expired_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// `GET /api/preview?token=&documentId=`
///
/// Starts a preview session and sends the browser to the previewed document.
pub async fn enter(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Response, ServerError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(token), Some(document_id)) = (non_empty(query.token), non_empty(query.document_id))
    else {
        return Err(ServerError::InvalidToken);
    };

    let document = state
        .generator
        .source()
        .get_by_id(&document_id, Some(&token))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, document_id = %document_id, "preview resolution failed");
            ServerError::InvalidToken
        })?;

    let post_type = &state.generator.config().document_type;
    let url = document
        .map(|doc| resolve_link(post_type, &doc.doc_type, doc.uid.as_deref()))
        .unwrap_or_else(|| "/".to_string());
    tracing::info!(url = %url, "preview session started");

    let html = state.generator.renderer().render_preview_redirect(&url)?;
    Ok((
        [
            (
                header::SET_COOKIE,
                session_cookie(&state.preview_cookie, &token),
            ),
            (header::CACHE_CONTROL, NO_STORE.to_string()),
        ],
        Html(html),
    )
        .into_response())
}

/// `GET /api/exit-preview`
pub async fn exit(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, expired_cookie(&state.preview_cookie))],
        Redirect::temporary("/"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let header = "theme=dark; spacetraveling.preview=https%3A%2F%2Frepo%2Fpreviews%2Fabc; x=1";
        assert_eq!(
            cookie_value(header, "spacetraveling.preview").as_deref(),
            Some("https://repo/previews/abc")
        );
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("spacetraveling.preview=", "spacetraveling.preview"), None);
    }

    #[test]
    fn test_session_cookie_round_trips_token() {
        let cookie = session_cookie("preview", "https://repo/previews/a b");
        assert!(cookie.starts_with("preview=https%3A%2F%2Frepo%2Fpreviews%2Fa%20b;"));
        assert!(cookie.ends_with("Path=/; HttpOnly; SameSite=Lax"));

        let value = cookie.split(';').next().unwrap();
        assert_eq!(
            cookie_value(value, "preview").as_deref(),
            Some("https://repo/previews/a b")
        );
    }

    #[test]
    fn test_expired_cookie() {
        assert!(expired_cookie("preview").contains("Max-Age=0"));
    }
}
