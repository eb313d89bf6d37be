//! Blog server with periodic regeneration and preview mode
//!
//! Published pages are rendered on first request (or when the server starts)
//! and kept in a [`PageCache`]. Once an entry is older than the revalidate
//! interval it is still served while a background task renders it again.
//! Requests carrying a preview cookie bypass the cache entirely.

mod error;
mod pages;
mod preview;

pub use error::ServerError;
pub use pages::MoreResponse;
pub use preview::PreviewSession;

use anyhow::Result;
use axum::{
    handler::Handler,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{Lookup, PageCache};
use crate::generator::{Generator, Route};
use crate::Blog;

/// `Cache-Control` for responses that depend on the visitor
pub(crate) const NO_STORE: &str = "private, no-store";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub cache: Arc<PageCache>,
    pub preview_cookie: String,
}

impl AppState {
    pub fn new(generator: Generator) -> Self {
        let cache = Arc::new(PageCache::new(generator.config().revalidate()));
        let preview_cookie = generator.config().preview_cookie.clone();
        Self {
            generator: Arc::new(generator),
            cache,
            preview_cookie,
        }
    }

    /// Render the prerendered routes into the cache. Failures are logged;
    /// those routes are generated on their first request instead.
    pub async fn warm(&self) {
        let pages = match self.generator.prerender().await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(error = %e, "could not prerender pages at startup");
                return;
            }
        };
        for (route, html) in pages {
            self.cache.insert(&route.path(), html);
        }
        tracing::info!(pages = self.cache.len(), "page cache warmed");
    }

    fn public_cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate",
            self.cache.revalidate().as_secs()
        )
    }

    fn page_response(&self, html: &str) -> Response {
        (
            [(header::CACHE_CONTROL, self.public_cache_control())],
            Html(html.to_string()),
        )
            .into_response()
    }

    /// Serve a published route from the cache, generating it when needed
    async fn serve_cached(&self, route: Route) -> Response {
        let path = route.path();
        match self.cache.get(&path) {
            Lookup::Fresh(html) => self.page_response(&html),
            Lookup::Stale(html) => {
                self.revalidate_in_background(route);
                self.page_response(&html)
            }
            Lookup::Miss => {
                let Some(_pending) = self.cache.begin(&path) else {
                    return self.loading_page();
                };
                tracing::debug!(route = %path, "generating on demand");
                match self.generator.render_route(&route).await {
                    Ok(Some(html)) => {
                        let response = self.page_response(&html);
                        self.cache.insert(&path, html);
                        response
                    }
                    Ok(None) => self.error_page(ServerError::NotFound(path)),
                    Err(e) => self.error_page(ServerError::Internal(e)),
                }
            }
        }
    }

    /// Regenerate a stale route unless another task already is
    fn revalidate_in_background(&self, route: Route) {
        let path = route.path();
        let Some(pending) = self.cache.begin(&path) else {
            return;
        };
        let generator = Arc::clone(&self.generator);
        let cache = Arc::clone(&self.cache);

        tokio::spawn(async move {
            let _pending = pending;
            match generator.render_route(&route).await {
                Ok(Some(html)) => {
                    cache.insert(&path, html);
                    tracing::debug!(route = %path, "page regenerated");
                }
                Ok(None) => {
                    cache.remove(&path);
                    tracing::info!(route = %path, "post no longer published, dropped from cache");
                }
                Err(e) => {
                    tracing::warn!(route = %path, error = %e, "regeneration failed, keeping stale page");
                }
            }
        });
    }

    fn loading_page(&self) -> Response {
        match self.generator.renderer().render_loading() {
            Ok(html) => ([(header::CACHE_CONTROL, NO_STORE)], Html(html)).into_response(),
            Err(e) => ServerError::Internal(e).into_response(),
        }
    }

    /// Themed HTML page for a page-route error
    fn error_page(&self, err: ServerError) -> Response {
        let renderer = self.generator.renderer();
        let page = match &err {
            ServerError::NotFound(_) => renderer.render_not_found(),
            ServerError::Internal(_) => renderer.render_error(),
            _ => return err.into_response(),
        };

        match page {
            Ok(html) => {
                err.log();
                (
                    err.status(),
                    [(header::CACHE_CONTROL, NO_STORE)],
                    Html(html),
                )
                    .into_response()
            }
            Err(e) => {
                tracing::error!(error = %e, "error page could not be rendered");
                err.into_response()
            }
        }
    }
}

/// Build the application router
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let assets =
        ServeDir::new(static_dir).not_found_service(pages::not_found.with_state(state.clone()));

    Router::new()
        .route("/", get(pages::home))
        .route("/post/:slug", get(pages::post))
        .route("/api/posts", get(pages::more))
        .route("/api/preview", get(preview::enter))
        .route("/api/exit-preview", get(preview::exit))
        .route("/health", get(pages::health))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let generator = Generator::new(blog.config.clone(), blog.content_source()?, &blog.i18n()?)?;
    let state = AppState::new(generator);
    state.warm().await;

    let app = router(state, &blog.static_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
