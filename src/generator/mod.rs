//! Generator module - renders pages from repository content
//!
//! Shared by the `generate` command, which writes pages to disk, and the
//! server, which renders routes on demand.

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::content::{post_path, PageLoader, PostPagination};
use crate::i18n::I18n;
use crate::prismic::ContentSource;
use crate::templates::TemplateRenderer;

/// A published page the site can render and cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Listing holding the first `pages` pages of posts
    Home { pages: usize },
    Post(String),
}

impl Route {
    /// Site path of the route
    pub fn path(&self) -> String {
        match self {
            Route::Home { pages } if *pages > 1 => format!("/?pages={}", pages),
            Route::Home { .. } => "/".to_string(),
            Route::Post(uid) => post_path(uid),
        }
    }

    /// Output file below the public directory. `None` for listings longer
    /// than one page and for a uid that cannot be used as a single path
    /// segment.
    pub fn output_path(&self, public_dir: &Path) -> Option<PathBuf> {
        match self {
            Route::Home { pages } => (*pages <= 1).then(|| public_dir.join("index.html")),
            Route::Post(uid) => {
                let usable = !uid.is_empty()
                    && uid != "."
                    && uid != ".."
                    && !uid.contains(['/', '\\']);
                usable.then(|| public_dir.join("post").join(uid).join("index.html"))
            }
        }
    }
}

/// Renders site pages from a content source
pub struct Generator {
    config: SiteConfig,
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(config: SiteConfig, source: Arc<dyn ContentSource>, i18n: &I18n) -> Result<Self> {
        let renderer = TemplateRenderer::new(&config, i18n)?;
        Ok(Self {
            config,
            source,
            renderer,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    fn loader(&self) -> PageLoader<'_> {
        PageLoader::new(self.source.as_ref(), &self.config)
    }

    /// Listing page holding the first `pages` pages of posts
    pub async fn render_home(&self, ref_pin: Option<&str>, pages: usize) -> Result<String> {
        let props = self.loader().load_home_pages(ref_pin, pages).await?;
        self.renderer.render_home(&props, pages)
    }

    /// Post page, or `None` when the repository has no such post
    pub async fn render_post(&self, slug: &str, ref_pin: Option<&str>) -> Result<Option<String>> {
        match self.loader().load_post(slug, ref_pin).await? {
            Some(props) => Ok(Some(self.renderer.render_post(&props)?)),
            None => Ok(None),
        }
    }

    /// Render a route from published content
    pub async fn render_route(&self, route: &Route) -> Result<Option<String>> {
        match route {
            Route::Home { pages } => Ok(Some(self.render_home(None, *pages).await?)),
            Route::Post(slug) => self.render_post(slug, None).await,
        }
    }

    /// The listing page behind `cursor`, with its entries rendered
    pub async fn render_more(&self, cursor: &str) -> Result<(PostPagination, String)> {
        let page = self.loader().load_more(cursor).await?;
        let html = self.renderer.render_post_list(&page.results)?;
        Ok((page, html))
    }

    /// Routes rendered ahead of any request: the listing and its first page of posts
    pub async fn prerender_routes(&self) -> Result<Vec<Route>> {
        let mut routes = vec![Route::Home { pages: 1 }];
        routes.extend(
            self.loader()
                .static_paths()
                .await?
                .into_iter()
                .map(Route::Post),
        );
        Ok(routes)
    }

    /// Render every prerendered route
    pub async fn prerender(&self) -> Result<Vec<(Route, String)>> {
        let mut pages = Vec::new();
        for route in self.prerender_routes().await? {
            match self.render_route(&route).await? {
                Some(html) => pages.push((route, html)),
                None => tracing::warn!(route = %route.path(), "listed post could not be loaded"),
            }
        }
        Ok(pages)
    }

    /// Write prerendered pages and static assets to `public_dir`.
    /// Returns the number of pages written.
    pub async fn generate(&self, public_dir: &Path, static_dir: &Path) -> Result<usize> {
        fs::create_dir_all(public_dir)?;
        copy_static_assets(static_dir, public_dir)?;

        let pages = self.prerender().await?;
        let mut written = 0;
        for (route, html) in &pages {
            let Some(dest) = route.output_path(public_dir) else {
                tracing::warn!(route = %route.path(), "skipping route with unusable uid");
                continue;
            };
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, html).with_context(|| format!("Failed to write {:?}", dest))?;
            tracing::debug!("Generated: {:?}", dest);
            written += 1;
        }

        Ok(written)
    }
}

/// Copy everything under `static_dir` into `public_dir`
fn copy_static_assets(static_dir: &Path, public_dir: &Path) -> Result<()> {
    if !static_dir.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(static_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let relative = path.strip_prefix(static_dir)?;
        let dest = public_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &dest)?;
    }

    Ok(())
}
