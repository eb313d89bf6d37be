//! Page cache for incremental regeneration
//!
//! Rendered pages are kept per route. An entry older than the revalidate
//! interval is still served while a single background task regenerates it.
//! A pending set records routes whose generation is in flight so concurrent
//! requests never start a second one.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// A rendered page
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub html: Arc<str>,
    pub generated_at: Instant,
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Within the revalidate interval
    Fresh(Arc<str>),
    /// Past the interval; serve it and regenerate in the background
    Stale(Arc<str>),
    /// Never generated
    Miss,
}

/// Route-keyed store of rendered pages
#[derive(Debug)]
pub struct PageCache {
    revalidate: Duration,
    pages: RwLock<HashMap<String, CachedPage>>,
    pending: Mutex<HashSet<String>>,
}

impl PageCache {
    pub fn new(revalidate: Duration) -> Self {
        Self {
            revalidate,
            pages: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    /// Look up a route
    pub fn get(&self, route: &str) -> Lookup {
        let pages = match self.pages.read() {
            Ok(pages) => pages,
            Err(poisoned) => poisoned.into_inner(),
        };
        match pages.get(route) {
            Some(page) if page.generated_at.elapsed() < self.revalidate => {
                Lookup::Fresh(page.html.clone())
            }
            Some(page) => Lookup::Stale(page.html.clone()),
            None => Lookup::Miss,
        }
    }

    /// Store a freshly rendered page
    pub fn insert(&self, route: &str, html: impl Into<Arc<str>>) {
        let page = CachedPage {
            html: html.into(),
            generated_at: Instant::now(),
        };
        let mut pages = match self.pages.write() {
            Ok(pages) => pages,
            Err(poisoned) => poisoned.into_inner(),
        };
        pages.insert(route.to_string(), page);
    }

    /// Drop a route, e.g. once its document has disappeared
    pub fn remove(&self, route: &str) {
        let mut pages = match self.pages.write() {
            Ok(pages) => pages,
            Err(poisoned) => poisoned.into_inner(),
        };
        pages.remove(route);
    }

    /// Number of cached routes
    pub fn len(&self) -> usize {
        self.pages.read().map(|p| p.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claim the generation of `route`. Returns `None` when another task
    /// already holds it; the claim is released when the guard drops.
    pub fn begin(self: &Arc<Self>, route: &str) -> Option<PendingGuard> {
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !pending.insert(route.to_string()) {
            return None;
        }
        Some(PendingGuard {
            cache: Arc::clone(self),
            route: route.to_string(),
        })
    }

    pub fn is_pending(&self, route: &str) -> bool {
        self.pending
            .lock()
            .map(|p| p.contains(route))
            .unwrap_or_default()
    }
}

/// Exclusive right to generate one route
#[derive(Debug)]
pub struct PendingGuard {
    cache: Arc<PageCache>,
    route: String,
}

impl PendingGuard {
    pub fn route(&self) -> &str {
        &self.route
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = match self.cache.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.remove(&self.route);
    }
}
