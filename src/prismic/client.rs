//! HTTP client for the repository REST API (v2)

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use super::document::{ApiInfo, SearchResponse};
use super::error::{PrismicError, Result};
use super::predicate::{orderings_string, query_string, Predicate};
use super::{ContentSource, QueryOptions};
use crate::config::SiteConfig;

/// Client bound to one repository endpoint, e.g.
/// `https://spacetraveling.cdn.prismic.io/api/v2`
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl PrismicClient {
    /// Create a client for `endpoint`
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim().trim_end_matches('/'))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    /// Create a client from the site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(&config.api_endpoint, config.access_token.clone())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Look up the repository's current published revision
    pub async fn master_ref(&self) -> Result<String> {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        let info: ApiInfo = self.get_json(url).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(PrismicError::NoMasterRef)
    }

    async fn resolve_ref(&self, ref_pin: Option<&str>) -> Result<String> {
        match ref_pin {
            Some(pin) if !pin.is_empty() => Ok(pin.to_string()),
            _ => self.master_ref().await,
        }
    }

    fn search_url(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/documents/search", base))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", reference);
            if !predicates.is_empty() {
                query.append_pair("q", &query_string(predicates));
            }
            if let Some(size) = options.page_size {
                query.append_pair("pageSize", &size.to_string());
            }
            if !options.orderings.is_empty() {
                query.append_pair("orderings", &orderings_string(&options.orderings));
            }
            if !options.fetch.is_empty() {
                query.append_pair("fetch", &options.fetch.join(","));
            }
            if let Some(token) = &self.access_token {
                query.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    /// Parse a `next_page` cursor, refusing URLs outside this repository
    fn cursor_url(&self, cursor: &str) -> Result<Url> {
        let mut url = Url::parse(cursor)?;
        let same_origin = url.origin() == self.endpoint.origin();
        let prefix = self.endpoint.path().trim_end_matches('/');
        let same_api = url
            .path()
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if !same_origin || !same_api {
            return Err(PrismicError::ForeignCursor(cursor.to_string()));
        }

        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        // The query string may carry the access token; log the path only
        tracing::debug!(path = %url.path(), "content api request");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "content api error");
            return Err(PrismicError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse> {
        let reference = self.resolve_ref(options.ref_pin.as_deref()).await?;
        let url = self.search_url(&reference, predicates, options)?;
        self.get_json(url).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse> {
        let url = self.cursor_url(cursor)?;
        self.get_json(url).await
    }
}
