//! Content repository access
//!
//! Posts live in a hosted Prismic repository. [`PrismicClient`] speaks its
//! REST API; loaders only see the [`ContentSource`] trait so they can be
//! exercised against an in-memory source.

mod client;
mod document;
mod error;
pub mod predicate;
pub mod richtext;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

pub use client::PrismicClient;
pub use document::{text_value, ApiInfo, ApiRef, Document, SearchResponse};
pub use error::{PrismicError, Result};
pub use predicate::{Ordering, Predicate};
pub use richtext::{LinkResolver, RichTextBlock};

/// Options for a `documents/search` query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<usize>,
    pub orderings: Vec<Ordering>,
    /// Field projection, e.g. `posts.title`
    pub fetch: Vec<String>,
    /// Revision to query; the master ref when `None`
    pub ref_pin: Option<String>,
}

impl QueryOptions {
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn ref_pin(mut self, ref_pin: Option<&str>) -> Self {
        self.ref_pin = ref_pin.map(str::to_string);
        self
    }
}

/// Read-only access to repository documents
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a predicate query
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions)
        -> Result<SearchResponse>;

    /// Follow a `next_page` cursor returned by an earlier query
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse>;

    /// Fetch one document of `doc_type` by its UID
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        ref_pin: Option<&str>,
    ) -> Result<Option<Document>> {
        let predicates = [Predicate::at(format!("my.{}.uid", doc_type), uid)];
        let options = QueryOptions::default().page_size(1).ref_pin(ref_pin);
        let response = self.query(&predicates, &options).await?;
        Ok(response.results.into_iter().next())
    }

    /// Fetch one document by its repository ID
    async fn get_by_id(&self, id: &str, ref_pin: Option<&str>) -> Result<Option<Document>> {
        let predicates = [Predicate::at("document.id", id)];
        let options = QueryOptions::default().page_size(1).ref_pin(ref_pin);
        let response = self.query(&predicates, &options).await?;
        Ok(response.results.into_iter().next())
    }
}
