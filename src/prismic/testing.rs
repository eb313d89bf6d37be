//! In-memory content source used by unit tests

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::predicate::query_string;
use super::{ContentSource, Document, Predicate, PrismicError, QueryOptions, Result, SearchResponse};
use crate::helpers::parse_iso;

pub(crate) const FAKE_ENDPOINT: &str = "https://fake.cdn.prismic.io/api/v2";

/// A `posts` document with a single content block of `words` words
pub(crate) fn post_doc(uid: &str, published: Option<&str>, title: &str, words: usize) -> Document {
    let body = vec!["word"; words].join(" ");
    Document {
        id: format!("id-{}", uid),
        uid: Some(uid.to_string()),
        doc_type: "posts".to_string(),
        first_publication_date: published.map(str::to_string),
        last_publication_date: published.map(str::to_string),
        data: json!({
            "title": title,
            "subtitle": format!("{} subtitle", title),
            "author": "Joseph Oliveira",
            "banner": { "url": format!("https://images.prismic.io/{}.png", uid) },
            "content": [{
                "heading": "Introduction",
                "body": [{ "type": "paragraph", "text": body, "spans": [] }]
            }]
        }),
    }
}

/// Evaluates the predicate subset the site uses over a fixed document set
#[derive(Default)]
pub(crate) struct FakeSource {
    published: Vec<Document>,
    drafts: Vec<Document>,
    preview_token: Option<String>,
    failing: bool,
    queries: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeSource {
    pub(crate) fn new(published: Vec<Document>) -> Self {
        Self {
            published,
            ..Self::default()
        }
    }

    /// Every call fails with a 500
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Documents only visible when querying with `token` as the ref
    pub(crate) fn with_preview(mut self, token: &str, drafts: Vec<Document>) -> Self {
        self.preview_token = Some(token.to_string());
        self.drafts = drafts;
        self
    }

    /// `(q, ref)` of every query issued so far
    pub(crate) fn queries(&self) -> Vec<(String, Option<String>)> {
        self.queries.lock().unwrap().clone()
    }

    fn visible(&self, ref_pin: Option<&str>) -> Result<Vec<Document>> {
        if self.failing {
            return Err(PrismicError::Status {
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        match ref_pin {
            None => Ok(self.published.clone()),
            Some(pin) if Some(pin) == self.preview_token.as_deref() => {
                let mut docs: Vec<Document> = self
                    .published
                    .iter()
                    .filter(|p| !self.drafts.iter().any(|d| d.id == p.id))
                    .cloned()
                    .collect();
                docs.extend(self.drafts.iter().cloned());
                Ok(docs)
            }
            Some(_) => Err(PrismicError::Status {
                status: 404,
                body: "Ref not found".to_string(),
            }),
        }
    }
}

fn published_at(doc: &Document) -> Option<i64> {
    doc.first_publication_date
        .as_deref()
        .and_then(|d| parse_iso(d, chrono_tz::UTC))
        .map(|d| d.timestamp())
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => match path.as_str() {
            "document.type" => &doc.doc_type == value,
            "document.id" => &doc.id == value,
            p => match p.strip_prefix("my.").and_then(|r| r.strip_suffix(".uid")) {
                Some(doc_type) => doc.doc_type == doc_type && doc.uid.as_ref() == Some(value),
                None => false,
            },
        },
        Predicate::DateBefore { value, .. } => {
            let bound = parse_iso(value, chrono_tz::UTC).map(|d| d.timestamp());
            matches!((published_at(doc), bound), (Some(a), Some(b)) if a < b)
        }
        Predicate::DateAfter { value, .. } => {
            let bound = parse_iso(value, chrono_tz::UTC).map(|d| d.timestamp());
            matches!((published_at(doc), bound), (Some(a), Some(b)) if a > b)
        }
    }
}

fn paginate(mut docs: Vec<Document>, page: usize, size: usize) -> SearchResponse {
    let total = docs.len();
    let start = ((page - 1) * size).min(total);
    let end = (start + size).min(total);
    let results: Vec<Document> = docs.drain(start..end).collect();
    let next_page = (end < total).then(|| {
        format!(
            "{}/documents/search?page={}&pageSize={}",
            FAKE_ENDPOINT,
            page + 1,
            size
        )
    });

    SearchResponse {
        page: page as u32,
        results_per_page: size as u32,
        results_size: results.len() as u32,
        total_results_size: total as u32,
        total_pages: total.div_ceil(size) as u32,
        next_page,
        prev_page: None,
        results,
    }
}

fn newest_first(docs: &mut [Document]) {
    docs.sort_by_key(|d| std::cmp::Reverse(published_at(d)));
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse> {
        self.queries
            .lock()
            .unwrap()
            .push((query_string(predicates), options.ref_pin.clone()));

        let mut docs: Vec<Document> = self
            .visible(options.ref_pin.as_deref())?
            .into_iter()
            .filter(|d| predicates.iter().all(|p| matches(d, p)))
            .collect();

        match options.orderings.first() {
            Some(o) if o.descending => newest_first(&mut docs),
            Some(_) => docs.sort_by_key(published_at),
            None => {}
        }

        Ok(paginate(docs, 1, options.page_size.unwrap_or(20)))
    }

    /// Cursors always continue the newest-first `posts` listing
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse> {
        let url = Url::parse(cursor)?;
        if !cursor.starts_with(FAKE_ENDPOINT) {
            return Err(PrismicError::ForeignCursor(cursor.to_string()));
        }
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let page = param("page").unwrap_or(1).max(1);
        let size = param("pageSize").unwrap_or(20).max(1);

        let mut docs: Vec<Document> = self
            .visible(None)?
            .into_iter()
            .filter(|d| d.doc_type == "posts")
            .collect();
        newest_first(&mut docs);
        Ok(paginate(docs, page, size))
    }
}
