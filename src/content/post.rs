//! Post models projected from repository documents

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prismic::{text_value, Document, RichTextBlock, SearchResponse};

/// Site path of a post
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", uid)
}

/// Link resolver shared by rich-text links and preview redirects.
/// Only documents of `post_type` have a page of their own.
pub fn resolve_link(post_type: &str, doc_type: &str, uid: Option<&str>) -> String {
    match uid {
        Some(uid) if doc_type == post_type && !uid.is_empty() => post_path(uid),
        _ => "/".to_string(),
    }
}

/// A post as shown in the listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Project a listing result; missing or non-text fields become empty text
    pub fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc.uid.clone().unwrap_or_default(),
            first_publication_date: doc.first_publication_date.clone(),
            title: doc.text_field("title"),
            subtitle: doc.text_field("subtitle"),
            author: doc.text_field("author"),
        }
    }

    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

/// One section of a post body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

#[derive(Deserialize)]
struct RawContentBlock {
    #[serde(default)]
    heading: Value,
    #[serde(default)]
    body: Vec<RichTextBlock>,
}

/// A full post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub banner_url: String,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

impl PostDetail {
    /// Project a full document. Bodies are kept as structured rich text.
    pub fn from_document(doc: &Document) -> serde_json::Result<Self> {
        let raw: Vec<RawContentBlock> = doc.field_as("content")?;
        let content = raw
            .into_iter()
            .map(|block| ContentBlock {
                heading: text_value(&block.heading),
                body: block.body,
            })
            .collect();

        let banner_url = doc
            .data
            .get("banner")
            .and_then(|b| b.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            uid: doc.uid.clone().unwrap_or_default(),
            first_publication_date: doc.first_publication_date.clone(),
            last_publication_date: doc.last_publication_date.clone(),
            title: doc.text_field("title"),
            subtitle: doc.text_field("subtitle"),
            banner_url,
            author: doc.text_field("author"),
            content,
        })
    }
}

/// Navigation link to a neighbouring post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacentPost {
    pub title: String,
    pub url: String,
}

impl AdjacentPost {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let uid = doc.uid.as_deref().filter(|u| !u.is_empty())?;
        Some(Self {
            title: doc.text_field("title"),
            url: post_path(uid),
        })
    }
}

/// Posts shown so far plus the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPagination {
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

impl PostPagination {
    /// First page of a listing
    pub fn from_response(response: SearchResponse) -> Self {
        Self::default().append_page(response)
    }

    /// Append a fetched page: existing posts keep their order, new posts
    /// follow, and the cursor becomes the response's `next_page`.
    pub fn append_page(mut self, response: SearchResponse) -> Self {
        self.results
            .extend(response.results.iter().map(PostSummary::from_document));
        self.next_page = response.next_page.filter(|n| !n.is_empty());
        self
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}
