//! Response shapes of the repository REST API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::richtext::{self, RichTextBlock};

/// A repository document. `data` stays untyped until a loader projects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Document {
    /// Read a data field as display text.
    ///
    /// Key-text fields are plain strings; title/rich-text fields are block
    /// arrays and are flattened. Anything else becomes an empty string.
    pub fn text_field(&self, name: &str) -> String {
        self.data.get(name).map(text_value).unwrap_or_default()
    }

    /// Deserialize a data field into a typed shape
    pub fn field_as<T: DeserializeOwned + Default>(&self, name: &str) -> serde_json::Result<T> {
        match self.data.get(name) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone()),
        }
    }
}

/// Display text of a key-text or rich-text value
pub fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) => serde_json::from_value::<Vec<RichTextBlock>>(value.clone())
            .map(|blocks| richtext::as_text(&blocks))
            .unwrap_or_default(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Result page of `documents/search`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub page: u32,
    pub results_per_page: u32,
    pub results_size: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    pub results: Vec<Document>,
}

/// API root document; only the refs are used
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}
