//! Query predicates and orderings in the repository's query syntax
//!
//! ```text
//! [[at(document.type, "posts")][date.before(document.first_publication_date, "2021-03-25T19:25:28+0000")]]
//! ```

use std::fmt;

/// A single query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Field equals value
    At { path: String, value: String },
    /// Date field strictly before value
    DateBefore { path: String, value: String },
    /// Date field strictly after value
    DateAfter { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn date_before(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::DateBefore {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn date_after(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::DateAfter {
            path: path.into(),
            value: value.into(),
        }
    }

    /// `at(document.type, "<doc_type>")`
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, path, value) = match self {
            Predicate::At { path, value } => ("at", path, value),
            Predicate::DateBefore { path, value } => ("date.before", path, value),
            Predicate::DateAfter { path, value } => ("date.after", path, value),
        };
        write!(f, "[{}({}, {})]", name, path, quote(value))
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render the `q` parameter for a list of predicates
pub fn query_string(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner)
}

/// Sort order for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Render the `orderings` parameter
pub fn orderings_string(orderings: &[Ordering]) -> String {
    let fields: Vec<String> = orderings
        .iter()
        .map(|o| {
            if o.descending {
                format!("{} desc", o.field)
            } else {
                o.field.clone()
            }
        })
        .collect();
    format!("[{}]", fields.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_display() {
        assert_eq!(
            Predicate::document_type("posts").to_string(),
            r#"[at(document.type, "posts")]"#
        );
        assert_eq!(
            Predicate::date_after("document.first_publication_date", "2021-03-25").to_string(),
            r#"[date.after(document.first_publication_date, "2021-03-25")]"#
        );
    }

    #[test]
    fn test_query_string_wraps_all_predicates() {
        let q = query_string(&[
            Predicate::document_type("posts"),
            Predicate::date_before("document.first_publication_date", "2021-03-25"),
        ]);
        assert_eq!(
            q,
            r#"[[at(document.type, "posts")][date.before(document.first_publication_date, "2021-03-25")]]"#
        );
    }

    #[test]
    fn test_values_are_escaped() {
        assert_eq!(
            Predicate::at("my.posts.uid", r#"a"b\c"#).to_string(),
            r#"[at(my.posts.uid, "a\"b\\c")]"#
        );
    }

    #[test]
    fn test_orderings_string() {
        assert_eq!(
            orderings_string(&[Ordering::desc("document.first_publication_date")]),
            "[document.first_publication_date desc]"
        );
        assert_eq!(
            orderings_string(&[
                Ordering::asc("document.first_publication_date"),
                Ordering::desc("my.posts.title"),
            ]),
            "[document.first_publication_date,my.posts.title desc]"
        );
    }
}
