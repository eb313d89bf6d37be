//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template; rendered rich-text bodies are the only values inserted
//! with `| safe`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{SiteConfig, UtterancesConfig};
use crate::content::{resolve_link, AdjacentPost, HomeProps, PostProps, PostSummary};
use crate::helpers::{is_safe_url, DateFormatter};
use crate::i18n::I18n;
use crate::prismic::richtext;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
    strings: HashMap<String, String>,
    utterances: Option<UtterancesConfig>,
    post_type: String,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig, i18n: &I18n) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("post.html", include_str!("site/post.html")),
            ("loading.html", include_str!("site/loading.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            ("error.html", include_str!("site/error.html")),
            (
                "preview_redirect.html",
                include_str!("site/preview_redirect.html"),
            ),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/post_list.html",
                include_str!("site/partials/post_list.html"),
            ),
            (
                "partials/exit_preview.html",
                include_str!("site/partials/exit_preview.html"),
            ),
        ])?;

        let dates = DateFormatter::from_config(config);
        tera.register_filter(
            "date_short",
            move |value: &tera::Value, _: &HashMap<String, tera::Value>| {
                Ok(tera::Value::String(
                    value.as_str().map(|s| dates.short(s)).unwrap_or_default(),
                ))
            },
        );
        tera.register_filter(
            "date_long",
            move |value: &tera::Value, _: &HashMap<String, tera::Value>| {
                Ok(tera::Value::String(
                    value.as_str().map(|s| dates.long(s)).unwrap_or_default(),
                ))
            },
        );

        Ok(Self {
            tera,
            site: SiteData::from_config(config),
            strings: i18n.strings(),
            utterances: config
                .utterances
                .enabled()
                .then(|| config.utterances.clone()),
            post_type: config.document_type.clone(),
        })
    }

    /// Render a template with the shared site context added
    fn render(&self, template_name: &str, mut context: Context) -> Result<String> {
        context.insert("site", &self.site);
        context.insert("t", &self.strings);
        if !context.contains_key("preview") {
            context.insert("preview", &false);
        }
        Ok(self.tera.render(template_name, &context)?)
    }

    /// Listing page; `pages` is how many listing pages `props` holds
    pub fn render_home(&self, props: &HomeProps, pages: usize) -> Result<String> {
        let mut context = Context::new();
        context.insert("posts_pagination", &props.posts_pagination);
        context.insert("posts", &props.posts_pagination.results);
        context.insert("pages", &pages.max(1));
        context.insert("preview", &props.preview);
        self.render("home.html", context)
    }

    /// Listing entries alone, appended client-side by "load more"
    pub fn render_post_list(&self, posts: &[PostSummary]) -> Result<String> {
        let mut context = Context::new();
        context.insert("posts", posts);
        self.render("partials/post_list.html", context)
    }

    /// Post page
    pub fn render_post(&self, props: &PostProps) -> Result<String> {
        let post = &props.post;
        let resolve =
            |doc_type: &str, uid: Option<&str>| resolve_link(&self.post_type, doc_type, uid);
        let sections: Vec<SectionData> = post
            .content
            .iter()
            .map(|block| SectionData {
                heading: block.heading.clone(),
                html: richtext::as_html(&block.body, &resolve),
            })
            .collect();

        let mut context = Context::new();
        context.insert(
            "post",
            &PostData {
                title: &post.title,
                subtitle: &post.subtitle,
                author: &post.author,
                banner_url: Some(post.banner_url.as_str()).filter(|u| is_safe_url(u)),
                first_publication_date: post.first_publication_date.as_deref(),
                last_publication_date: post.last_publication_date.as_deref(),
            },
        );
        context.insert("sections", &sections);
        context.insert("reading_time", &props.reading_time);
        context.insert("previous_url", &safe_link(props.previous_url.as_ref()));
        context.insert("next_url", &safe_link(props.next_url.as_ref()));
        context.insert("utterances", &self.utterances);
        context.insert("preview", &props.preview);
        self.render("post.html", context)
    }

    /// Placeholder served while a route is being generated
    pub fn render_loading(&self) -> Result<String> {
        self.render("loading.html", Context::new())
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.render("not_found.html", Context::new())
    }

    pub fn render_error(&self) -> Result<String> {
        self.render("error.html", Context::new())
    }

    /// Page sending the browser to `url` after a preview session starts
    pub fn render_preview_redirect(&self, url: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("url", url);
        // `<` is escaped so the literal cannot close the script element
        context.insert("url_js", &serde_json::to_string(url)?.replace('<', "\\u003c"));
        self.render("preview_redirect.html", context)
    }
}

fn safe_link(link: Option<&AdjacentPost>) -> Option<&AdjacentPost> {
    link.filter(|l| is_safe_url(&l.url))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub url: String,
}

impl SiteData {
    fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PostData<'a> {
    title: &'a str,
    subtitle: &'a str,
    author: &'a str,
    banner_url: Option<&'a str>,
    first_publication_date: Option<&'a str>,
    last_publication_date: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SectionData {
    heading: String,
    html: String,
}
