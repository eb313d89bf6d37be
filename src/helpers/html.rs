//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Only absolute http(s) URLs and site-relative paths may appear in
/// `href`/`src` attributes built from repository content.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://")
        || url.starts_with("http://")
        || (url.starts_with('/') && !url.starts_with("//"))
}

/// Generate an anchor tag; `text` is expected to be escaped already
pub fn link_to(href: &str, text: &str, new_tab: bool) -> String {
    if !is_safe_url(href) {
        return text.to_string();
    }
    if new_tab {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            html_escape(href),
            text
        )
    } else {
        format!(r#"<a href="{}">{}</a>"#, html_escape(href), text)
    }
}

/// Generate an image tag, or nothing when the URL is unusable
pub fn image_tag(src: &str, alt: Option<&str>) -> String {
    if !is_safe_url(src) {
        return String::new();
    }
    format!(
        r#"<img src="{}" alt="{}" />"#,
        html_escape(src),
        html_escape(alt.unwrap_or(""))
    )
}
