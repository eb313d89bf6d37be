//! Structured rich text as delivered by the repository, and its plain-text
//! and HTML serializations.
//!
//! Span offsets count UTF-16 code units, matching the editor that produced
//! them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::helpers::{html_escape, image_tag, link_to};

/// Maps a linked document (`type`, `uid`) to a site path
pub type LinkResolver<'a> = &'a dyn Fn(&str, Option<&str>) -> String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

/// One rich-text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Value>,
}

impl RichTextBlock {
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: Some(text.to_string()),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over `[start, end)` of the block text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

/// Payload of hyperlink and label spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    pub link_type: Option<String>,
    pub url: Option<String>,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub target: Option<String>,
    pub label: Option<String>,
}

/// Plain text of all blocks, joined by a space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML for a block sequence. Consecutive list items share one list element.
pub fn as_html(blocks: &[RichTextBlock], resolve: LinkResolver<'_>) -> String {
    let mut out = String::new();
    let mut i = 0;

    while i < blocks.len() {
        let kind = blocks[i].kind;
        if matches!(kind, BlockKind::ListItem | BlockKind::OListItem) {
            let tag = if kind == BlockKind::ListItem { "ul" } else { "ol" };
            out.push_str(&format!("<{}>", tag));
            while i < blocks.len() && blocks[i].kind == kind {
                out.push_str(&format!("<li>{}</li>", inline_html(&blocks[i], resolve)));
                i += 1;
            }
            out.push_str(&format!("</{}>", tag));
            continue;
        }

        out.push_str(&block_html(&blocks[i], resolve));
        i += 1;
    }

    out
}

fn block_html(block: &RichTextBlock, resolve: LinkResolver<'_>) -> String {
    let heading = |level: u8| {
        format!(
            "<h{}>{}</h{}>",
            level,
            inline_html(block, resolve),
            level
        )
    };

    match block.kind {
        BlockKind::Heading1 => heading(1),
        BlockKind::Heading2 => heading(2),
        BlockKind::Heading3 => heading(3),
        BlockKind::Heading4 => heading(4),
        BlockKind::Heading5 => heading(5),
        BlockKind::Heading6 => heading(6),
        BlockKind::Paragraph => format!("<p>{}</p>", inline_html(block, resolve)),
        BlockKind::Preformatted => format!("<pre>{}</pre>", inline_html(block, resolve)),
        BlockKind::Image => {
            let img = image_tag(block.url.as_deref().unwrap_or(""), block.alt.as_deref());
            if img.is_empty() {
                String::new()
            } else {
                format!(r#"<p class="block-img">{}</p>"#, img)
            }
        }
        BlockKind::Embed => embed_html(block.oembed.as_ref()),
        // Only reachable for list items outside of `as_html`
        BlockKind::ListItem | BlockKind::OListItem => {
            format!("<li>{}</li>", inline_html(block, resolve))
        }
        BlockKind::Unknown => String::new(),
    }
}

fn embed_html(oembed: Option<&Value>) -> String {
    let Some(oembed) = oembed else {
        return String::new();
    };
    let field = |name: &str| oembed.get(name).and_then(Value::as_str).unwrap_or("");
    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        html_escape(field("embed_url")),
        html_escape(field("type")),
        html_escape(field("provider_name")),
        field("html")
    )
}

fn inline_html(block: &RichTextBlock, resolve: LinkResolver<'_>) -> String {
    let text = block.text.as_deref().unwrap_or("");
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();

    let mut spans: Vec<Span> = block
        .spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .map(|s| Span {
            end: s.end.min(len),
            ..s.clone()
        })
        .collect();
    // Outer spans first when two start together
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    render_range(&units, 0, len, &spans, resolve)
}

fn render_range(
    units: &[u16],
    start: usize,
    end: usize,
    spans: &[Span],
    resolve: LinkResolver<'_>,
) -> String {
    let mut out = String::new();
    let mut pos = start;
    let mut idx = 0;

    while idx < spans.len() {
        let span = &spans[idx];
        let span_start = span.start.max(pos);
        let span_end = span.end.min(end);
        if span_start >= span_end {
            idx += 1;
            continue;
        }

        out.push_str(&text_html(units, pos, span_start));

        // Spans opening inside this one are nested in it; overlaps are clipped
        let mut next = idx + 1;
        while next < spans.len() && spans[next].start < span_end {
            next += 1;
        }
        let inner = render_range(units, span_start, span_end, &spans[idx + 1..next], resolve);
        out.push_str(&wrap_span(span, &inner, resolve));

        pos = span_end;
        idx = next;
    }

    out.push_str(&text_html(units, pos, end));
    out
}

fn text_html(units: &[u16], start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }
    html_escape(&String::from_utf16_lossy(&units[start..end])).replace('\n', "<br />")
}

fn wrap_span(span: &Span, inner: &str, resolve: LinkResolver<'_>) -> String {
    match span.kind {
        SpanKind::Strong => format!("<strong>{}</strong>", inner),
        SpanKind::Em => format!("<em>{}</em>", inner),
        SpanKind::Hyperlink => {
            let Some(data) = span.data.as_ref() else {
                return inner.to_string();
            };
            let href = match data.link_type.as_deref() {
                Some("Document") => {
                    resolve(data.doc_type.as_deref().unwrap_or(""), data.uid.as_deref())
                }
                _ => data.url.clone().unwrap_or_default(),
            };
            let new_tab = data.target.as_deref() == Some("_blank");
            link_to(&href, inner, new_tab)
        }
        SpanKind::Label => match span.data.as_ref().and_then(|d| d.label.as_deref()) {
            Some(label) => format!(r#"<span class="{}">{}</span>"#, html_escape(label), inner),
            None => inner.to_string(),
        },
        SpanKind::Unknown => inner.to_string(),
    }
}
