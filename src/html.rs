//! Block tree → HTML.
//!
//! Mirrors the markdown serializer's block rules: consecutive same-kind list
//! items are wrapped in one `<ul>`/`<ol>`. Text and attribute values are
//! escaped, but the output is not sanitized; callers must sanitize at the
//! render boundary before inserting into a trusted DOM.

use crate::types::{Block, BlockKind, Inline, TextNode};
use itertools::Itertools;

/// Serialize a block tree to HTML.
pub fn blocks_to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for (key, group) in &blocks.iter().chunk_by(|block| list_tag(&block.kind)) {
        match key {
            Some(tag) => {
                out.push_str(&format!("<{tag}>"));
                for block in group {
                    out.push_str("<li>");
                    out.push_str(&render_inline(&block.content));
                    out.push_str("</li>");
                }
                out.push_str(&format!("</{tag}>"));
            }
            None => {
                for block in group {
                    out.push_str(&render_block(block));
                }
            }
        }
    }
    out
}

fn list_tag(kind: &BlockKind) -> Option<&'static str> {
    match kind {
        BlockKind::BulletListItem => Some("ul"),
        BlockKind::NumberedListItem { .. } => Some("ol"),
        _ => None,
    }
}

fn render_block(block: &Block) -> String {
    match &block.kind {
        BlockKind::Heading { level } => {
            let level = crate::types::clamp_heading_level(*level);
            format!("<h{level}>{}</h{level}>", render_inline(&block.content))
        }
        BlockKind::Paragraph => format!("<p>{}</p>", render_inline(&block.content)),
        BlockKind::CodeBlock { language } => {
            format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                escape_html(language),
                escape_html(&block.plain_text())
            )
        }
        BlockKind::Quote => format!("<blockquote>{}</blockquote>", render_inline(&block.content)),
        // List items always reach the grouped branch in blocks_to_html; a
        // bare item still renders sensibly if this is called directly.
        BlockKind::BulletListItem | BlockKind::NumberedListItem { .. } => {
            format!("<li>{}</li>", render_inline(&block.content))
        }
    }
}

pub(crate) fn render_inline(content: &[Inline]) -> String {
    content
        .iter()
        .map(|node| match node {
            Inline::Text(text) => render_text(text),
            Inline::Link(link) => format!(
                "<a href=\"{}\" target=\"_blank\">{}</a>",
                escape_html(&link.href),
                render_inline(&link.content)
            ),
        })
        .collect()
}

fn render_text(node: &TextNode) -> String {
    let mut out = escape_html(&node.text);
    if node.styles.code {
        out = format!("<code>{out}</code>");
    }
    if node.styles.strike {
        out = format!("<s>{out}</s>");
    }
    if node.styles.underline {
        out = format!("<u>{out}</u>");
    }
    if node.styles.italic {
        out = format!("<em>{out}</em>");
    }
    if node.styles.bold {
        out = format!("<strong>{out}</strong>");
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
