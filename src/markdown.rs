//! Block tree → markdown text.
//!
//! Consecutive same-kind list items form one logical list and are joined by
//! single newlines; every other adjacent pair of blocks is separated by a
//! blank line. Grouping is recomputed from block adjacency here, never
//! stored on the blocks themselves.

use crate::link_map::{is_clean_absolute_url, looks_corrupted, recover_href, LinkMap};
use crate::types::{Block, BlockKind, Inline, LinkNode, TextNode};
use itertools::Itertools;

/// Serialize a block tree to markdown.
///
/// The link mapping context is consulted only for links whose href looks
/// corrupted (a dev placeholder host or a bare `"#"`); pass an empty
/// [`LinkMap`] when no associations are known.
pub fn blocks_to_markdown(blocks: &[Block], links: &LinkMap) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (key, group) in &blocks.iter().chunk_by(|block| list_group_key(&block.kind)) {
        let rendered: Vec<String> = group.map(|block| render_block(block, links)).collect();
        match key {
            // One logical list: single newlines between items.
            Some(_) => parts.push(rendered.join("\n")),
            // Non-list blocks are blank-line separated even within a group.
            None => parts.push(rendered.join("\n\n")),
        }
    }
    parts.join("\n\n")
}

/// Grouping key for list runs. Non-list blocks share the `None` key so the
/// chunking keeps them in source order; they are re-separated by blank lines
/// inside the group.
fn list_group_key(kind: &BlockKind) -> Option<u8> {
    match kind {
        BlockKind::BulletListItem => Some(0),
        BlockKind::NumberedListItem { .. } => Some(1),
        _ => None,
    }
}

fn render_block(block: &Block, links: &LinkMap) -> String {
    let inline = render_inline(&block.content, links);
    match &block.kind {
        BlockKind::Heading { level } => {
            let level = crate::types::clamp_heading_level(*level) as usize;
            format!("{} {}", "#".repeat(level), inline)
        }
        BlockKind::Paragraph => inline,
        BlockKind::BulletListItem => format!("- {inline}"),
        // Always rendered as a literal `1.`: downstream renderers re-number
        // list items from adjacency, so the stored number is not replayed.
        BlockKind::NumberedListItem { .. } => format!("1. {inline}"),
        BlockKind::CodeBlock { language } => {
            let code = block.plain_text();
            format!("```{language}\n{code}\n```")
        }
        BlockKind::Quote => format!("> {inline}"),
    }
}

pub(crate) fn render_inline(content: &[Inline], links: &LinkMap) -> String {
    content
        .iter()
        .map(|node| match node {
            Inline::Text(text) => render_text(text),
            Inline::Link(link) => {
                let inner = render_inline(&link.content, links);
                let href = serialized_href(link, links);
                format!("[{inner}]({href})")
            }
        })
        .collect()
}

fn render_text(node: &TextNode) -> String {
    // Code is the innermost layer so co-set styles survive the reparse
    // (`**`code`**` comes back as a bold code span).
    let mut out = if node.styles.code {
        format!("`{}`", node.text)
    } else {
        node.text.clone()
    };
    if node.styles.italic {
        out = format!("_{out}_");
    }
    if node.styles.bold {
        out = format!("**{out}**");
    }
    if node.styles.strike {
        out = format!("~~{out}~~");
    }
    // Underline has no markdown form; the text serializes unstyled.
    out
}

/// The href to serialize for a link, repairing corrupted targets.
///
/// The original targets captured at construction time are preferred; the
/// mapping-based recovery runs only when neither survives.
fn serialized_href(link: &LinkNode, links: &LinkMap) -> String {
    if !looks_corrupted(&link.href) {
        return link.href.clone();
    }
    for original in [&link.original_href, &link.original_url] {
        if let Some(url) = original {
            if is_clean_absolute_url(url) {
                return url.clone();
            }
        }
    }
    recover_href(&link.plain_text(), &link.href, links)
}
