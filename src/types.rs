//! Core data model: block trees and styled inline content.
//!
//! A document is a flat `Vec<Block>`. Blocks carry a closed `BlockKind` sum
//! type instead of a free-form type string, so the builder, serializers and
//! diff engine all get exhaustiveness checking from the compiler.
//!
//! The serde representation mirrors the block-JSON interchange form consumed
//! by editor hosts: a camelCase `type` tag with per-kind fields flattened
//! into the block object.

use serde::{Deserialize, Serialize};

/// One structural unit of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Stable identifier assigned by an editor host; never produced by the
    /// markdown builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: Vec<Inline>,
}

/// The supported block kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    /// Heading with a level always in `1..=6`.
    Heading { level: u8 },
    Paragraph,
    BulletListItem,
    /// Ordered list item. `number` is the list's declared start offset plus
    /// the item's position within the list.
    NumberedListItem { number: u64 },
    /// Fenced code. `language` defaults to `"plaintext"` when the source
    /// fence carries no info string.
    CodeBlock { language: String },
    Quote,
}

impl BlockKind {
    /// Whether two kinds are the same variant, ignoring per-variant payload.
    /// Diff pairing matches on the variant, not on props.
    pub fn same_variant(&self, other: &BlockKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, BlockKind::BulletListItem | BlockKind::NumberedListItem { .. })
    }
}

/// A styled text run or link within a block's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text(TextNode),
    Link(LinkNode),
}

/// Inline style flags. All default to off; serde omits unset flags so the
/// JSON form stays compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Styles {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

fn is_false(v: &bool) -> bool {
    !v
}

impl Styles {
    pub fn is_plain(&self) -> bool {
        *self == Styles::default()
    }
}

/// A run of text with a single style set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Styles::is_plain")]
    pub styles: Styles,
}

/// A link whose visible text is itself an inline sequence (styled link text
/// is allowed).
///
/// `original_href` and `original_url` are set to the same value as `href` at
/// construction time. The redundancy is deliberate: if `href` is later
/// corrupted by an editing layer, serialization can still recover the
/// original target (see the `link_map` module).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkNode {
    pub content: Vec<Inline>,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl Inline {
    /// Plain text node without styling.
    pub fn text(text: impl Into<String>) -> Inline {
        Inline::styled(text, Styles::default())
    }

    pub fn styled(text: impl Into<String>, styles: Styles) -> Inline {
        Inline::Text(TextNode {
            text: text.into(),
            styles,
        })
    }

    /// Link with all three href fields set to the same target.
    pub fn link(content: Vec<Inline>, href: impl Into<String>) -> Inline {
        let href = href.into();
        let href = if href.is_empty() { "#".to_string() } else { href };
        Inline::Link(LinkNode {
            content,
            original_href: Some(href.clone()),
            original_url: Some(href.clone()),
            href,
        })
    }

    /// The node's text with all styling and link structure stripped.
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text(t) => t.text.clone(),
            Inline::Link(l) => l.plain_text(),
        }
    }

    /// True when the node carries no visible text at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Inline::Text(t) => t.text.trim().is_empty(),
            Inline::Link(l) => l.content.iter().all(Inline::is_blank),
        }
    }
}

impl LinkNode {
    pub fn plain_text(&self) -> String {
        self.content.iter().map(Inline::plain_text).collect()
    }
}

/// Clamp a heading level into the valid `1..=6` range.
pub fn clamp_heading_level(level: u8) -> u8 {
    level.clamp(1, 6)
}

/// True when at least one inline node carries visible text.
pub fn has_meaningful_content(content: &[Inline]) -> bool {
    content.iter().any(|node| !node.is_blank())
}

impl Block {
    pub fn new(kind: BlockKind, content: Vec<Inline>) -> Block {
        Block {
            id: None,
            kind,
            content,
        }
    }

    /// Heading block. Out-of-range levels are clamped rather than rejected.
    pub fn heading(level: u8, content: Vec<Inline>) -> Block {
        let clamped = clamp_heading_level(level);
        if clamped != level {
            log::debug!("clamped heading level {level} to {clamped}");
        }
        Block::new(BlockKind::Heading { level: clamped }, content)
    }

    pub fn paragraph(content: Vec<Inline>) -> Block {
        Block::new(BlockKind::Paragraph, content)
    }

    pub fn quote(content: Vec<Inline>) -> Block {
        Block::new(BlockKind::Quote, content)
    }

    pub fn bullet_item(content: Vec<Inline>) -> Block {
        Block::new(BlockKind::BulletListItem, content)
    }

    pub fn numbered_item(number: u64, content: Vec<Inline>) -> Block {
        Block::new(BlockKind::NumberedListItem { number }, content)
    }

    pub fn code(language: impl Into<String>, code: impl Into<String>) -> Block {
        let language = language.into();
        let language = if language.is_empty() {
            "plaintext".to_string()
        } else {
            language
        };
        Block::new(
            BlockKind::CodeBlock { language },
            vec![Inline::text(code)],
        )
    }

    /// The block's content flattened to plain text.
    pub fn plain_text(&self) -> String {
        self.content.iter().map(Inline::plain_text).collect()
    }
}
