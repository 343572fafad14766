//! blockmark: block-document markdown conversion and structural diffing.
//!
//! The crate converts between flat markdown text and a structured block
//! tree (headings, paragraphs, list items, code blocks, quotes, styled
//! inline spans and links), and computes structure-aware diffs between two
//! revisions of such a tree for side-by-side rendering.
//!
//! The whole core is synchronous, pure computation over in-memory values:
//! no I/O, no shared state beyond the caller-owned [`LinkMap`]. Malformed
//! input never fails a conversion; it degrades to the closest expressible
//! block structure.
//!
//! ```
//! use blockmark_lib::{blocks_to_html, blocks_to_markdown, markdown_to_blocks, LinkMap};
//!
//! let blocks = markdown_to_blocks("# Hello");
//! assert_eq!(blocks_to_html(&blocks), "<h1>Hello</h1>");
//! assert_eq!(blocks_to_markdown(&blocks, &LinkMap::new()), "# Hello");
//! ```

pub mod builder;
pub mod diff;
pub mod html;
pub mod inline;
pub mod link_map;
pub mod markdown;
pub mod types;

pub use builder::markdown_to_blocks;
pub use html::blocks_to_html;
pub use link_map::{recover_href, LinkMap};
pub use markdown::blocks_to_markdown;
pub use types::{Block, BlockKind, Inline, LinkNode, Styles, TextNode};
