//! Block building: markdown text → block tree.
//!
//! The lexing itself is delegated to pulldown-cmark (tables and
//! strikethrough enabled); this module walks the event stream and maps it
//! onto the flat block model. Malformed input never fails: constructs the
//! block model cannot express degrade to paragraphs, and empty blocks are
//! dropped.

use crate::inline::InlineBuilder;
use crate::types::{has_meaningful_content, Block, BlockKind, Inline, TextNode};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

/// Bare URLs in paragraph text. Parens and brackets are legal mid-URL
/// (wiki-style paths); trailing sentence punctuation is stripped afterwards,
/// with closers kept only while they balance an opener inside the URL.
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>'"`]+"#).unwrap());

/// Convert markdown text into a block tree.
///
/// Empty or blank input yields an empty tree. The result never contains
/// blocks without meaningful inline content (code blocks keep their raw text
/// verbatim and are exempt from the whitespace filter).
pub fn markdown_to_blocks(text: &str) -> Vec<Block> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut collector = BlockCollector::default();
    for event in Parser::new_ext(text, options) {
        collector.event(event);
    }
    let mut blocks = collector.finish();

    autolink_bare_urls(&mut blocks);
    blocks.retain(|block| {
        matches!(block.kind, BlockKind::CodeBlock { .. }) || has_meaningful_content(&block.content)
    });
    blocks
}

/// Per-list bookkeeping. `start` is `Some` for ordered lists; `index` is the
/// position of the next item.
#[derive(Debug)]
struct ListFrame {
    start: Option<u64>,
    index: u64,
}

#[derive(Debug, Default)]
struct BlockCollector {
    out: Vec<Block>,
    inline: InlineBuilder,
    /// Kind of the block currently accumulating inline content.
    open: Option<BlockKind>,
    lists: Vec<ListFrame>,
    quote_depth: usize,
    /// Raw text buffer while inside a code block, with its language.
    code: Option<(String, String)>,
    /// Cell texts of the table row being collected, if any.
    table_row: Option<Vec<String>>,
}

impl BlockCollector {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(row) = self.table_row.as_mut() {
                    if let Some(cell) = row.last_mut() {
                        cell.push_str(&code);
                    }
                } else {
                    self.ensure_open();
                    self.inline.code_span(&code);
                }
            }
            Event::SoftBreak | Event::HardBreak => self.line_break(),
            Event::Rule => {
                // No block kind for thematic breaks: degrade to a literal
                // paragraph so the document round-trips.
                self.flush();
                self.out.push(Block::paragraph(vec![Inline::text("---")]));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                // Raw HTML degrades to plain text.
                self.text(&html);
            }
            Event::FootnoteReference(_) | Event::TaskListMarker(_) => {}
            Event::InlineMath(math) | Event::DisplayMath(math) => self.text(&math),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => match &self.open {
                // Paragraphs inside a loose list item contribute to the
                // item's inline content, separated by a single space.
                Some(kind) if kind.is_list_item() => {
                    if !self.inline.is_empty() {
                        self.inline.space();
                    }
                }
                _ => {
                    self.flush();
                    self.open = Some(self.paragraph_kind());
                }
            },
            Tag::Heading { level, .. } => {
                self.flush();
                self.open = Some(BlockKind::Heading { level: level as u8 });
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let lang = info.split(' ').next().unwrap_or("");
                        if lang.is_empty() {
                            "plaintext".to_string()
                        } else {
                            lang.to_string()
                        }
                    }
                    CodeBlockKind::Indented => "plaintext".to_string(),
                };
                self.code = Some((language, String::new()));
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(ListFrame { start, index: 0 });
            }
            Tag::Item => {
                self.flush();
                self.open = Some(self.item_kind());
            }
            Tag::Emphasis => self.inline.start_italic(),
            Tag::Strong => self.inline.start_bold(),
            Tag::Strikethrough => self.inline.start_strike(),
            Tag::Link { dest_url, .. } => {
                self.ensure_open();
                self.inline.start_link(&dest_url);
            }
            // Images degrade to their alt text, which arrives as plain text
            // events between Start and End.
            Tag::Image { .. } => {}
            Tag::Table(_) => self.flush(),
            Tag::TableHead | Tag::TableRow => self.table_row = Some(Vec::new()),
            Tag::TableCell => {
                if let Some(row) = self.table_row.as_mut() {
                    row.push(String::new());
                }
            }
            // Not enabled in the lexer configuration; ignored defensively.
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                // List items flush at End(Item), not at inner paragraph ends.
                if !matches!(&self.open, Some(kind) if kind.is_list_item()) {
                    self.flush();
                }
            }
            TagEnd::Heading(_) => self.flush(),
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                if let Some((language, mut raw)) = self.code.take() {
                    if raw.ends_with('\n') {
                        raw.pop();
                    }
                    self.out.push(Block::code(language, raw));
                }
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::Item => {
                self.flush();
                if let Some(frame) = self.lists.last_mut() {
                    frame.index += 1;
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.inline.end_style(),
            TagEnd::Link => self.inline.end_link(),
            TagEnd::Image => {}
            TagEnd::TableHead | TagEnd::TableRow => {
                // Rows degrade to one paragraph per row, cells joined by
                // single spaces.
                if let Some(row) = self.table_row.take() {
                    let joined = row.join(" ");
                    if !joined.trim().is_empty() {
                        self.out.push(Block::paragraph(vec![Inline::text(joined)]));
                    }
                }
            }
            TagEnd::Table => self.table_row = None,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, buffer)) = self.code.as_mut() {
            buffer.push_str(text);
        } else if let Some(row) = self.table_row.as_mut() {
            if let Some(cell) = row.last_mut() {
                cell.push_str(text);
            }
        } else {
            self.ensure_open();
            self.inline.text(text);
        }
    }

    /// Line breaks split paragraphs and quotes into separate blocks
    /// (line-break-sensitive lexing); inside headings and list items they
    /// become a single space.
    fn line_break(&mut self) {
        match self.open {
            Some(BlockKind::Paragraph) | Some(BlockKind::Quote) => {
                let kind = self.open.clone();
                self.flush();
                self.open = kind;
            }
            Some(_) => self.inline.space(),
            None => {}
        }
    }

    /// Kind for a paragraph in the current context.
    fn paragraph_kind(&self) -> BlockKind {
        if self.quote_depth > 0 {
            BlockKind::Quote
        } else {
            BlockKind::Paragraph
        }
    }

    fn item_kind(&self) -> BlockKind {
        match self.lists.last() {
            Some(ListFrame {
                start: Some(start),
                index,
            }) => BlockKind::NumberedListItem {
                number: start + index,
            },
            _ => BlockKind::BulletListItem,
        }
    }

    /// Text arriving with no open block opens an implicit paragraph.
    fn ensure_open(&mut self) {
        if self.open.is_none() {
            self.open = Some(self.paragraph_kind());
        }
    }

    /// Closes the currently accumulating block, dropping it when its inline
    /// content has no visible text.
    fn flush(&mut self) {
        let content = self.inline.finish();
        if let Some(kind) = self.open.take() {
            if has_meaningful_content(&content) {
                self.out.push(Block::new(kind, content));
            }
        } else if has_meaningful_content(&content) {
            // Inline content with no recorded open block still surfaces as a
            // paragraph rather than being lost.
            self.out.push(Block::paragraph(content));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.out
    }
}

/// Post-pass over paragraph blocks: bare `http(s)://` runs in plain text
/// nodes become links. Text already inside a link is left alone. Trailing
/// sentence punctuation is split into a following text node so it is never
/// swallowed into the URL.
fn autolink_bare_urls(blocks: &mut [Block]) {
    for block in blocks {
        if !matches!(block.kind, BlockKind::Paragraph) {
            continue;
        }
        let content = std::mem::take(&mut block.content);
        block.content = content
            .into_iter()
            .flat_map(|node| match node {
                Inline::Text(text) => autolink_text_node(text),
                link @ Inline::Link(_) => vec![link],
            })
            .collect();
    }
}

fn autolink_text_node(node: TextNode) -> Vec<Inline> {
    if !BARE_URL.is_match(&node.text) {
        return vec![Inline::Text(node)];
    }

    let mut out = Vec::new();
    let mut cursor = 0;
    for m in BARE_URL.find_iter(&node.text) {
        let url = strip_trailing_punct(m.as_str());
        let end = m.start() + url.len();
        if url.is_empty() {
            continue;
        }
        if m.start() > cursor {
            out.push(Inline::styled(&node.text[cursor..m.start()], node.styles));
        }
        out.push(Inline::link(
            vec![Inline::styled(url, node.styles)],
            url.to_string(),
        ));
        cursor = end;
    }
    if cursor < node.text.len() {
        out.push(Inline::styled(&node.text[cursor..], node.styles));
    }
    out
}

/// Drops sentence punctuation from the end of a URL match. A closing paren
/// or bracket stays only while it has a matching opener earlier in the URL,
/// so `/Rust_(disambiguation)` survives but the `)` closing `(see ...)`
/// does not.
fn strip_trailing_punct(mut url: &str) -> &str {
    while let Some(last) = url.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            ']' => url.matches(']').count() > url.matches('[').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LinkNode, Styles};
    use pretty_assertions::assert_eq;

    fn text_of(node: &Inline) -> &str {
        match node {
            Inline::Text(t) => &t.text,
            Inline::Link(_) => panic!("expected text node"),
        }
    }

    fn link_of(node: &Inline) -> &LinkNode {
        match node {
            Inline::Link(l) => l,
            Inline::Text(_) => panic!("expected link node"),
        }
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert_eq!(markdown_to_blocks(""), Vec::new());
        assert_eq!(markdown_to_blocks("   \n\n  "), Vec::new());
    }

    #[test]
    fn heading_example() {
        let blocks = markdown_to_blocks("# Hello");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Heading { level: 1 });
        assert_eq!(blocks[0].content, vec![Inline::text("Hello")]);
    }

    #[test]
    fn bold_example() {
        let blocks = markdown_to_blocks("This is **bold** text.");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(
            blocks[0].content,
            vec![
                Inline::text("This is "),
                Inline::styled(
                    "bold",
                    Styles {
                        bold: true,
                        ..Default::default()
                    }
                ),
                Inline::text(" text."),
            ]
        );
    }

    #[test]
    fn bullet_list_expands_to_sibling_items() {
        let blocks = markdown_to_blocks("- a\n- b\n- c");
        assert_eq!(blocks.len(), 3);
        for (block, text) in blocks.iter().zip(["a", "b", "c"]) {
            assert_eq!(block.kind, BlockKind::BulletListItem);
            assert_eq!(text_of(&block.content[0]), text);
        }
    }

    #[test]
    fn ordered_list_numbering_uses_declared_start() {
        let blocks = markdown_to_blocks("3. a\n4. b");
        assert_eq!(blocks[0].kind, BlockKind::NumberedListItem { number: 3 });
        assert_eq!(blocks[1].kind, BlockKind::NumberedListItem { number: 4 });
    }

    #[test]
    fn fenced_code_keeps_raw_text_and_language() {
        let blocks = markdown_to_blocks("```rust\nlet x = 1;\n```");
        assert_eq!(
            blocks[0].kind,
            BlockKind::CodeBlock {
                language: "rust".to_string()
            }
        );
        assert_eq!(text_of(&blocks[0].content[0]), "let x = 1;");

        let blocks = markdown_to_blocks("```\nplain\n```");
        assert_eq!(
            blocks[0].kind,
            BlockKind::CodeBlock {
                language: "plaintext".to_string()
            }
        );
    }

    #[test]
    fn blockquote_becomes_quote_blocks() {
        let blocks = markdown_to_blocks("> quoted line");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Quote);
        assert_eq!(text_of(&blocks[0].content[0]), "quoted line");
    }

    #[test]
    fn line_break_splits_paragraphs() {
        let blocks = markdown_to_blocks("first\nsecond");
        assert_eq!(blocks.len(), 2);
        assert_eq!(text_of(&blocks[0].content[0]), "first");
        assert_eq!(text_of(&blocks[1].content[0]), "second");
    }

    #[test]
    fn link_carries_original_targets() {
        let blocks = markdown_to_blocks("[Google](https://google.com)");
        let link = link_of(&blocks[0].content[0]);
        assert_eq!(link.href, "https://google.com");
        assert_eq!(link.original_href.as_deref(), Some("https://google.com"));
        assert_eq!(link.original_url.as_deref(), Some("https://google.com"));
    }

    #[test]
    fn styled_link_text_is_preserved() {
        let blocks = markdown_to_blocks("[**docs**](https://example.com)");
        let link = link_of(&blocks[0].content[0]);
        let Inline::Text(t) = &link.content[0] else {
            panic!("expected text inside link");
        };
        assert!(t.styles.bold);
    }

    #[test]
    fn bare_url_is_autolinked_with_punctuation_split_off() {
        let blocks = markdown_to_blocks("Visit https://example.com/docs. Then rest.");
        let content = &blocks[0].content;
        assert_eq!(text_of(&content[0]), "Visit ");
        let link = link_of(&content[1]);
        assert_eq!(link.href, "https://example.com/docs");
        assert_eq!(text_of(&content[2]), ". Then rest.");
    }

    #[test]
    fn autolink_keeps_balanced_parens_inside_url() {
        let blocks =
            markdown_to_blocks("See https://en.wikipedia.org/wiki/Rust_(disambiguation) for more.");
        let content = &blocks[0].content;
        let link = link_of(&content[1]);
        assert_eq!(link.href, "https://en.wikipedia.org/wiki/Rust_(disambiguation)");
        assert_eq!(text_of(&content[2]), " for more.");
    }

    #[test]
    fn autolink_drops_paren_closing_the_sentence() {
        let blocks = markdown_to_blocks("(see https://example.com/docs).");
        let content = &blocks[0].content;
        assert_eq!(text_of(&content[0]), "(see ");
        let link = link_of(&content[1]);
        assert_eq!(link.href, "https://example.com/docs");
        assert_eq!(text_of(&content[2]), ").");
    }

    #[test]
    fn autolink_skips_urls_already_inside_links() {
        let blocks = markdown_to_blocks("[https://example.com](https://example.com)");
        assert_eq!(blocks[0].content.len(), 1);
        assert!(matches!(blocks[0].content[0], Inline::Link(_)));
    }

    #[test]
    fn empty_paragraphs_are_dropped() {
        let blocks = markdown_to_blocks("a\n\n   \n\nb");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn nested_lists_flatten_to_siblings() {
        let blocks = markdown_to_blocks("- outer\n  - inner\n- last");
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| b.kind == BlockKind::BulletListItem));
    }

    #[test]
    fn unmatched_bold_markers_fall_back() {
        let blocks = markdown_to_blocks("mixed **pair** and ** stray");
        let texts: Vec<String> = blocks[0].content.iter().map(Inline::plain_text).collect();
        assert!(texts.concat().contains("**"));
    }

    #[test]
    fn table_rows_degrade_to_paragraphs() {
        let blocks = markdown_to_blocks("| a | b |\n| --- | --- |\n| c | d |");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "a b");
        assert_eq!(blocks[1].plain_text(), "c d");
    }
}
