//! Inline normalization: lexer inline events become a style-tagged inline
//! node sequence.
//!
//! Styles are inherited downward: everything inside an emphasis span is
//! italic, everything inside a strong span is bold, and so on. Link content
//! is itself a normalized inline sequence, so styled link text survives.

use crate::types::{Inline, Styles, TextNode};

/// Accumulates inline nodes for the block currently being built.
///
/// The block builder drives this with start/end style events, text runs and
/// link boundaries, then calls [`InlineBuilder::finish`] to take the
/// normalized sequence. Whitespace-only nodes are dropped at finish time so
/// no block ever retains them.
#[derive(Debug, Default)]
pub struct InlineBuilder {
    /// Inherited-style stack; the last entry is the active style set.
    styles: Vec<Styles>,
    /// Open links. Text accumulates into the innermost open link.
    links: Vec<OpenLink>,
    out: Vec<Inline>,
}

#[derive(Debug)]
struct OpenLink {
    href: String,
    content: Vec<Inline>,
}

impl InlineBuilder {
    pub fn new() -> InlineBuilder {
        InlineBuilder::default()
    }

    pub fn with_styles(inherited: Styles) -> InlineBuilder {
        InlineBuilder {
            styles: vec![inherited],
            ..Default::default()
        }
    }

    fn current(&self) -> Styles {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push(&mut self, node: Inline) {
        match self.links.last_mut() {
            Some(link) => link.content.push(node),
            None => self.out.push(node),
        }
    }

    pub fn start_italic(&mut self) {
        let styles = Styles {
            italic: true,
            ..self.current()
        };
        self.styles.push(styles);
    }

    pub fn start_bold(&mut self) {
        let styles = Styles {
            bold: true,
            ..self.current()
        };
        self.styles.push(styles);
    }

    pub fn start_strike(&mut self) {
        let styles = Styles {
            strike: true,
            ..self.current()
        };
        self.styles.push(styles);
    }

    /// Ends the innermost style span. Unbalanced end events are tolerated.
    pub fn end_style(&mut self) {
        self.styles.pop();
    }

    pub fn start_link(&mut self, href: &str) {
        self.links.push(OpenLink {
            href: href.to_string(),
            content: Vec::new(),
        });
    }

    pub fn end_link(&mut self) {
        if let Some(link) = self.links.pop() {
            self.push(Inline::link(link.content, link.href));
        }
    }

    /// A plain text run. If the lexer left literal `**` markers in the text
    /// (unbalanced or inline-mixed usage it did not tokenize as strong), the
    /// fallback scanner recovers paired runs as bold.
    pub fn text(&mut self, raw: &str) {
        if raw.contains("**") {
            for node in scan_bold_markers(raw, self.current()) {
                self.push(Inline::Text(node));
            }
        } else {
            let styles = self.current();
            self.push(Inline::styled(raw, styles));
        }
    }

    /// An inline code span: a single text node with `code` set, on top of
    /// whatever styles are inherited.
    pub fn code_span(&mut self, code: &str) {
        let styles = Styles {
            code: true,
            ..self.current()
        };
        self.push(Inline::styled(code, styles));
    }

    /// A line break inside a context that cannot split (heading, list item):
    /// rendered as a single space.
    pub fn space(&mut self) {
        let styles = self.current();
        self.push(Inline::styled(" ", styles));
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty() && self.links.is_empty()
    }

    /// Takes the accumulated sequence, closing any still-open links and
    /// dropping whitespace-only nodes. The builder is reset for reuse.
    pub fn finish(&mut self) -> Vec<Inline> {
        while !self.links.is_empty() {
            self.end_link();
        }
        let out = std::mem::take(&mut self.out);
        out.into_iter().filter(|node| !node.is_blank()).collect()
    }
}

/// Fallback scanner for literal `**` markers the lexer did not pair up.
///
/// Paired `**...**` runs become bold text nodes; text outside pairs keeps the
/// inherited styles; an unmatched trailing `**` is kept literally rather than
/// treated as a style toggle. This is a compatibility heuristic for documents
/// written with unbalanced or inline-mixed markers, not general parsing.
pub fn scan_bold_markers(text: &str, inherited: Styles) -> Vec<TextNode> {
    let parts: Vec<&str> = text.split("**").collect();
    let markers = parts.len() - 1;
    let paired = markers - (markers % 2);

    let mut nodes = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            if !part.is_empty() {
                nodes.push(TextNode {
                    text: (*part).to_string(),
                    styles: inherited,
                });
            }
            continue;
        }
        let marker = i - 1;
        if marker >= paired {
            // The unmatched trailing marker stays in the output verbatim.
            nodes.push(TextNode {
                text: format!("**{part}"),
                styles: inherited,
            });
        } else if marker % 2 == 0 {
            if !part.is_empty() {
                nodes.push(TextNode {
                    text: (*part).to_string(),
                    styles: Styles {
                        bold: true,
                        ..inherited
                    },
                });
            }
        } else if !part.is_empty() {
            nodes.push(TextNode {
                text: (*part).to_string(),
                styles: inherited,
            });
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain(text: &str) -> TextNode {
        TextNode {
            text: text.to_string(),
            styles: Styles::default(),
        }
    }

    fn bold(text: &str) -> TextNode {
        TextNode {
            text: text.to_string(),
            styles: Styles {
                bold: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn paired_markers_become_bold() {
        assert_eq!(
            scan_bold_markers("a **b** c", Styles::default()),
            vec![plain("a "), bold("b"), plain(" c")]
        );
    }

    #[test]
    fn multiple_pairs() {
        assert_eq!(
            scan_bold_markers("**a** and **b**", Styles::default()),
            vec![bold("a"), plain(" and "), bold("b")]
        );
    }

    #[test]
    fn unmatched_trailing_marker_stays_literal() {
        assert_eq!(
            scan_bold_markers("a **b** c **d", Styles::default()),
            vec![plain("a "), bold("b"), plain(" c "), plain("**d")]
        );
        assert_eq!(
            scan_bold_markers("a**", Styles::default()),
            vec![plain("a"), plain("**")]
        );
    }

    #[test]
    fn inherited_styles_survive_outside_pairs() {
        let italic = Styles {
            italic: true,
            ..Default::default()
        };
        let nodes = scan_bold_markers("x **y**", italic);
        assert_eq!(nodes[0].styles, italic);
        assert!(nodes[1].styles.bold && nodes[1].styles.italic);
    }

    #[test]
    fn builder_inherits_styles_into_links() {
        let mut b = InlineBuilder::new();
        b.start_italic();
        b.start_link("https://example.com");
        b.text("here");
        b.end_link();
        b.end_style();
        let out = b.finish();
        let Inline::Link(link) = &out[0] else {
            panic!("expected link");
        };
        assert_eq!(link.href, "https://example.com");
        let Inline::Text(t) = &link.content[0] else {
            panic!("expected text");
        };
        assert!(t.styles.italic);
    }

    #[test]
    fn code_span_sets_code_style() {
        let mut b = InlineBuilder::new();
        b.code_span("x + y");
        let out = b.finish();
        let Inline::Text(t) = &out[0] else {
            panic!("expected text");
        };
        assert!(t.styles.code);
        assert_eq!(t.text, "x + y");
    }

    #[test]
    fn finish_drops_whitespace_only_nodes() {
        let mut b = InlineBuilder::new();
        b.text("  ");
        b.text("kept");
        assert_eq!(b.finish(), vec![Inline::text("kept")]);
    }
}
