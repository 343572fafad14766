//! Structural diffing of two block-tree revisions.
//!
//! Four modes, all built on a word-level Myers diff (`similar`). Pairing is
//! positional: `left[i]` is compared with `right[i]`. A block that merely
//! moved therefore renders as a removal plus an addition, not as a move.
//! That is a known limitation of the revision view, kept deliberately.
//!
//! Diff trees are render-only: they are rebuilt on every comparison and
//! never persisted.

use crate::types::{Block, BlockKind, Inline};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Which side of the comparison a piece belongs to exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Change {
    Added,
    Removed,
}

/// One segment of the word-level edit script.
#[derive(Debug, Clone, PartialEq)]
pub struct WordChange {
    pub value: String,
    pub change: Option<Change>,
}

/// An inline node annotated for side-by-side rendering. `key` is stable for
/// a given input pair (`"{block}-{span}"`), suitable as a render key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffSpan {
    #[serde(flatten)]
    pub node: Inline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Change>,
    pub key: String,
}

/// A block on one side of the comparison. `change` is set when the block
/// exists on this side only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffBlock {
    #[serde(flatten)]
    pub kind: BlockKind,
    pub content: Vec<DiffSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Change>,
}

/// Both annotated sides of a comparison, old revision on the left.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResult {
    pub left: Vec<DiffBlock>,
    pub right: Vec<DiffBlock>,
}

impl DiffResult {
    /// True when any span or block on either side carries an annotation.
    pub fn has_changes(&self) -> bool {
        self.left
            .iter()
            .chain(self.right.iter())
            .any(|block| block.change.is_some() || block.content.iter().any(|s| s.change.is_some()))
    }
}

/// Word-level edit script between two plain strings. Concatenating the
/// non-added values reproduces `old`; the non-removed values reproduce
/// `new`.
pub fn word_diff(old: &str, new: &str) -> Vec<WordChange> {
    TextDiff::from_words(old, new)
        .iter_all_changes()
        .map(|change| WordChange {
            value: change.value().to_string(),
            change: match change.tag() {
                ChangeTag::Equal => None,
                ChangeTag::Delete => Some(Change::Removed),
                ChangeTag::Insert => Some(Change::Added),
            },
        })
        .collect()
}

/// Index-paired diff. Same-kind pairs get word-level inline diffing over
/// their flattened text; kind mismatches and missing counterparts are
/// emitted one-sided with a whole-block flag.
pub fn diff_blocks(left: &[Block], right: &[Block]) -> DiffResult {
    let mut result = DiffResult::default();
    for i in 0..left.len().max(right.len()) {
        match (left.get(i), right.get(i)) {
            (Some(l), Some(r)) if l.kind.same_variant(&r.kind) => {
                let changes = word_diff(&l.plain_text(), &r.plain_text());
                result.left.push(DiffBlock {
                    kind: l.kind.clone(),
                    content: spans_for_side(&changes, Change::Removed, i),
                    change: None,
                });
                result.right.push(DiffBlock {
                    kind: r.kind.clone(),
                    content: spans_for_side(&changes, Change::Added, i),
                    change: None,
                });
            }
            (Some(l), Some(r)) => {
                result.left.push(one_sided_flattened(l, Change::Removed, i));
                result.right.push(one_sided_flattened(r, Change::Added, i));
            }
            (Some(l), None) => result.left.push(one_sided_flattened(l, Change::Removed, i)),
            (None, Some(r)) => result.right.push(one_sided_flattened(r, Change::Added, i)),
            (None, None) => {}
        }
    }
    result
}

/// Whole-document diff: each side flattens to one newline-joined string, a
/// single word diff runs, and each side gets exactly one synthetic paragraph
/// carrying the annotated result. Block-kind distinctions are lost by
/// design; this backs coarse revision previews.
pub fn diff_whole_document(left: &[Block], right: &[Block]) -> DiffResult {
    let changes = word_diff(&flatten_document(left), &flatten_document(right));
    DiffResult {
        left: vec![synthetic_paragraph(
            spans_for_side(&changes, Change::Removed, 0),
        )],
        right: vec![synthetic_paragraph(
            spans_for_side(&changes, Change::Added, 0),
        )],
    }
}

/// Like [`diff_whole_document`], but the single edit script is re-split on
/// the newline boundaries introduced by the flattening, yielding one
/// synthetic paragraph per segment per side.
pub fn diff_whole_document_by_paragraph(left: &[Block], right: &[Block]) -> DiffResult {
    let changes = word_diff(&flatten_document(left), &flatten_document(right));
    DiffResult {
        left: paragraphs_for_side(&changes, Change::Removed),
        right: paragraphs_for_side(&changes, Change::Added),
    }
}

/// Kinds whose inline content is free text and safe to replace with diff
/// spans while preserving the block's own props.
fn is_structure_safe(kind: &BlockKind) -> bool {
    matches!(
        kind,
        BlockKind::Paragraph
            | BlockKind::Heading { .. }
            | BlockKind::Quote
            | BlockKind::BulletListItem
            | BlockKind::NumberedListItem { .. }
    )
}

/// Structure-preserving diff. Each paired block keeps its kind and props;
/// only its inline content is replaced with annotated spans. Code blocks
/// pass through undiffed because their content is not free text. One-sided
/// blocks keep their original inline nodes, each flagged, instead of being
/// collapsed into a synthetic span.
pub fn diff_blocks_by_structure(left: &[Block], right: &[Block]) -> DiffResult {
    let mut result = DiffResult::default();
    for i in 0..left.len().max(right.len()) {
        match (left.get(i), right.get(i)) {
            (Some(l), Some(r)) if l.kind.same_variant(&r.kind) && is_structure_safe(&l.kind) => {
                let changes = word_diff(&l.plain_text(), &r.plain_text());
                result.left.push(DiffBlock {
                    kind: l.kind.clone(),
                    content: spans_for_side(&changes, Change::Removed, i),
                    change: None,
                });
                result.right.push(DiffBlock {
                    kind: r.kind.clone(),
                    content: spans_for_side(&changes, Change::Added, i),
                    change: None,
                });
            }
            (Some(l), Some(r)) if l.kind.same_variant(&r.kind) => {
                // Same kind outside the safe set: passed through unchanged.
                result.left.push(passthrough(l, i));
                result.right.push(passthrough(r, i));
            }
            (Some(l), Some(r)) => {
                result.left.push(one_sided_preserved(l, Change::Removed, i));
                result.right.push(one_sided_preserved(r, Change::Added, i));
            }
            (Some(l), None) => result.left.push(one_sided_preserved(l, Change::Removed, i)),
            (None, Some(r)) => result.right.push(one_sided_preserved(r, Change::Added, i)),
            (None, None) => {}
        }
    }
    result
}

fn flatten_document(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn synthetic_paragraph(content: Vec<DiffSpan>) -> DiffBlock {
    DiffBlock {
        kind: BlockKind::Paragraph,
        content,
        change: None,
    }
}

/// Collects one side's spans from the shared edit script, dropping the
/// other side's exclusive pieces and merging adjacent pieces that share an
/// annotation.
fn spans_for_side(changes: &[WordChange], own: Change, block_index: usize) -> Vec<DiffSpan> {
    let mut pieces: Vec<(Option<Change>, String)> = Vec::new();
    for change in changes {
        let Some(mark) = side_mark(change, own) else {
            continue;
        };
        push_piece(&mut pieces, mark, &change.value);
    }
    into_spans(pieces, block_index)
}

/// One side's spans, split into paragraphs on the newline boundaries of the
/// flattened document. Segments that end up empty are dropped.
fn paragraphs_for_side(changes: &[WordChange], own: Change) -> Vec<DiffBlock> {
    let mut paragraphs: Vec<Vec<(Option<Change>, String)>> = vec![Vec::new()];
    for change in changes {
        let Some(mark) = side_mark(change, own) else {
            continue;
        };
        for (i, segment) in change.value.split('\n').enumerate() {
            if i > 0 {
                paragraphs.push(Vec::new());
            }
            if !segment.is_empty() {
                push_piece(paragraphs.last_mut().unwrap(), mark, segment);
            }
        }
    }
    paragraphs
        .into_iter()
        .filter(|pieces| !pieces.is_empty())
        .enumerate()
        .map(|(i, pieces)| synthetic_paragraph(into_spans(pieces, i)))
        .collect()
}

/// The annotation a piece carries on the given side, or `None` when the
/// piece belongs exclusively to the other side and is skipped.
fn side_mark(change: &WordChange, own: Change) -> Option<Option<Change>> {
    match change.change {
        None => Some(None),
        Some(mark) if mark == own => Some(Some(mark)),
        Some(_) => None,
    }
}

fn push_piece(pieces: &mut Vec<(Option<Change>, String)>, mark: Option<Change>, value: &str) {
    match pieces.last_mut() {
        Some((last_mark, text)) if *last_mark == mark => text.push_str(value),
        _ => pieces.push((mark, value.to_string())),
    }
}

fn into_spans(pieces: Vec<(Option<Change>, String)>, block_index: usize) -> Vec<DiffSpan> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, (change, text))| DiffSpan {
            node: Inline::text(text),
            change,
            key: format!("{block_index}-{i}"),
        })
        .collect()
}

/// A block present on one side only, collapsed to a single flattened span.
fn one_sided_flattened(block: &Block, mark: Change, block_index: usize) -> DiffBlock {
    DiffBlock {
        kind: block.kind.clone(),
        content: vec![DiffSpan {
            node: Inline::text(block.plain_text()),
            change: Some(mark),
            key: format!("{block_index}-0"),
        }],
        change: Some(mark),
    }
}

/// A block present on one side only, keeping its original inline nodes with
/// every span flagged.
fn one_sided_preserved(block: &Block, mark: Change, block_index: usize) -> DiffBlock {
    DiffBlock {
        kind: block.kind.clone(),
        content: block
            .content
            .iter()
            .enumerate()
            .map(|(i, node)| DiffSpan {
                node: node.clone(),
                change: Some(mark),
                key: format!("{block_index}-{i}"),
            })
            .collect(),
        change: Some(mark),
    }
}

/// A block copied through without inline diffing.
fn passthrough(block: &Block, block_index: usize) -> DiffBlock {
    DiffBlock {
        kind: block.kind.clone(),
        content: block
            .content
            .iter()
            .enumerate()
            .map(|(i, node)| DiffSpan {
                node: node.clone(),
                change: None,
                key: format!("{block_index}-{i}"),
            })
            .collect(),
        change: None,
    }
}
