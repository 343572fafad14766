use blockmark_lib::diff::{
    diff_blocks, diff_blocks_by_structure, diff_whole_document, diff_whole_document_by_paragraph,
    Change,
};
use blockmark_lib::markdown_to_blocks;
use pretty_assertions::assert_eq;

#[test]
fn identical_revisions_have_no_changes() {
    let blocks = markdown_to_blocks("# Title\n\nSome body text.\n\n- a\n- b");
    let result = diff_blocks(&blocks, &blocks);
    assert!(!result.has_changes());
    let result = diff_blocks_by_structure(&blocks, &blocks);
    assert!(!result.has_changes());
}

#[test]
fn edited_sentence_marks_only_the_changed_words() {
    let old = markdown_to_blocks("The quick brown fox jumps over the lazy dog.");
    let new = markdown_to_blocks("The quick red fox leaps over the lazy dog.");
    let result = diff_blocks_by_structure(&old, &new);

    let removed: Vec<String> = result.left[0]
        .content
        .iter()
        .filter(|s| s.change == Some(Change::Removed))
        .map(|s| s.node.plain_text())
        .collect();
    let added: Vec<String> = result.right[0]
        .content
        .iter()
        .filter(|s| s.change == Some(Change::Added))
        .map(|s| s.node.plain_text())
        .collect();
    assert_eq!(removed, vec!["brown", "jumps"]);
    assert_eq!(added, vec!["red", "leaps"]);
}

#[test]
fn appended_block_shows_up_only_on_the_right() {
    let old = markdown_to_blocks("# Title\n\nIntro.");
    let new = markdown_to_blocks("# Title\n\nIntro.\n\nA brand new paragraph.");
    let result = diff_blocks(&old, &new);
    assert_eq!(result.left.len(), 2);
    assert_eq!(result.right.len(), 3);
    assert_eq!(result.right[2].change, Some(Change::Added));
    assert!(result.right[2].content.iter().all(|s| s.change == Some(Change::Added)));
}

#[test]
fn heading_edit_keeps_heading_kind_in_structure_mode() {
    let old = markdown_to_blocks("## Old headline");
    let new = markdown_to_blocks("## New headline");
    let result = diff_blocks_by_structure(&old, &new);
    assert_eq!(result.left[0].kind, old[0].kind);
    assert_eq!(result.right[0].kind, new[0].kind);
    assert!(result.has_changes());
}

#[test]
fn whole_document_mode_collapses_structure() {
    let old = markdown_to_blocks("# A\n\n- x\n- y");
    let new = markdown_to_blocks("# A\n\n- x\n- z");
    let result = diff_whole_document(&old, &new);
    assert_eq!(result.left.len(), 1);
    assert_eq!(result.right.len(), 1);
    assert!(result.has_changes());
}

#[test]
fn paragraph_mode_keeps_unchanged_paragraphs_clean() {
    let old = markdown_to_blocks("alpha one\n\nbeta two\n\ngamma three");
    let new = markdown_to_blocks("alpha one\n\nbeta changed\n\ngamma three");
    let result = diff_whole_document_by_paragraph(&old, &new);
    assert_eq!(result.left.len(), 3);
    assert_eq!(result.right.len(), 3);
    assert!(result.left[0].content.iter().all(|s| s.change.is_none()));
    assert!(result.left[2].content.iter().all(|s| s.change.is_none()));
    assert!(result.left[1].content.iter().any(|s| s.change == Some(Change::Removed)));
    assert!(result.right[1].content.iter().any(|s| s.change == Some(Change::Added)));
}

#[test]
fn code_block_edits_are_ignored_by_structure_mode_but_seen_by_index_mode() {
    let old = markdown_to_blocks("```rust\nlet a = 1;\n```");
    let new = markdown_to_blocks("```rust\nlet a = 2;\n```");
    assert!(!diff_blocks_by_structure(&old, &new).has_changes());
    assert!(diff_blocks(&old, &new).has_changes());
}

#[test]
fn empty_revisions_are_tolerated() {
    let blocks = markdown_to_blocks("solo");
    let result = diff_blocks_by_structure(&blocks, &[]);
    assert_eq!(result.left[0].change, Some(Change::Removed));
    assert!(result.right.is_empty());

    let result = diff_blocks_by_structure(&[], &blocks);
    assert_eq!(result.right[0].change, Some(Change::Added));
    assert!(result.left.is_empty());
}
