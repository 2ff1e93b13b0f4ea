//! Annotated diff between two markup fragments.
//!
//! # Responsibility
//! - Define the `DiffPrimitive` seam used by amendment resolution.
//! - Ship `WordDiff`, a word-level implementation on top of `similar`.
//!
//! # Invariants
//! - Line annotations of the old fragment survive the diff unchanged, so
//!   diff output stays numbered against the base document.
//! - Deleted content is wrapped in `<del>` or tagged with class `delete`;
//!   inserted content in `<ins>` or class `insert`.
//!
//! # See also
//! - `crate::changes::resolver` for the caller.

mod word;

use crate::html::flat::{flatten, matching_close, Token};
use crate::html::{parse_html, push_merged, to_html, Element, Node};
use crate::lines::{extract_range, LineRange, LineResult};

pub use word::WordDiff;

/// CSS class for deleted block content.
pub const DELETE_CLASS: &str = "delete";
/// CSS class for inserted block content.
pub const INSERT_CLASS: &str = "insert";

/// Markup diff contract.
///
/// Only `diff` is required; the remaining operations interpret the
/// annotated markup that `diff` produces.
pub trait DiffPrimitive {
    /// Annotated diff from `old_html` (usually numbered) to `new_html`.
    fn diff(&self, old_html: &str, new_html: &str) -> LineResult<String>;

    /// Accepts every change: drops deletions, unwraps insertions and removes
    /// line annotations.
    fn diff_to_final_text(&self, diff_html: &str) -> LineResult<String> {
        let doc = parse_html(diff_html)?;
        Ok(to_html(&accept_changes(&doc.children)))
    }

    /// Smallest line range touched by any change, or `None` when the diff
    /// contains no change or no line markers.
    fn detect_affected_line_range(&self, diff_html: &str) -> LineResult<Option<LineRange>> {
        let doc = parse_html(diff_html)?;
        Ok(affected_line_range(&flatten(&doc.children)))
    }

    /// Balanced markup of lines `[from, to)` of a numbered diff.
    fn extract_range(&self, diff_html: &str, from: Option<u32>, to: Option<u32>) -> LineResult<String> {
        let doc = parse_html(diff_html)?;
        Ok(extract_range(&doc, from, to)?.standalone_html())
    }
}

pub(crate) fn is_change_element(element: &Element) -> bool {
    element.tag == "del"
        || element.tag == "ins"
        || element.has_class(DELETE_CLASS)
        || element.has_class(INSERT_CLASS)
}

fn accept_changes(nodes: &[Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(element) if element.tag == "del" || element.has_class(DELETE_CLASS) => {}
            Node::Element(element) if element.tag == "ins" => {
                for child in accept_changes(&element.children) {
                    push_merged(&mut out, child);
                }
            }
            Node::Element(element) => {
                let mut accepted = element.shell();
                accepted.remove_class(INSERT_CLASS);
                accepted.children = accept_changes(&element.children);
                out.push(Node::Element(accepted));
            }
            Node::Text(_) => push_merged(&mut out, node.clone()),
            Node::LineBreak | Node::LineMarker(_) => {}
        }
    }
    out
}

fn affected_line_range(tokens: &[Token]) -> Option<LineRange> {
    let mut first_change = None;
    let mut last_change_end = None;
    let mut index = 0;
    while index < tokens.len() {
        match &tokens[index] {
            Token::Open(element) if is_change_element(element) => {
                let end = matching_close(tokens, index).unwrap_or(tokens.len() - 1);
                first_change.get_or_insert(index);
                last_change_end = Some(end);
                index = end + 1;
            }
            _ => index += 1,
        }
    }
    let (first, last_end) = (first_change?, last_change_end?);

    let marker = |token: &Token| match token {
        Token::Marker(number) => Some(*number),
        _ => None,
    };
    let from = tokens[..first]
        .iter()
        .rev()
        .find_map(marker)
        .or_else(|| tokens[first..].iter().find_map(marker))?;
    let to = tokens[last_end + 1..]
        .iter()
        .find_map(marker)
        .or_else(|| tokens.iter().filter_map(marker).max().map(|last| last + 1))?;
    Some(LineRange::new(from, to.max(from + 1)))
}

#[cfg(test)]
mod tests {
    use super::{DiffPrimitive, WordDiff};
    use crate::lines::{number_html, LineRange, NumberingOptions};

    #[test]
    fn final_text_accepts_all_changes() {
        let diff = WordDiff::new();
        let html = "<p><span class=\"os-line-number line-number-1\" data-line-number=\"1\">&nbsp;</span>\
                    one <del>two</del><ins>2</ins> three</p><p class=\"insert\">new</p><p class=\"delete\">old</p>";
        assert_eq!(
            diff.diff_to_final_text(html).expect("valid"),
            "<p>one 2 three</p><p>new</p>"
        );
    }

    #[test]
    fn affected_range_spans_changed_lines_only() {
        let old = number_html("<p>aaa bbb ccc ddd</p>", &NumberingOptions::new(4, 1)).expect("numbering");
        let diff = WordDiff::new();
        let annotated = diff.diff(&old, "<p>aaa XXX ccc ddd</p>").expect("diff");
        assert_eq!(
            diff.detect_affected_line_range(&annotated).expect("valid"),
            Some(LineRange::new(2, 3))
        );
    }

    #[test]
    fn no_change_means_no_range() {
        let old = number_html("<p>same text</p>", &NumberingOptions::new(80, 1)).expect("numbering");
        let diff = WordDiff::new();
        let annotated = diff.diff(&old, "<p>same text</p>").expect("diff");
        assert_eq!(diff.detect_affected_line_range(&annotated).expect("valid"), None);
    }

    #[test]
    fn change_on_last_line_extends_past_last_marker() {
        let old = number_html("<p>aaa bbb</p>", &NumberingOptions::new(4, 1)).expect("numbering");
        let diff = WordDiff::new();
        let annotated = diff.diff(&old, "<p>aaa bbb ccc</p>").expect("diff");
        assert_eq!(
            diff.detect_affected_line_range(&annotated).expect("valid"),
            Some(LineRange::new(2, 3))
        );
    }
}
