//! Line range extraction.
//!
//! A range `[from, to)` starts right before the marker of `from` and ends
//! right before the soft break that precedes the marker of `to`. When a
//! marker opens a block, the boundary moves in front of the block's opening
//! tags so the block travels with its first line.

use super::{LineError, LineResult};
use crate::html::flat::{
    build, closing_tags, flatten, matching_close, open_stack_at, opening_tags, serialize, Token,
};
use crate::html::{Document, Element, Node};

/// A `[from, to)` slice of a numbered document plus everything needed to
/// render it standalone or to glue it back between its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedRange {
    /// Markup strictly inside the range; may be unbalanced at its edges.
    pub html: String,
    /// Lowest element enclosing both range boundaries.
    pub ancestor: Option<Element>,
    /// Opening tags from the root down to `ancestor`, inclusive.
    pub outer_context_start: String,
    /// Closing tags matching `outer_context_start`.
    pub outer_context_end: String,
    /// Opening tags between `ancestor` and the range start.
    pub inner_context_start: String,
    /// Closing tags between the range end and `ancestor`.
    pub inner_context_end: String,
    pub previous_html: String,
    /// Closes everything still open at the end of `previous_html`.
    pub previous_html_end_snippet: String,
    /// Reopens everything open at the start of `following_html`.
    pub following_html_start_snippet: String,
    pub following_html: String,
}

impl ExtractedRange {
    /// Balanced markup for the selected lines alone.
    pub fn standalone_html(&self) -> String {
        let mut out = String::with_capacity(
            self.html.len() + self.outer_context_start.len() + self.inner_context_start.len(),
        );
        out.push_str(&self.outer_context_start);
        out.push_str(&self.inner_context_start);
        out.push_str(&self.html);
        out.push_str(&self.inner_context_end);
        out.push_str(&self.outer_context_end);
        out
    }

    /// Balanced markup for everything before the range.
    pub fn previous_standalone_html(&self) -> String {
        format!("{}{}", self.previous_html, self.previous_html_end_snippet)
    }

    /// Balanced markup for everything from the range end on.
    pub fn following_standalone_html(&self) -> String {
        format!(
            "{}{}",
            self.following_html_start_snippet, self.following_html
        )
    }
}

/// Extracts lines `[from, to)` from a numbered document.
///
/// `None` bounds mean "from the start" and "to the end". A range whose end
/// lies before its start collapses to an empty selection.
///
/// # Errors
/// - `LineError::MissingLineNumber` when a bound has no marker in `doc`.
pub fn extract_range(doc: &Document, from: Option<u32>, to: Option<u32>) -> LineResult<ExtractedRange> {
    let tokens = flatten(&doc.children);
    let (start, end) = locate(&tokens, from, to)?;

    let start_stack = open_stack_at(&tokens, start);
    let end_stack = open_stack_at(&tokens, end);
    let shared = start_stack
        .iter()
        .zip(end_stack.iter())
        .take_while(|(left, right)| left == right)
        .count();

    let ancestor = shared
        .checked_sub(1)
        .and_then(|depth| rebuild_element(&tokens, start_stack[depth]));

    Ok(ExtractedRange {
        html: serialize(&tokens[start..end]),
        ancestor,
        outer_context_start: opening_tags(&tokens, &start_stack[..shared]),
        outer_context_end: closing_tags(&tokens, &start_stack[..shared]),
        inner_context_start: opening_tags(&tokens, &start_stack[shared..]),
        inner_context_end: closing_tags(&tokens, &end_stack[shared..]),
        previous_html: serialize(&tokens[..start]),
        previous_html_end_snippet: closing_tags(&tokens, &start_stack),
        following_html_start_snippet: opening_tags(&tokens, &end_stack),
        following_html: serialize(&tokens[end..]),
    })
}

/// Token positions of the range boundaries, `start <= end`.
pub(crate) fn locate(tokens: &[Token], from: Option<u32>, to: Option<u32>) -> LineResult<(usize, usize)> {
    let start = match from {
        None => 0,
        Some(line) => before_opening_tags(tokens, find_marker(tokens, line)?),
    };
    let end = match to {
        None => tokens.len(),
        Some(line) => {
            let marker = find_marker(tokens, line)?;
            match marker.checked_sub(1).map(|index| &tokens[index]) {
                Some(Token::Break) => marker - 1,
                _ => before_opening_tags(tokens, marker),
            }
        }
    };
    Ok((start, end.max(start)))
}

fn find_marker(tokens: &[Token], line: u32) -> LineResult<usize> {
    tokens
        .iter()
        .position(|token| matches!(token, Token::Marker(number) if *number == line))
        .ok_or(LineError::MissingLineNumber(line))
}

fn before_opening_tags(tokens: &[Token], mut position: usize) -> usize {
    while position > 0 && tokens[position - 1].is_open() {
        position -= 1;
    }
    position
}

fn rebuild_element(tokens: &[Token], open_index: usize) -> Option<Element> {
    let close_index = matching_close(tokens, open_index)?;
    match build(tokens[open_index..=close_index].iter().cloned()).pop() {
        Some(Node::Element(element)) => Some(element),
        _ => None,
    }
}
