//! Flat token view of a tree.
//!
//! Positions inside a document are token indices. Splitting, extracting and
//! re-nesting are slice operations followed by [`build`].

use super::serialize::{escape_text, line_break_html, line_marker_html};
use super::{close_tag, is_void_tag, open_tag, push_merged, Element, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Element shell (children always empty).
    Open(Element),
    Close(String),
    Text(String),
    Break,
    Marker(u32),
}

impl Token {
    pub(crate) fn open(element: &Element) -> Self {
        Self::Open(element.shell())
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

pub(crate) fn flatten(nodes: &[Node]) -> Vec<Token> {
    let mut out = Vec::new();
    flatten_into(nodes, &mut out);
    out
}

pub(crate) fn flatten_into(nodes: &[Node], out: &mut Vec<Token>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(Token::Text(text.clone())),
            Node::LineBreak => out.push(Token::Break),
            Node::LineMarker(number) => out.push(Token::Marker(*number)),
            Node::Element(element) => {
                out.push(Token::open(element));
                flatten_into(&element.children, out);
                out.push(Token::Close(element.tag.clone()));
            }
        }
    }
}

/// Rebuilds nodes from tokens.
///
/// Unmatched close tokens are dropped, elements left open are closed at the
/// end, and adjacent text tokens are merged.
pub(crate) fn build(tokens: impl IntoIterator<Item = Token>) -> Vec<Node> {
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    for token in tokens {
        match token {
            Token::Open(element) => stack.push(element),
            Token::Close(tag) => {
                let matches = stack.last().is_some_and(|open| open.tag == tag);
                if !matches {
                    continue;
                }
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut roots, Node::Element(element));
                }
            }
            Token::Text(text) => attach(&mut stack, &mut roots, Node::Text(text)),
            Token::Break => attach(&mut stack, &mut roots, Node::LineBreak),
            Token::Marker(number) => attach(&mut stack, &mut roots, Node::LineMarker(number)),
        }
    }

    while let Some(element) = stack.pop() {
        attach(&mut stack, &mut roots, Node::Element(element));
    }
    roots
}

fn attach(stack: &mut [Element], roots: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => push_merged(&mut parent.children, node),
        None => push_merged(roots, node),
    }
}

/// Serializes a token slice verbatim; the result is balanced only when the
/// slice is.
pub(crate) fn serialize(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Open(element) => out.push_str(&open_tag(element)),
            Token::Close(tag) => {
                if !is_void_tag(tag) {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
            Token::Text(text) => escape_text(text, &mut out),
            Token::Break => out.push_str(&line_break_html()),
            Token::Marker(number) => out.push_str(&line_marker_html(*number)),
        }
    }
    out
}

/// Tracks which elements are open at a given token index.
///
/// The returned values are indices of the `Open` tokens, outermost first.
pub(crate) fn open_stack_at(tokens: &[Token], position: usize) -> Vec<usize> {
    let mut stack = Vec::new();
    for (index, token) in tokens.iter().enumerate().take(position) {
        match token {
            Token::Open(_) => stack.push(index),
            Token::Close(_) => {
                stack.pop();
            }
            _ => {}
        }
    }
    stack
}

pub(crate) fn opening_tags(tokens: &[Token], stack: &[usize]) -> String {
    stack
        .iter()
        .filter_map(|index| match &tokens[*index] {
            Token::Open(element) => Some(open_tag(element)),
            _ => None,
        })
        .collect()
}

pub(crate) fn closing_tags(tokens: &[Token], stack: &[usize]) -> String {
    stack
        .iter()
        .rev()
        .filter_map(|index| match &tokens[*index] {
            Token::Open(element) => Some(close_tag(element)),
            _ => None,
        })
        .collect()
}

/// Index of the `Close` token matching the `Open` token at `open_index`.
pub(crate) fn matching_close(tokens: &[Token], open_index: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open_index) {
        match token {
            Token::Open(_) => depth += 1,
            Token::Close(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}
