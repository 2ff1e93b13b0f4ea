use super::{LineError, LineRange, LineResult};
use crate::html::{to_html, Document, Node};

const SNIPPET_CHARS: usize = 40;

/// Splits a document into paragraphs.
///
/// Every root block element is one paragraph, except lists: each `<li>` of
/// a root `<ul>`/`<ol>` becomes its own paragraph wrapped in a copy of the
/// list element. Ordered lists keep their numbering through `start`.
///
/// # Errors
/// - `LineError::RootInlineContent` for non-whitespace root text or root
///   inline elements.
pub fn split_paragraphs(doc: &Document) -> LineResult<Vec<Node>> {
    let mut paragraphs = Vec::new();
    for node in &doc.children {
        match node {
            Node::LineBreak | Node::LineMarker(_) => {}
            Node::Text(_) if node.is_whitespace_text() => {}
            Node::Element(element) if element.tag == "ul" || element.tag == "ol" => {
                let ordered = element.tag == "ol";
                let mut number = element
                    .attribute("start")
                    .and_then(|value| value.trim().parse::<i64>().ok())
                    .unwrap_or(1);
                let before = paragraphs.len();
                for item in &element.children {
                    if item.is_whitespace_text() || item.is_line_annotation() {
                        continue;
                    }
                    let mut list = element.shell();
                    if ordered {
                        list.set_attribute("start", number.to_string());
                    }
                    list.children = vec![item.clone()];
                    paragraphs.push(Node::Element(list));
                    number += 1;
                }
                if paragraphs.len() == before {
                    paragraphs.push(node.clone());
                }
            }
            Node::Element(element) if element.is_block() => paragraphs.push(node.clone()),
            other => {
                let html = to_html(std::slice::from_ref(other));
                return Err(LineError::RootInlineContent(
                    html.chars().take(SNIPPET_CHARS).collect(),
                ));
            }
        }
    }
    Ok(paragraphs)
}

/// Lines spanned by `nodes`: first marker up to one past the last marker.
pub fn line_number_range(nodes: &[Node]) -> Option<LineRange> {
    let numbers = Document::new(nodes.to_vec()).line_numbers();
    let first = numbers.iter().min()?;
    let last = numbers.iter().max()?;
    Some(LineRange::new(*first, last + 1))
}
