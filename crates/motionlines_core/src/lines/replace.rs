use super::range::locate;
use super::LineResult;
use crate::html::flat::{build, flatten, open_stack_at, Token};
use crate::html::{parse_html, push_merged, Document, Node};

/// Replaces lines `[from, to)` of a numbered document with `new_html`.
///
/// Elements split by the range boundaries are joined back with the
/// replacement when the tags line up, so replacing the middle of a paragraph
/// with `<p>...</p>` still yields a single paragraph. The result keeps the
/// markers outside the range; callers renumber or strip it afterwards.
///
/// # Errors
/// - `LineError::MissingLineNumber` when a bound has no marker.
/// - `LineError::Html` when `new_html` cannot be parsed.
pub fn replace_lines(doc: &Document, from: u32, to: Option<u32>, new_html: &str) -> LineResult<Document> {
    let tokens = flatten(&doc.children);
    let (start, end) = locate(&tokens, Some(from), to)?;
    let start_depth = open_stack_at(&tokens, start).len();
    let end_stack = open_stack_at(&tokens, end);

    let previous = build(tokens[..start].iter().cloned());
    let following = build(
        end_stack
            .iter()
            .map(|index| tokens[*index].clone())
            .chain(tokens[end..].iter().cloned())
            .collect::<Vec<Token>>(),
    );
    let replacement = parse_html(new_html)?.children;

    let merged = merge_boundary(previous, replacement, start_depth);
    Ok(Document::new(merge_boundary(
        merged,
        following,
        end_stack.len(),
    )))
}

/// Concatenates two node lists, fusing up to `depth` levels of elements
/// that were split apart at the seam.
fn merge_boundary(mut left: Vec<Node>, right: Vec<Node>, depth: usize) -> Vec<Node> {
    let mut right = right.into_iter();
    if depth > 0 {
        match (left.pop(), right.next()) {
            (Some(Node::Element(mut last)), Some(Node::Element(first))) if last.tag == first.tag => {
                last.children = merge_boundary(last.children, first.children, depth - 1);
                left.push(Node::Element(last));
            }
            (Some(Node::Element(mut last)), Some(text @ Node::Text(_))) if !last.is_void() => {
                last.children = merge_boundary(last.children, vec![text], depth - 1);
                left.push(Node::Element(last));
            }
            (Some(text @ Node::Text(_)), Some(Node::Element(mut first))) if !first.is_void() => {
                first.children = merge_boundary(vec![text], first.children, depth - 1);
                left.push(Node::Element(first));
            }
            (last, first) => {
                left.extend(last);
                if let Some(first) = first {
                    push_merged(&mut left, first);
                }
            }
        }
    }
    for node in right {
        push_merged(&mut left, node);
    }
    left
}

#[cfg(test)]
mod tests {
    use super::replace_lines;
    use crate::html::parse_html;
    use crate::lines::{insert_line_numbers, strip_line_numbers, LineError, NumberingOptions};

    fn replaced(html: &str, width: u32, from: u32, to: Option<u32>, new_html: &str) -> String {
        let doc = parse_html(html).expect("valid markup");
        let numbered =
            insert_line_numbers(&doc, &NumberingOptions::new(width, 1)).expect("numbering");
        let result = replace_lines(&numbered, from, to, new_html).expect("replace succeeds");
        strip_line_numbers(&result).to_html()
    }

    #[test]
    fn replaces_inner_line_and_keeps_single_paragraph() {
        assert_eq!(
            replaced("<p>aaa bbb ccc</p>", 4, 2, Some(3), "<p>XYZ </p>"),
            "<p>aaa XYZ ccc</p>"
        );
    }

    #[test]
    fn accepts_bare_text_replacement() {
        assert_eq!(
            replaced("<p>aaa bbb ccc</p>", 4, 2, Some(3), "new "),
            "<p>aaa new ccc</p>"
        );
    }

    #[test]
    fn replaces_whole_paragraphs() {
        assert_eq!(
            replaced("<p>one</p><p>two</p><p>three</p>", 80, 2, Some(3), "<p>TWO</p>"),
            "<p>one</p><p>TWO</p><p>three</p>"
        );
    }

    #[test]
    fn replaces_until_end_and_deletes_with_empty_text() {
        assert_eq!(
            replaced("<p>one</p><p>two</p>", 80, 2, None, "<p>last</p>"),
            "<p>one</p><p>last</p>"
        );
        assert_eq!(
            replaced("<p>one</p><p>two</p><p>three</p>", 80, 2, Some(3), ""),
            "<p>one</p><p>three</p>"
        );
    }

    #[test]
    fn missing_line_is_an_error() {
        let doc = parse_html("<p>one</p>").expect("valid markup");
        let numbered = insert_line_numbers(&doc, &NumberingOptions::new(80, 1)).expect("numbering");
        assert_eq!(
            replace_lines(&numbered, 4, None, "<p>x</p>"),
            Err(LineError::MissingLineNumber(4))
        );
    }
}
