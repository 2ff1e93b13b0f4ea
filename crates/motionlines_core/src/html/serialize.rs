//! Tree to markup serialization.

use super::{Element, Node, LINE_BREAK_CLASS, LINE_NUMBER_CLASS};

/// Serializes nodes to markup.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

/// Opening tag for `element`, attributes included.
pub fn open_tag(element: &Element) -> String {
    let mut out = String::with_capacity(element.tag.len() + 2);
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(value, &mut out);
        out.push('"');
    }
    out.push('>');
    out
}

/// Closing tag for `element`; empty for void elements.
pub fn close_tag(element: &Element) -> String {
    if element.is_void() {
        String::new()
    } else {
        format!("</{}>", element.tag)
    }
}

pub(crate) fn line_break_html() -> String {
    format!("<br class=\"{LINE_BREAK_CLASS}\">")
}

pub(crate) fn line_marker_html(number: u32) -> String {
    format!(
        "<span class=\"{LINE_NUMBER_CLASS} line-number-{number}\" data-line-number=\"{number}\" contenteditable=\"false\">&nbsp;</span>"
    )
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_text(text, out),
        Node::LineBreak => out.push_str(&line_break_html()),
        Node::LineMarker(number) => out.push_str(&line_marker_html(*number)),
        Node::Element(element) => {
            out.push_str(&open_tag(element));
            if element.is_void() {
                return;
            }
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str(&close_tag(element));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::to_html;
    use crate::html::{parse_html, Element, Node};

    #[test]
    fn escapes_text_and_attributes() {
        let nodes = vec![Node::Element(
            Element::new("a")
                .with_attribute("title", "say \"hi\" & go")
                .with_children(vec![Node::Text("1 < 2 & 3".to_string())]),
        )];
        assert_eq!(
            to_html(&nodes),
            "<a title=\"say &quot;hi&quot; &amp; go\">1 &lt; 2 &amp; 3</a>"
        );
    }

    #[test]
    fn markup_survives_parse_and_serialize() {
        let source = "<p>Alpha <em>beta</em><br>gamma</p><ul><li>one</li></ul>";
        let doc = parse_html(source).expect("valid markup");
        assert_eq!(to_html(&doc.children), source);
    }

    #[test]
    fn line_annotations_serialize_to_marker_markup() {
        let html = to_html(&[Node::LineBreak, Node::LineMarker(7)]);
        assert!(html.starts_with("<br class=\"os-line-break\">"));
        assert!(html.contains("data-line-number=\"7\""));
        assert!(html.contains("line-number-7"));
    }
}
