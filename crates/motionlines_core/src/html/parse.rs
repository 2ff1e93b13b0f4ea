//! Markup to tree conversion on top of the html5gum tokenizer.

use super::{is_void_tag, push_merged, Document, Element, HtmlError, Node};
use super::{LINE_BREAK_CLASS, LINE_NUMBER_CLASS};
use html5gum::{State, Token, Tokenizer};

/// Parses a markup fragment into a [`Document`].
///
/// Stray end tags are ignored and unclosed elements are closed at the end of
/// input. Serialized line breaks and line markers come back as typed nodes.
pub fn parse_html(html: &str) -> Result<Document, HtmlError> {
    let mut tokenizer = Tokenizer::new(html);
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();

    while let Some(token) = tokenizer.next() {
        let token = token.map_err(|_| HtmlError::Parse("tokenizer error".to_string()))?;
        match token {
            Token::StartTag(tag) => {
                let name = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();
                let mut element = Element::new(name.clone());
                for (key, value) in tag.attributes.iter() {
                    element.attributes.push((
                        String::from_utf8_lossy(key).to_ascii_lowercase(),
                        String::from_utf8_lossy(value).into_owned(),
                    ));
                }

                if tag.self_closing || is_void_tag(&name) {
                    attach(&mut stack, &mut roots, element);
                } else {
                    match name.as_str() {
                        "script" | "style" => tokenizer.set_state(State::ScriptData),
                        "textarea" | "title" => tokenizer.set_state(State::RcData),
                        _ => {}
                    }
                    stack.push(element);
                }
            }
            Token::EndTag(tag) => {
                let name = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();
                if let Some(index) = stack.iter().rposition(|element| element.tag == name) {
                    while stack.len() > index {
                        if let Some(element) = stack.pop() {
                            attach(&mut stack, &mut roots, element);
                        }
                    }
                }
            }
            Token::String(text) => {
                let text = String::from_utf8_lossy(&text).into_owned();
                match stack.last_mut() {
                    Some(parent) => push_merged(&mut parent.children, Node::Text(text)),
                    None => push_merged(&mut roots, Node::Text(text)),
                }
            }
            Token::Doctype(_) | Token::Comment(_) | Token::Error(_) => {}
        }
    }

    while let Some(element) = stack.pop() {
        attach(&mut stack, &mut roots, element);
    }

    Ok(Document::new(roots))
}

fn attach(stack: &mut [Element], roots: &mut Vec<Node>, element: Element) {
    let node = into_node(element);
    match stack.last_mut() {
        Some(parent) => push_merged(&mut parent.children, node),
        None => push_merged(roots, node),
    }
}

fn into_node(element: Element) -> Node {
    if element.tag == "br" && element.has_class(LINE_BREAK_CLASS) {
        return Node::LineBreak;
    }
    if element.tag == "span" && element.has_class(LINE_NUMBER_CLASS) {
        if let Some(number) = marker_number(&element) {
            return Node::LineMarker(number);
        }
    }
    Node::Element(element)
}

fn marker_number(element: &Element) -> Option<u32> {
    if let Some(value) = element.attribute("data-line-number") {
        return value.trim().parse().ok();
    }
    element.attribute("class").and_then(|classes| {
        classes
            .split_whitespace()
            .find_map(|class| class.strip_prefix("line-number-"))
            .and_then(|number| number.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::parse_html;
    use crate::html::{Element, Node};

    #[test]
    fn parses_nested_elements_and_text() {
        let doc = parse_html("<p>Hello <strong>bold</strong> world</p>").expect("valid markup");
        assert_eq!(
            doc.children,
            vec![Node::Element(Element::new("p").with_children(vec![
                Node::Text("Hello ".to_string()),
                Node::Element(
                    Element::new("strong").with_children(vec![Node::Text("bold".to_string())])
                ),
                Node::Text(" world".to_string()),
            ]))]
        );
    }

    #[test]
    fn recognizes_serialized_line_annotations() {
        let doc = parse_html(
            "<p><span class=\"os-line-number line-number-4\" data-line-number=\"4\" \
             contenteditable=\"false\">&nbsp;</span>one <br class=\"os-line-break\">\
             <span class=\"os-line-number line-number-5\">&nbsp;</span>two</p>",
        )
        .expect("valid markup");
        let paragraph = doc.children[0].as_element().expect("paragraph element");
        assert_eq!(
            paragraph.children,
            vec![
                Node::LineMarker(4),
                Node::Text("one ".to_string()),
                Node::LineBreak,
                Node::LineMarker(5),
                Node::Text("two".to_string()),
            ]
        );
    }

    #[test]
    fn keeps_hard_breaks_and_ignores_stray_end_tags() {
        let doc = parse_html("<p>a<br>b</em></p>").expect("valid markup");
        let paragraph = doc.children[0].as_element().expect("paragraph element");
        assert_eq!(paragraph.children.len(), 3);
        assert_eq!(
            paragraph.children[1].as_element().map(|el| el.tag.as_str()),
            Some("br")
        );
    }

    #[test]
    fn keeps_root_level_text() {
        let doc = parse_html("loose <em>text</em>").expect("valid markup");
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0], Node::Text("loose ".to_string()));
    }
}
