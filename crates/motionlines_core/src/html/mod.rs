//! Rich-text tree model shared by every line-numbering algorithm.
//!
//! # Responsibility
//! - Define the owned `Node` tree (`Text`, `Element`, line break, line marker).
//! - Bridge markup strings to trees (`parse_html`) and back (`to_html`).
//! - Provide the flat token stream used for position-based algorithms.
//!
//! # Invariants
//! - Line breaks and line markers are typed nodes, never plain elements.
//! - Parsed trees never contain two adjacent text nodes or empty text.
//!
//! # See also
//! - `crate::lines` for the walker and range extraction built on top.

pub(crate) mod flat;
mod parse;
mod serialize;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use parse::parse_html;
pub use serialize::{close_tag, open_tag, to_html};

/// CSS class carried by serialized line markers.
pub const LINE_NUMBER_CLASS: &str = "os-line-number";
/// CSS class carried by serialized soft line breaks.
pub const LINE_BREAK_CLASS: &str = "os-line-break";

const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Returns whether `tag` starts a new block (and therefore a new line).
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag)
}

/// Returns whether `tag` never has children or a closing tag.
pub fn is_void_tag(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Markup parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    /// The tokenizer rejected the input.
    Parse(String),
    /// Input bytes were not valid UTF-8.
    InvalidUtf8,
}

impl Display for HtmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "markup parse error: {message}"),
            Self::InvalidUtf8 => write!(f, "markup is not valid UTF-8"),
        }
    }
}

impl Error for HtmlError {}

/// One node of a rich-text tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Decoded character data.
    Text(String),
    /// Any element, block or inline.
    Element(Element),
    /// Soft wrap point inserted by line numbering.
    LineBreak,
    /// Start of a numbered line.
    LineMarker(u32),
}

impl Node {
    /// Returns the element when this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns whether this node is a block-level element.
    pub fn is_block(&self) -> bool {
        self.as_element().is_some_and(Element::is_block)
    }

    /// Returns whether this node is text made of whitespace only.
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.chars().all(char::is_whitespace))
    }

    /// Returns whether this node is a line break or a line marker.
    pub fn is_line_annotation(&self) -> bool {
        matches!(self, Self::LineBreak | Self::LineMarker(_))
    }
}

/// Element node with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attribute pairs in source order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder helper used by tests and paragraph splitting.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Builder helper used by tests and paragraph splitting.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Returns a copy without children.
    pub fn shell(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|item| item == class))
    }

    /// Adds `class` to the class list unless present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let merged = match self.attribute("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute("class", merged);
    }

    /// Removes `class` and drops the attribute when it becomes empty.
    pub fn remove_class(&mut self, class: &str) {
        let Some(existing) = self.attribute("class") else {
            return;
        };
        let remaining = existing
            .split_whitespace()
            .filter(|item| *item != class)
            .collect::<Vec<_>>()
            .join(" ");
        if remaining.is_empty() {
            self.attributes.retain(|(key, _)| key != "class");
        } else {
            self.set_attribute("class", remaining);
        }
    }

    pub fn is_block(&self) -> bool {
        is_block_tag(&self.tag)
    }

    pub fn is_void(&self) -> bool {
        is_void_tag(&self.tag)
    }
}

/// Parsed fragment: the ordered root-level nodes of a markup string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Parses markup into a document.
    pub fn parse(html: &str) -> Result<Self, HtmlError> {
        parse_html(html)
    }

    /// Serializes the document back to markup.
    pub fn to_html(&self) -> String {
        to_html(&self.children)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenated character data, line annotations ignored.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Line numbers of every marker in document order.
    pub fn line_numbers(&self) -> Vec<u32> {
        let mut out = Vec::new();
        collect_line_numbers(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
            Node::LineBreak | Node::LineMarker(_) => {}
        }
    }
}

fn collect_line_numbers(nodes: &[Node], out: &mut Vec<u32>) {
    for node in nodes {
        match node {
            Node::LineMarker(number) => out.push(*number),
            Node::Element(element) => collect_line_numbers(&element.children, out),
            Node::Text(_) | Node::LineBreak => {}
        }
    }
}

/// Appends `node`, merging it into a trailing text node when both are text.
pub(crate) fn push_merged(nodes: &mut Vec<Node>, node: Node) {
    if let Node::Text(text) = &node {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(existing)) = nodes.last_mut() {
            existing.push_str(text);
            return;
        }
    }
    nodes.push(node);
}
