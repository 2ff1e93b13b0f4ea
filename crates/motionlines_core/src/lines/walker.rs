//! Line marker insertion and removal.
//!
//! # Responsibility
//! - Wrap block content at a column width and annotate every line start.
//! - Remove all annotations again without touching the remaining content.
//!
//! # Invariants
//! - All mutable walk state lives in a per-call `WalkContext`.
//! - A soft break never ends a line before it has consumed a character.
//! - Whitespace-only text between blocks is neither counted nor numbered.
//! - Every non-void block owns at least one line, even without text.

use super::{LineError, LineResult, NumberingOptions};
use crate::html::flat::{build, flatten_into, Token};
use crate::html::{parse_html, push_merged, to_html, Document, Element, Node};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static PADDING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"padding-(?:left|right)\s*:\s*(\d+)").expect("valid padding regex")
});

/// Returns a numbered copy of `doc`.
///
/// Existing line annotations are dropped first, so renumbering an already
/// numbered document starts from scratch.
///
/// # Errors
/// - `LineError::InvalidColumnWidth` when `column_width` is zero.
pub fn insert_line_numbers(doc: &Document, options: &NumberingOptions) -> LineResult<Document> {
    if options.column_width == 0 {
        return Err(LineError::InvalidColumnWidth(options.column_width));
    }

    let mut ctx = WalkContext::new(options);
    walk_children(&mut ctx, &doc.children, options.column_width, true);
    ctx.flush();

    debug!(
        "event=line_numbering module=lines status=ok first_line={} lines={} column_width={}",
        options.first_line,
        ctx.current_line_number - options.first_line,
        options.column_width
    );
    Ok(Document::new(build(ctx.out)))
}

/// Removes every line break and line marker from `doc`.
pub fn strip_line_numbers(doc: &Document) -> Document {
    Document::new(strip_nodes(&doc.children))
}

/// Markup convenience wrapper around [`insert_line_numbers`].
pub fn number_html(html: &str, options: &NumberingOptions) -> LineResult<String> {
    let doc = parse_html(html)?;
    Ok(insert_line_numbers(&doc, options)?.to_html())
}

/// Markup convenience wrapper around [`strip_line_numbers`].
pub fn strip_html(html: &str) -> LineResult<String> {
    let doc = parse_html(html)?;
    Ok(to_html(&strip_nodes(&doc.children)))
}

pub(crate) fn strip_nodes(nodes: &[Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut after_break = false;
    for node in nodes {
        match node {
            Node::LineBreak => after_break = true,
            Node::LineMarker(_) => {}
            Node::Text(text) => {
                let text = match text.strip_prefix('\n') {
                    Some(rest) if after_break => format!(" {rest}"),
                    _ => text.clone(),
                };
                push_merged(&mut out, Node::Text(text));
                after_break = false;
            }
            Node::Element(element) => {
                let mut stripped = element.shell();
                stripped.children = strip_nodes(&element.children);
                out.push(Node::Element(stripped));
                after_break = false;
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakablePoint {
    /// Byte offset into the text not yet emitted.
    Pending(usize),
    /// Byte offset into an emitted text token.
    Emitted { token: usize, offset: usize },
}

struct WalkContext {
    out: Vec<Token>,
    /// Characters of the current text node not yet emitted as a token.
    pending: String,
    inline_offset: u32,
    last_breakable_point: Option<BreakablePoint>,
    chars_after_breakable: u32,
    current_line_number: u32,
    prepend_marker_to_first_text: bool,
    ignore_inserted_text: bool,
}

impl WalkContext {
    fn new(options: &NumberingOptions) -> Self {
        Self {
            out: Vec::new(),
            pending: String::new(),
            inline_offset: 0,
            last_breakable_point: None,
            chars_after_breakable: 0,
            current_line_number: options.first_line,
            prepend_marker_to_first_text: true,
            ignore_inserted_text: options.ignore_inserted_text,
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let index = self.out.len();
        self.out.push(Token::Text(std::mem::take(&mut self.pending)));
        if let Some(BreakablePoint::Pending(offset)) = self.last_breakable_point {
            self.last_breakable_point = Some(BreakablePoint::Emitted {
                token: index,
                offset,
            });
        }
    }

    fn next_line_number(&mut self) -> u32 {
        let number = self.current_line_number;
        self.current_line_number += 1;
        number
    }

    fn start_new_line(&mut self) {
        self.inline_offset = 0;
        self.last_breakable_point = None;
        self.chars_after_breakable = 0;
        self.prepend_marker_to_first_text = true;
    }

    fn emit_first_marker(&mut self) {
        self.flush();
        let number = self.next_line_number();
        self.out.push(Token::Marker(number));
        self.prepend_marker_to_first_text = false;
    }

    fn place_char(&mut self, ch: char, width: u32) {
        if self.prepend_marker_to_first_text {
            self.emit_first_marker();
        }

        // Whitespace may hang past the line end; the break lands after it.
        let hangs = ch == ' ' || ch == '\n';
        if !hangs && self.inline_offset >= width {
            match self.last_breakable_point.take() {
                Some(point) => self.break_at(point),
                None => self.break_here(),
            }
        }

        self.pending.push(ch);
        self.inline_offset += 1;
        self.chars_after_breakable += 1;
        if is_breakable(ch) {
            self.last_breakable_point = Some(BreakablePoint::Pending(self.pending.len()));
            self.chars_after_breakable = 0;
        }
    }

    /// Breaks at a recorded breakable point; the characters consumed since
    /// then move to the new line.
    fn break_at(&mut self, point: BreakablePoint) {
        match point {
            BreakablePoint::Pending(offset) => {
                let tail = self.pending.split_off(offset);
                self.flush();
                let number = self.next_line_number();
                self.out.push(Token::Break);
                self.out.push(Token::Marker(number));
                self.pending = tail;
            }
            BreakablePoint::Emitted { token, offset } => {
                let tail = match self.out.get_mut(token) {
                    Some(Token::Text(text)) if offset < text.len() => Some(text.split_off(offset)),
                    _ => None,
                };
                let mut at = token + 1;
                match tail {
                    Some(tail) => self.out.insert(at, Token::Text(tail)),
                    None => {
                        // Leave inline elements that end right at the break.
                        while matches!(self.out.get(at), Some(Token::Close(_))) {
                            at += 1;
                        }
                    }
                }
                let number = self.next_line_number();
                self.out.splice(at..at, [Token::Break, Token::Marker(number)]);
            }
        }
        self.inline_offset = self.chars_after_breakable;
        self.last_breakable_point = None;
    }

    /// Breaks right before the next character, hoisting the break out of
    /// inline elements that have not received content yet.
    fn break_here(&mut self) {
        self.flush();
        let mut at = self.out.len();
        while at > 0 && matches!(&self.out[at - 1], Token::Open(element) if !element.is_block()) {
            at -= 1;
        }
        let number = self.next_line_number();
        self.out.splice(at..at, [Token::Break, Token::Marker(number)]);
        self.inline_offset = 0;
        self.last_breakable_point = None;
        self.chars_after_breakable = 0;
    }

    fn is_ignored(&self, element: &Element) -> bool {
        self.ignore_inserted_text && (element.tag == "ins" || element.has_class("insert"))
    }
}

fn walk_children(ctx: &mut WalkContext, nodes: &[Node], width: u32, at_root: bool) {
    for (index, node) in nodes.iter().enumerate() {
        match node {
            Node::LineBreak | Node::LineMarker(_) => {}
            Node::Text(text) => {
                if node.is_whitespace_text() && is_between_blocks(nodes, index, at_root) {
                    ctx.flush();
                    ctx.out.push(Token::Text(text.clone()));
                    continue;
                }
                for ch in text.chars() {
                    ctx.place_char(ch, width);
                }
                ctx.flush();
            }
            Node::Element(element) => walk_element(ctx, element, width),
        }
    }
}

fn walk_element(ctx: &mut WalkContext, element: &Element, width: u32) {
    ctx.flush();

    if element.tag == "br" {
        ctx.out.push(Token::open(element));
        ctx.out.push(Token::Close(element.tag.clone()));
        ctx.start_new_line();
        return;
    }

    if ctx.is_ignored(element) {
        if ctx.inline_offset == 0 && ctx.prepend_marker_to_first_text {
            ctx.emit_first_marker();
        }
        let content = strip_nodes(std::slice::from_ref(&Node::Element(element.clone())));
        flatten_into(&content, &mut ctx.out);
        return;
    }

    if element.is_block() {
        let inner_width = block_width(element, width);
        let open_at = ctx.out.len();
        let line_before = ctx.current_line_number;
        ctx.out.push(Token::open(element));
        ctx.start_new_line();
        walk_children(ctx, &element.children, inner_width, false);
        ctx.flush();
        if ctx.current_line_number == line_before && !element.is_void() {
            // Blocks without text (`<p></p>`, `<p><img></p>`) still own a line.
            let number = ctx.next_line_number();
            ctx.out.insert(open_at + 1, Token::Marker(number));
        }
        ctx.out.push(Token::Close(element.tag.clone()));
        ctx.start_new_line();
        return;
    }

    let first_word = first_word_length(&element.children);
    if first_word > 0 && ctx.inline_offset > 0 && ctx.inline_offset + first_word > width {
        ctx.break_here();
    }
    ctx.out.push(Token::open(element));
    walk_children(ctx, &element.children, width, false);
    ctx.flush();
    ctx.out.push(Token::Close(element.tag.clone()));
}

fn is_breakable(ch: char) -> bool {
    matches!(ch, ' ' | '-' | '\n')
}

fn is_between_blocks(nodes: &[Node], index: usize, at_root: bool) -> bool {
    let previous = nodes[..index]
        .iter()
        .rev()
        .find(|node| !node.is_line_annotation());
    let next = nodes[index + 1..]
        .iter()
        .find(|node| !node.is_line_annotation());

    let previous_ok = previous.map_or(true, Node::is_block);
    let next_ok = next.map_or(true, Node::is_block);
    let touches_block = previous.is_some_and(Node::is_block) || next.is_some_and(Node::is_block);
    previous_ok && next_ok && (touches_block || at_root)
}

/// Characters before the first breakable point of an inline run.
fn first_word_length(nodes: &[Node]) -> u32 {
    fn walk(nodes: &[Node], length: &mut u32) -> bool {
        for node in nodes {
            match node {
                Node::Text(text) => {
                    for ch in text.chars() {
                        if is_breakable(ch) {
                            return true;
                        }
                        *length += 1;
                    }
                }
                Node::Element(element) => {
                    if element.is_block() || element.tag == "br" {
                        return true;
                    }
                    if walk(&element.children, length) {
                        return true;
                    }
                }
                Node::LineBreak | Node::LineMarker(_) => {}
            }
        }
        false
    }

    let mut length = 0;
    walk(nodes, &mut length);
    length
}

fn block_width(element: &Element, width: u32) -> u32 {
    let reduced = match element.tag.as_str() {
        "li" => width.saturating_sub(5),
        "blockquote" => width.saturating_sub(20),
        "p" | "div" => width.saturating_sub(padding_reduction(element)),
        "h1" => scale_up(width, 66),
        "h2" => scale_up(width, 75),
        "h3" => scale_up(width, 85),
        _ => width,
    };
    reduced.max(1)
}

fn padding_reduction(element: &Element) -> u32 {
    let Some(style) = element.attribute("style") else {
        return 0;
    };
    let padding: u32 = PADDING_RE
        .captures_iter(style)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .sum();
    (padding + 4) / 5
}

fn scale_up(width: u32, percent: u32) -> u32 {
    (width * percent + 99) / 100
}
