use super::{DiffPrimitive, DELETE_CLASS, INSERT_CLASS};
use crate::html::flat::{build, flatten, Token};
use crate::html::{open_tag, parse_html, to_html, Element, Node};
use crate::lines::LineResult;
use log::debug;
use similar::{capture_diff_slices, Algorithm, DiffTag};

/// Word-level diff on top of `similar`'s Myers implementation.
///
/// Text is compared word by word with whitespace runs collapsed. When a
/// change touches markup structure (an opening or closing tag), the whole
/// fragment falls back to block granularity: old root nodes are tagged
/// `delete`, new root nodes `insert`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordDiff;

impl WordDiff {
    pub fn new() -> Self {
        Self
    }
}

impl DiffPrimitive for WordDiff {
    fn diff(&self, old_html: &str, new_html: &str) -> LineResult<String> {
        let old = parse_html(old_html)?;
        let new = parse_html(new_html)?;
        let (mut old_units, old_trailing) = units(&flatten(&old.children));
        let (new_units, _) = units(&flatten(&new.children));

        let old_keys: Vec<&str> = old_units.iter().map(|unit| unit.key.as_str()).collect();
        let new_keys: Vec<&str> = new_units.iter().map(|unit| unit.key.as_str()).collect();
        let ops = capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys);

        let structural = ops.iter().any(|op| {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            tag != DiffTag::Equal
                && (old_units[old_range].iter().any(Unit::is_tag)
                    || new_units[new_range].iter().any(Unit::is_tag))
        });
        if structural {
            debug!("event=diff module=diff status=structural_fallback");
            return Ok(to_html(&block_diff(&old.children, &new.children)));
        }

        let mut out = Vec::new();
        for op in &ops {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    for unit in &old_units[old_range] {
                        out.extend(unit.leading.iter().cloned());
                        out.extend(unit.body.iter().cloned());
                    }
                }
                DiffTag::Delete => wrap_units(&mut out, &old_units[old_range], "del"),
                DiffTag::Insert => {
                    // An insertion opening a block belongs to the block's first line.
                    if opens_block(&out) {
                        if let Some(next) = old_units.get_mut(old_range.start) {
                            out.append(&mut next.leading);
                        }
                    }
                    wrap_units(&mut out, &new_units[new_range], "ins");
                }
                DiffTag::Replace => {
                    wrap_units(&mut out, &old_units[old_range], "del");
                    wrap_units(&mut out, &new_units[new_range], "ins");
                }
            }
        }
        out.extend(old_trailing);
        Ok(to_html(&build(out)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    Word,
    Space,
    Tag,
}

/// One comparable piece: a word, a whitespace run or a tag.
#[derive(Debug)]
struct Unit {
    kind: UnitKind,
    key: String,
    /// Line annotations right before the unit; never wrapped in del/ins.
    leading: Vec<Token>,
    body: Vec<Token>,
}

impl Unit {
    fn is_tag(&self) -> bool {
        self.kind == UnitKind::Tag
    }
}

fn units(tokens: &[Token]) -> (Vec<Unit>, Vec<Token>) {
    let mut units: Vec<Unit> = Vec::new();
    let mut leading = Vec::new();

    for token in tokens {
        match token {
            Token::Break | Token::Marker(_) => leading.push(token.clone()),
            Token::Open(element) => units.push(Unit {
                kind: UnitKind::Tag,
                key: open_tag(element),
                leading: std::mem::take(&mut leading),
                body: vec![token.clone()],
            }),
            Token::Close(tag) => units.push(Unit {
                kind: UnitKind::Tag,
                key: format!("</{tag}>"),
                leading: std::mem::take(&mut leading),
                body: vec![token.clone()],
            }),
            Token::Text(text) => {
                for piece in split_words(text) {
                    let is_space = piece.chars().all(char::is_whitespace);
                    // A word wrapped mid-word stays one comparable word.
                    if !is_space && !leading.is_empty() {
                        if let Some(last) = units.last_mut().filter(|unit| unit.kind == UnitKind::Word) {
                            last.body.append(&mut leading);
                            last.body.push(Token::Text(piece.to_string()));
                            last.key.push_str(piece);
                            continue;
                        }
                    }
                    units.push(Unit {
                        kind: if is_space { UnitKind::Space } else { UnitKind::Word },
                        key: if is_space { " ".to_string() } else { piece.to_string() },
                        leading: std::mem::take(&mut leading),
                        body: vec![Token::Text(piece.to_string())],
                    });
                }
            }
        }
    }
    (units, leading)
}

/// Splits text into alternating word and whitespace runs.
fn split_words(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (index, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        if in_space.is_some_and(|current| current != space) {
            pieces.push(&text[start..index]);
            start = index;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn opens_block(out: &[Token]) -> bool {
    matches!(out.last(), Some(Token::Open(element)) if element.is_block())
}

fn wrap_units(out: &mut Vec<Token>, units: &[Unit], tag: &str) {
    let mut open = false;
    for unit in units {
        if !unit.leading.is_empty() {
            if open {
                out.push(Token::Close(tag.to_string()));
                open = false;
            }
            out.extend(unit.leading.iter().cloned());
        }
        if !open {
            out.push(Token::Open(Element::new(tag)));
            open = true;
        }
        out.extend(unit.body.iter().cloned());
    }
    if open {
        out.push(Token::Close(tag.to_string()));
    }
}

fn block_diff(old: &[Node], new: &[Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(old.len() + new.len());
    for node in old {
        out.push(mark_node(node, DELETE_CLASS, "del"));
    }
    for node in new.iter().filter(|node| !node.is_whitespace_text()) {
        out.push(mark_node(node, INSERT_CLASS, "ins"));
    }
    out
}

fn mark_node(node: &Node, class: &str, wrapper: &str) -> Node {
    match node {
        Node::Element(element) => {
            let mut marked = element.clone();
            marked.add_class(class);
            Node::Element(marked)
        }
        Node::Text(_) if node.is_whitespace_text() => node.clone(),
        Node::Text(_) => Node::Element(Element::new(wrapper).with_children(vec![node.clone()])),
        Node::LineBreak | Node::LineMarker(_) => node.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{split_words, WordDiff};
    use crate::diff::DiffPrimitive;
    use crate::html::{parse_html, Node};
    use crate::lines::{number_html, NumberingOptions};

    #[test]
    fn splits_words_and_spaces() {
        assert_eq!(split_words("a  bc d"), vec!["a", "  ", "bc", " ", "d"]);
        assert_eq!(split_words(""), Vec::<&str>::new());
    }

    #[test]
    fn marks_replaced_word() {
        let diff = WordDiff::new()
            .diff("<p>one two three</p>", "<p>one 2 three</p>")
            .expect("diff");
        assert_eq!(diff, "<p>one <del>two</del><ins>2</ins> three</p>");
    }

    fn marker_inside_change(nodes: &[Node], inside: bool) -> bool {
        nodes.iter().any(|node| match node {
            Node::LineMarker(_) => inside,
            Node::Element(element) => {
                marker_inside_change(&element.children, inside || element.tag == "del")
            }
            _ => false,
        })
    }

    #[test]
    fn keeps_old_line_markers_outside_deletions() {
        let old = number_html("<p>aaa bbb ccc</p>", &NumberingOptions::new(4, 1)).expect("numbering");
        let diff = WordDiff::new().diff(&old, "<p>aaa ccc</p>").expect("diff");
        let doc = parse_html(&diff).expect("valid");
        assert_eq!(doc.line_numbers(), vec![1, 2, 3]);
        assert!(!marker_inside_change(&doc.children, false));
        assert_eq!(
            WordDiff::new().diff_to_final_text(&diff).expect("valid"),
            "<p>aaa ccc</p>"
        );
    }

    #[test]
    fn insertion_at_block_start_follows_the_line_marker() {
        let old = number_html("<p>one</p><p></p>", &NumberingOptions::new(80, 1)).expect("numbering");
        let diff = WordDiff::new().diff(&old, "<p>one</p><p>filled</p>").expect("diff");
        let doc = parse_html(&diff).expect("valid");
        let second = doc.children[1].as_element().expect("paragraph");
        assert!(matches!(second.children[0], Node::LineMarker(2)));
        assert_eq!(
            WordDiff::new().detect_affected_line_range(&diff).expect("valid"),
            Some(crate::lines::LineRange::new(2, 3))
        );
    }

    #[test]
    fn mid_word_wraps_compare_as_one_word() {
        let old = number_html("<p>abcdefgh</p>", &NumberingOptions::new(4, 1)).expect("numbering");
        let diff = WordDiff::new().diff(&old, "<p>abcdefgh</p>").expect("diff");
        assert!(!diff.contains("<del>"));
        assert!(!diff.contains("<ins>"));
    }

    #[test]
    fn structural_change_falls_back_to_blocks() {
        let diff = WordDiff::new()
            .diff("<p>one</p>", "<p>one</p><p>two</p>")
            .expect("diff");
        assert_eq!(
            diff,
            "<p class=\"delete\">one</p><p class=\"insert\">one</p><p class=\"insert\">two</p>"
        );
        assert_eq!(
            WordDiff::new().diff_to_final_text(&diff).expect("valid"),
            "<p>one</p><p>two</p>"
        );
    }
}
