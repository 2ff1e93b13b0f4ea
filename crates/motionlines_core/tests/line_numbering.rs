use motionlines_core::{
    insert_line_numbers, number_html, parse_html, strip_html, strip_line_numbers, Document,
    LineError, NumberingOptions,
};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(-[a-z]{1,6})?"
}

fn inline_run() -> impl Strategy<Value = String> {
    prop::collection::vec((word(), any::<bool>()), 1..10).prop_map(|words| {
        words
            .into_iter()
            .map(|(word, strong)| {
                if strong {
                    format!("<strong>{word}</strong>")
                } else {
                    word
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn block() -> impl Strategy<Value = String> {
    prop_oneof![
        inline_run().prop_map(|text| format!("<p>{text}</p>")),
        prop::collection::vec(inline_run(), 1..4).prop_map(|items| {
            let items: String = items
                .into_iter()
                .map(|item| format!("<li>{item}</li>"))
                .collect();
            format!("<ul>{items}</ul>")
        }),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(block(), 1..5).prop_map(|blocks| blocks.concat())
}

proptest! {
    #[test]
    fn stripping_restores_the_original_tree(html in document(), width in 1u32..60) {
        let doc = parse_html(&html).expect("generated markup parses");
        let numbered = insert_line_numbers(&doc, &NumberingOptions::new(width, 1))
            .expect("numbering succeeds");
        prop_assert_eq!(strip_line_numbers(&numbered), doc);
    }

    #[test]
    fn numbering_is_contiguous_from_first_line(
        html in document(),
        width in 1u32..60,
        first_line in 1u32..500,
    ) {
        let doc = parse_html(&html).expect("generated markup parses");
        let numbered = insert_line_numbers(&doc, &NumberingOptions::new(width, first_line))
            .expect("numbering succeeds");
        let lines = numbered.line_numbers();
        prop_assert!(!lines.is_empty());
        let expected: Vec<u32> = (first_line..first_line + lines.len() as u32).collect();
        prop_assert_eq!(lines, expected);
    }

    #[test]
    fn markup_survives_a_serialize_parse_cycle(html in document(), width in 1u32..60) {
        let numbered = number_html(&html, &NumberingOptions::new(width, 1))
            .expect("numbering succeeds");
        let reparsed = Document::parse(&numbered).expect("numbered markup parses");
        let original = parse_html(&html).expect("parses");
        prop_assert_eq!(reparsed.text_content(), original.text_content());
        prop_assert_eq!(strip_html(&numbered).expect("valid markup"), original.to_html());
    }
}

#[test]
fn short_paragraph_wraps_at_spaces_near_the_column_width() {
    let numbered = number_html(
        "<p>This is a short test paragraph used for wrapping.</p>",
        &NumberingOptions::new(20, 1),
    )
    .expect("numbering succeeds");
    let doc = Document::parse(&numbered).expect("numbered markup parses");
    assert_eq!(doc.line_numbers(), vec![1, 2, 3]);

    assert!(numbered.contains(
        "<span class=\"os-line-number line-number-1\" data-line-number=\"1\" contenteditable=\"false\">&nbsp;</span>"
    ));
    assert_eq!(numbered.matches("<br class=\"os-line-break\">").count(), 2);
    assert_eq!(
        strip_html(&numbered).expect("valid markup"),
        "<p>This is a short test paragraph used for wrapping.</p>"
    );
}

#[test]
fn hyphenated_words_break_after_the_hyphen() {
    let numbered = number_html("<p>well-known fact</p>", &NumberingOptions::new(7, 1))
        .expect("numbering succeeds");
    let doc = Document::parse(&numbered).expect("numbered markup parses");
    assert_eq!(doc.line_numbers(), vec![1, 2, 3]);
    assert!(numbered.contains("well-<br class=\"os-line-break\">"));
    assert_eq!(strip_html(&numbered).expect("valid markup"), "<p>well-known fact</p>");
}

#[test]
fn ignoring_insertions_keeps_the_base_numbering() {
    let base = NumberingOptions::new(4, 1);
    let original = Document::parse(&number_html("<p>aaa bbb ccc</p>", &base).expect("numbering"))
        .expect("parses");
    let diff = "<p>aaa <ins>XXXX YYYY </ins>bbb ccc</p>";

    let counted = Document::parse(&number_html(diff, &base).expect("numbering")).expect("parses");
    let ignored = Document::parse(
        &number_html(diff, &base.ignoring_inserted_text()).expect("numbering"),
    )
    .expect("parses");

    assert!(counted.line_numbers().len() > original.line_numbers().len());
    assert_eq!(ignored.line_numbers(), original.line_numbers());
}

#[test]
fn headings_wrap_narrower_than_paragraphs() {
    let text = "alpha beta gamma delta epsilon zeta";
    let options = NumberingOptions::new(20, 1);
    let paragraph = Document::parse(&number_html(&format!("<p>{text}</p>"), &options).expect("numbering"))
        .expect("parses");
    let heading = Document::parse(&number_html(&format!("<h1>{text}</h1>"), &options).expect("numbering"))
        .expect("parses");
    assert!(heading.line_numbers().len() > paragraph.line_numbers().len());
}

#[test]
fn zero_width_is_rejected() {
    assert_eq!(
        number_html("<p>x</p>", &NumberingOptions::new(0, 1)),
        Err(LineError::InvalidColumnWidth(0))
    );
}
