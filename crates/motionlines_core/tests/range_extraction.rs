use motionlines_core::{
    extract_range, insert_line_numbers, parse_html, strip_html, Document, NumberingOptions,
};
use proptest::prelude::*;

fn numbered(html: &str, width: u32) -> Document {
    insert_line_numbers(
        &parse_html(html).expect("valid markup"),
        &NumberingOptions::new(width, 1),
    )
    .expect("numbering succeeds")
}

fn text_of(html: &str) -> String {
    Document::parse(html).expect("balanced markup").text_content()
}

fn paragraphs() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::collection::vec("[a-z]{1,8}", 1..12), 1..4).prop_map(|blocks| {
        blocks
            .into_iter()
            .map(|words| format!("<p>{}</p>", words.join(" ")))
            .collect()
    })
}

proptest! {
    #[test]
    fn adjacent_ranges_reassemble_into_their_union(
        html in paragraphs(),
        width in 3u32..30,
        picks in (any::<prop::sample::Index>(), any::<prop::sample::Index>(), any::<prop::sample::Index>()),
    ) {
        let doc = numbered(&html, width);
        let lines = doc.line_numbers();
        let mut bounds = [
            picks.0.get(&lines),
            picks.1.get(&lines),
            picks.2.get(&lines),
        ];
        bounds.sort_unstable();
        let [a, b, c] = bounds.map(|line| *line);

        let whole = extract_range(&doc, Some(a), Some(c)).expect("lines exist");
        let left = extract_range(&doc, Some(a), Some(b)).expect("lines exist");
        let right = extract_range(&doc, Some(b), Some(c)).expect("lines exist");

        prop_assert_eq!(
            format!("{}{}", text_of(&left.standalone_html()), text_of(&right.standalone_html())),
            text_of(&whole.standalone_html())
        );
    }

    #[test]
    fn three_zones_cover_the_document(
        html in paragraphs(),
        width in 3u32..30,
        pick in any::<prop::sample::Index>(),
    ) {
        let doc = numbered(&html, width);
        let lines = doc.line_numbers();
        let from = *pick.get(&lines);
        let range = extract_range(&doc, Some(from), None).expect("line exists");

        let reassembled = format!(
            "{}{}{}",
            range.previous_standalone_html(),
            range.standalone_html(),
            range.following_standalone_html()
        );
        prop_assert_eq!(text_of(&reassembled), doc.text_content());
        let raw = Document::parse(&format!(
            "{}{}{}",
            range.previous_html, range.html, range.following_html
        ))
        .expect("parses");
        prop_assert_eq!(raw.line_numbers(), lines);
        prop_assert_eq!(raw.text_content(), doc.text_content());
    }
}

#[test]
fn context_tags_make_a_mid_list_range_standalone() {
    let doc = numbered(
        "<ol start=\"3\"><li>first item</li><li>second <em>item</em></li></ol>",
        80,
    );
    let range = extract_range(&doc, Some(2), None).expect("line exists");
    assert!(range.ancestor.is_none());
    assert_eq!(range.inner_context_start, "<ol start=\"3\">");
    assert_eq!(
        strip_html(&range.standalone_html()).expect("valid markup"),
        "<ol start=\"3\"><li>second <em>item</em></li></ol>"
    );
    assert_eq!(
        strip_html(&range.previous_standalone_html()).expect("valid markup"),
        "<ol start=\"3\"><li>first item</li></ol>"
    );
}

#[test]
fn missing_marker_is_reported() {
    let doc = numbered("<p>one</p>", 80);
    assert!(extract_range(&doc, Some(9), None).is_err());
    assert!(extract_range(&doc, Some(1), Some(9)).is_err());
}
