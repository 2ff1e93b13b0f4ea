//! Amendment paragraphs to line-ranged diffs.
//!
//! # Responsibility
//! - Number the lead motion once and split it into paragraphs.
//! - Apply the amendment's replacement text plus accepted recommendations on
//!   the amendment, and diff the result against the base paragraph.
//! - Cut the diff into pre/changed/post zones by affected line range.
//!
//! # Invariants
//! - Line numbers always refer to the base document, never the amendment.
//! - Recommendations are applied lowest line first; their markers are
//!   located once and never recomputed between replacements.
//! - A paragraph index past the end of the base, or a paragraph without a
//!   line of its own, yields `Inconsistent`.

use crate::diff::DiffPrimitive;
use crate::html::{parse_html, to_html, Document, Node};
use crate::lines::{
    insert_line_numbers, line_number_range, replace_lines, split_paragraphs, strip_line_numbers,
    LineError, LineRange, LineResult, NumberingOptions,
};
use crate::model::amendment::Amendment;
use crate::model::recommendation::ChangeRecommendation;
use log::warn;
use serde::Serialize;

/// Inline marker rendered in place of an inconsistent paragraph.
pub const INCONSISTENT_DATA_MESSAGE: &str = "Inconsistent data.";

/// The changed lines of one amendment paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLinesInParagraph {
    pub paragraph_no: usize,
    /// Base paragraph lines, `[from, to)`.
    pub paragraph_line_from: u32,
    pub paragraph_line_to: u32,
    /// Lines actually touched, `[from, to)`.
    pub diff_line_from: u32,
    pub diff_line_to: u32,
    /// Untouched paragraph lines before the change.
    pub text_pre: String,
    /// Annotated diff of the touched lines.
    pub text: String,
    /// Untouched paragraph lines after the change.
    pub text_post: String,
}

impl DiffLinesInParagraph {
    pub fn paragraph_range(&self) -> LineRange {
        LineRange::new(self.paragraph_line_from, self.paragraph_line_to)
    }

    pub fn diff_range(&self) -> LineRange {
        LineRange::new(self.diff_line_from, self.diff_line_to)
    }
}

/// Outcome for one paragraph of the base document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParagraphDiff {
    Unchanged,
    Changed(DiffLinesInParagraph),
    /// The amendment addresses a paragraph the base no longer has.
    Inconsistent { paragraph_no: usize },
}

impl ParagraphDiff {
    pub fn as_changed(&self) -> Option<&DiffLinesInParagraph> {
        match self {
            Self::Changed(diff) => Some(diff),
            _ => None,
        }
    }
}

/// Resolves `amendment` against the numbered `base` text.
///
/// Returns one entry per base paragraph, followed by one `Inconsistent`
/// entry per amended paragraph index the base does not have.
/// `recommendations` are the recommendations on the amendment that are
/// already filtered for the final view.
///
/// # Errors
/// - Structural `LineError`s from numbering, splitting or diffing.
pub fn resolve_amendment<D: DiffPrimitive + ?Sized>(
    amendment: &Amendment,
    base: &Document,
    options: &NumberingOptions,
    recommendations: &[ChangeRecommendation],
    differ: &D,
) -> LineResult<Vec<ParagraphDiff>> {
    let numbered = insert_line_numbers(base, options)?;
    let paragraphs = split_paragraphs(&numbered)?;

    let mut out = Vec::with_capacity(paragraphs.len());
    for (paragraph_no, paragraph) in paragraphs.iter().enumerate() {
        let entry = match amendment.paragraphs.get(&paragraph_no) {
            None => ParagraphDiff::Unchanged,
            Some(new_text) => resolve_paragraph(
                paragraph_no,
                paragraph,
                new_text,
                recommendations,
                options,
                differ,
            )?,
        };
        out.push(entry);
    }

    for paragraph_no in amendment
        .paragraphs
        .keys()
        .filter(|index| **index >= paragraphs.len())
    {
        warn!(
            "event=amendment_paragraph module=changes status=inconsistent amendment_id={} paragraph={} paragraphs={}",
            amendment.id,
            paragraph_no,
            paragraphs.len()
        );
        out.push(ParagraphDiff::Inconsistent {
            paragraph_no: *paragraph_no,
        });
    }
    Ok(out)
}

fn resolve_paragraph<D: DiffPrimitive + ?Sized>(
    paragraph_no: usize,
    paragraph: &Node,
    new_text: &str,
    recommendations: &[ChangeRecommendation],
    options: &NumberingOptions,
    differ: &D,
) -> LineResult<ParagraphDiff> {
    let Some(range) = line_number_range(std::slice::from_ref(paragraph)) else {
        // Only void blocks such as `<hr>` own no line; there is nothing to anchor to.
        warn!(
            "event=amendment_paragraph module=changes status=inconsistent paragraph={paragraph_no} reason=no_lines"
        );
        return Ok(ParagraphDiff::Inconsistent { paragraph_no });
    };

    let new_html = apply_recommendations(new_text, range, recommendations, options)?;
    let base_html = to_html(std::slice::from_ref(paragraph));
    let diff = differ.diff(&base_html, &new_html)?;
    let Some(affected) = differ.detect_affected_line_range(&diff)? else {
        return Ok(ParagraphDiff::Unchanged);
    };

    let to = affected.to.min(range.to);
    let text_pre = if affected.from > range.from {
        differ.extract_range(&diff, Some(range.from), Some(affected.from))?
    } else {
        String::new()
    };
    let text = differ.extract_range(&diff, Some(affected.from), (to < range.to).then_some(to))?;
    let text_post = if to < range.to {
        differ.extract_range(&diff, Some(to), None)?
    } else {
        String::new()
    };

    Ok(ParagraphDiff::Changed(DiffLinesInParagraph {
        paragraph_no,
        paragraph_line_from: range.from,
        paragraph_line_to: range.to,
        diff_line_from: affected.from,
        diff_line_to: to,
        text_pre,
        text,
        text_post,
    }))
}

/// Applies recommendations on the amendment to its paragraph text.
///
/// The amendment text is numbered in place starting at the base
/// paragraph's first line, which is how recommendation lines address it.
fn apply_recommendations(
    new_text: &str,
    range: LineRange,
    recommendations: &[ChangeRecommendation],
    options: &NumberingOptions,
) -> LineResult<String> {
    let mut applicable: Vec<&ChangeRecommendation> = recommendations
        .iter()
        .filter(|recommendation| range.contains(recommendation.line_from))
        .collect();
    if applicable.is_empty() {
        return Ok(new_text.to_string());
    }
    applicable.sort_by_key(|recommendation| (recommendation.line_from, recommendation.line_to));

    let amended = parse_html(new_text)?;
    let mut working = insert_line_numbers(&amended, &options.starting_at(range.from))?;
    let present = working.line_numbers();
    for recommendation in applicable {
        let to = present
            .contains(&recommendation.line_to)
            .then_some(recommendation.line_to);
        match replace_lines(&working, recommendation.line_from, to, &recommendation.text) {
            Ok(replaced) => working = replaced,
            Err(LineError::MissingLineNumber(line)) => {
                warn!(
                    "event=amendment_recommendation module=changes status=skipped recommendation_id={} missing_line={line}",
                    recommendation.id
                );
            }
            Err(err) => return Err(err),
        }
    }
    Ok(strip_line_numbers(&working).to_html())
}
