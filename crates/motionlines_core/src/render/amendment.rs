use super::MotionRenderer;
use crate::changes::resolver::INCONSISTENT_DATA_MESSAGE;
use crate::changes::{resolve_amendment, ChangeResult, LineChange, ParagraphDiff, RecommendationChange};
use crate::diff::DiffPrimitive;
use crate::html::parse_html;
use crate::lines::strip_html;
use crate::model::motion::Motion;
use crate::model::snapshot::AmendmentSnapshot;
use serde::Serialize;

/// CSS class of the inline marker shown for inconsistent paragraphs.
pub const AMENDMENT_ERROR_CLASS: &str = "amendment-error";

/// Rendered view of one amended paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmendmentParagraphView {
    pub paragraph_no: usize,
    /// `pre + diff + post` markup, or the inline error marker.
    pub html: String,
    pub inconsistent: bool,
}

impl<D: DiffPrimitive> MotionRenderer<D> {
    /// Renders the changed paragraphs of one amendment against `motion`.
    ///
    /// Untouched paragraphs are omitted. Paragraphs the motion no longer has
    /// render as an inline "Inconsistent data." marker instead of failing
    /// the whole amendment.
    pub fn render_amendment(
        &self,
        motion: &Motion,
        amendment: &AmendmentSnapshot,
        line_numbers: bool,
    ) -> ChangeResult<Vec<AmendmentParagraphView>> {
        let base = parse_html(&motion.text)?;
        let accepted: Vec<_> = amendment
            .recommendations
            .iter()
            .filter(|recommendation| RecommendationChange::from(*recommendation).show_in_final_view())
            .cloned()
            .collect();
        let paragraphs = resolve_amendment(
            &amendment.amendment,
            &base,
            &self.numbering(motion),
            &accepted,
            self.differ(),
        )?;

        let mut views = Vec::new();
        for paragraph in paragraphs {
            match paragraph {
                ParagraphDiff::Unchanged => {}
                ParagraphDiff::Changed(diff) => {
                    let html = format!("{}{}{}", diff.text_pre, diff.text, diff.text_post);
                    views.push(AmendmentParagraphView {
                        paragraph_no: diff.paragraph_no,
                        html: if line_numbers { html } else { strip_html(&html)? },
                        inconsistent: false,
                    });
                }
                ParagraphDiff::Inconsistent { paragraph_no } => views.push(AmendmentParagraphView {
                    paragraph_no,
                    html: format!(
                        "<em class=\"{AMENDMENT_ERROR_CLASS}\">{INCONSISTENT_DATA_MESSAGE}</em>"
                    ),
                    inconsistent: true,
                }),
            }
        }
        Ok(views)
    }
}
