use super::resolution::MergeDecision;
use super::resolver::DiffLinesInParagraph;
use crate::lines::LineRange;
use crate::model::amendment::AmendmentId;
use crate::model::recommendation::{ChangeRecommendation, RecommendationId, RecommendationKind};
use serde::Serialize;

/// Accessors shared by every change variant.
pub trait LineChange {
    fn line_from(&self) -> u32;
    /// Exclusive end line.
    fn line_to(&self) -> u32;
    /// Replacement markup (recommendations) or annotated diff markup
    /// (amendments).
    fn new_text(&self) -> &str;
    /// Sort and dedup key, namespaced per variant.
    fn identifier(&self) -> String;
    fn is_title_change(&self) -> bool;
    fn is_accepted(&self) -> bool;
    fn show_in_diff_view(&self) -> bool;
    fn show_in_final_view(&self) -> bool;

    fn is_rejected(&self) -> bool {
        !self.is_accepted()
    }

    fn line_range(&self) -> LineRange {
        LineRange::new(self.line_from(), self.line_to())
    }
}

/// A change recommendation on the motion text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationChange {
    pub id: RecommendationId,
    pub line_from: u32,
    pub line_to: u32,
    pub text: String,
    pub kind: RecommendationKind,
    pub internal: bool,
    pub rejected: bool,
}

impl From<&ChangeRecommendation> for RecommendationChange {
    fn from(value: &ChangeRecommendation) -> Self {
        Self {
            id: value.id,
            line_from: value.line_from,
            line_to: value.line_to,
            text: value.text.clone(),
            kind: value.kind,
            internal: value.internal,
            rejected: value.rejected,
        }
    }
}

impl LineChange for RecommendationChange {
    fn line_from(&self) -> u32 {
        self.line_from
    }

    fn line_to(&self) -> u32 {
        self.line_to
    }

    fn new_text(&self) -> &str {
        &self.text
    }

    fn identifier(&self) -> String {
        format!("recommendation:{}", self.id)
    }

    fn is_title_change(&self) -> bool {
        self.line_from == 0
    }

    fn is_accepted(&self) -> bool {
        !self.rejected
    }

    fn show_in_diff_view(&self) -> bool {
        true
    }

    fn show_in_final_view(&self) -> bool {
        !self.rejected
    }
}

/// One changed paragraph of an amendment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmendmentChange {
    pub amendment_id: AmendmentId,
    pub paragraph: DiffLinesInParagraph,
    #[serde(skip)]
    pub merge: MergeDecision,
}

impl LineChange for AmendmentChange {
    fn line_from(&self) -> u32 {
        self.paragraph.diff_line_from
    }

    fn line_to(&self) -> u32 {
        self.paragraph.diff_line_to
    }

    fn new_text(&self) -> &str {
        &self.paragraph.text
    }

    fn identifier(&self) -> String {
        format!(
            "amendment:{}:{}",
            self.amendment_id, self.paragraph.paragraph_no
        )
    }

    fn is_title_change(&self) -> bool {
        false
    }

    fn is_accepted(&self) -> bool {
        self.merge.is_accepted()
    }

    fn show_in_diff_view(&self) -> bool {
        self.merge.show_in_diff_view()
    }

    fn show_in_final_view(&self) -> bool {
        self.merge.show_in_final_view()
    }
}

/// Any change that can appear in a unified list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Change {
    Recommendation(RecommendationChange),
    Amendment(AmendmentChange),
}

impl Change {
    /// Internal recommendations are hidden from public renderings.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Recommendation(change) => change.internal,
            Self::Amendment(_) => false,
        }
    }
}

impl LineChange for Change {
    fn line_from(&self) -> u32 {
        match self {
            Self::Recommendation(change) => change.line_from(),
            Self::Amendment(change) => change.line_from(),
        }
    }

    fn line_to(&self) -> u32 {
        match self {
            Self::Recommendation(change) => change.line_to(),
            Self::Amendment(change) => change.line_to(),
        }
    }

    fn new_text(&self) -> &str {
        match self {
            Self::Recommendation(change) => change.new_text(),
            Self::Amendment(change) => change.new_text(),
        }
    }

    fn identifier(&self) -> String {
        match self {
            Self::Recommendation(change) => change.identifier(),
            Self::Amendment(change) => change.identifier(),
        }
    }

    fn is_title_change(&self) -> bool {
        match self {
            Self::Recommendation(change) => change.is_title_change(),
            Self::Amendment(change) => change.is_title_change(),
        }
    }

    fn is_accepted(&self) -> bool {
        match self {
            Self::Recommendation(change) => change.is_accepted(),
            Self::Amendment(change) => change.is_accepted(),
        }
    }

    fn show_in_diff_view(&self) -> bool {
        match self {
            Self::Recommendation(change) => change.show_in_diff_view(),
            Self::Amendment(change) => change.show_in_diff_view(),
        }
    }

    fn show_in_final_view(&self) -> bool {
        match self {
            Self::Recommendation(change) => change.show_in_final_view(),
            Self::Amendment(change) => change.show_in_final_view(),
        }
    }
}
