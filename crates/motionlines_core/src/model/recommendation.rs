//! Change recommendation record.

use super::RecordValidationError;
use crate::lines::LineRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RecommendationId = Uuid;

/// Editorial kind of a recommendation. Display only; every kind is applied
/// as a line-range replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    #[default]
    Replacement,
    Insertion,
    Deletion,
    Other,
}

impl RecommendationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replacement => "replacement",
            Self::Insertion => "insertion",
            Self::Deletion => "deletion",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "replacement" => Some(Self::Replacement),
            "insertion" => Some(Self::Insertion),
            "deletion" => Some(Self::Deletion),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Direct replacement of lines `[line_from, line_to)` of its target text.
///
/// The target is either a motion or an amendment; for amendments the line
/// numbers address the amendment's paragraph text numbered in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecommendation {
    pub id: RecommendationId,
    pub target_id: Uuid,
    pub line_from: u32,
    pub line_to: u32,
    /// Replacement markup for the whole line range.
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: RecommendationKind,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub rejected: bool,
}

impl ChangeRecommendation {
    /// Creates a replacement recommendation with a generated ID.
    pub fn new(target_id: Uuid, line_from: u32, line_to: u32, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_id,
            line_from,
            line_to,
            text: text.into(),
            kind: RecommendationKind::Replacement,
            internal: false,
            rejected: false,
        }
    }

    /// Line `0` addresses the title, not the body.
    pub fn is_title_change(&self) -> bool {
        self.line_from == 0
    }

    pub fn line_range(&self) -> LineRange {
        LineRange::new(self.line_from, self.line_to)
    }

    /// Validates record invariants.
    ///
    /// # Errors
    /// - `InvertedLineRange` when `line_to < line_from`.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.line_to < self.line_from {
            return Err(RecordValidationError::InvertedLineRange {
                recommendation_id: self.id,
                line_from: self.line_from,
                line_to: self.line_to,
            });
        }
        Ok(())
    }
}
