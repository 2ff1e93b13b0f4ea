//! Paragraph-based amendment record.

use super::RecordValidationError;
use crate::model::motion::MotionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type AmendmentId = Uuid;

/// Three-valued merge-into-final flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeState {
    Yes,
    No,
    #[default]
    Undefined,
}

impl MergeState {
    /// `Some(true)` for `Yes`, `Some(false)` for `No`, `None` otherwise.
    pub fn decided(self) -> Option<bool> {
        match self {
            Self::Yes => Some(true),
            Self::No => Some(false),
            Self::Undefined => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Undefined => "undefined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "undefined" => Some(Self::Undefined),
            _ => None,
        }
    }
}

/// Amendment replacing whole paragraphs of its lead motion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendment {
    pub id: AmendmentId,
    pub lead_motion_id: MotionId,
    /// Replacement markup keyed by zero-based paragraph index.
    #[serde(rename = "amendment_paragraphs", default)]
    pub paragraphs: BTreeMap<usize, String>,
    /// The amendment's own merge-into-final state.
    #[serde(default)]
    pub state_merge: MergeState,
    /// Merge-into-final state of the recommendation on the amendment.
    #[serde(default)]
    pub recommendation_merge: MergeState,
}

impl Amendment {
    pub fn new(lead_motion_id: MotionId) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_motion_id,
            paragraphs: BTreeMap::new(),
            state_merge: MergeState::Undefined,
            recommendation_merge: MergeState::Undefined,
        }
    }

    /// Builder helper setting replacement text for one paragraph.
    pub fn with_paragraph(mut self, index: usize, text: impl Into<String>) -> Self {
        self.paragraphs.insert(index, text.into());
        self
    }

    /// Builder helper setting both merge states.
    pub fn with_merge_states(mut self, state: MergeState, recommendation: MergeState) -> Self {
        self.state_merge = state;
        self.recommendation_merge = recommendation;
        self
    }

    /// Validates record invariants.
    ///
    /// # Errors
    /// - `SelfAmendment` when the amendment names itself as lead motion.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.id == self.lead_motion_id {
            return Err(RecordValidationError::SelfAmendment(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Amendment, MergeState};
    use uuid::Uuid;

    #[test]
    fn merge_state_defaults_to_undefined() {
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "lead_motion_id": "1f0e3dad-9990-4a0e-8c47-5ad4f0a8a3c1",
            "amendment_paragraphs": {"2": "<p>new</p>"},
            "state_merge": "yes"
        }"#;
        let amendment: Amendment = serde_json::from_str(json).expect("valid json");
        assert_eq!(amendment.state_merge, MergeState::Yes);
        assert_eq!(amendment.recommendation_merge, MergeState::Undefined);
        assert_eq!(amendment.paragraphs.get(&2).map(String::as_str), Some("<p>new</p>"));
    }

    #[test]
    fn self_amendment_is_invalid() {
        let mut amendment = Amendment::new(Uuid::new_v4());
        assert!(amendment.validate().is_ok());
        amendment.lead_motion_id = amendment.id;
        assert!(amendment.validate().is_err());
    }
}
