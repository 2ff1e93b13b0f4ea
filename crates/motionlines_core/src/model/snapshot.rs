use super::amendment::Amendment;
use super::motion::Motion;
use super::recommendation::ChangeRecommendation;
use serde::{Deserialize, Serialize};

/// Everything one render pass of a motion reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub motion: Motion,
    /// Recommendations targeting the motion itself.
    #[serde(default)]
    pub recommendations: Vec<ChangeRecommendation>,
    #[serde(default)]
    pub amendments: Vec<AmendmentSnapshot>,
}

/// One amendment plus the recommendations targeting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentSnapshot {
    pub amendment: Amendment,
    #[serde(default)]
    pub recommendations: Vec<ChangeRecommendation>,
}

impl MotionSnapshot {
    pub fn new(motion: Motion) -> Self {
        Self {
            motion,
            recommendations: Vec::new(),
            amendments: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
