//! Accept/reject and visibility decision tables.
//!
//! Pure lookups over two merge states. The amendment's own state always
//! takes precedence; the recommendation state is only a fallback, and the
//! final view ignores it entirely.

use super::change::{Change, LineChange};
use crate::model::amendment::{Amendment, MergeState};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Merge states of one amendment and of the recommendation on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MergeDecision {
    pub amendment: MergeState,
    pub recommendation: MergeState,
}

impl MergeDecision {
    pub fn new(amendment: MergeState, recommendation: MergeState) -> Self {
        Self {
            amendment,
            recommendation,
        }
    }

    pub fn of(amendment: &Amendment) -> Self {
        Self::new(amendment.state_merge, amendment.recommendation_merge)
    }

    /// Amendment state first, then recommendation state, else rejected.
    pub fn is_accepted(&self) -> bool {
        self.amendment
            .decided()
            .or_else(|| self.recommendation.decided())
            .unwrap_or(false)
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_accepted()
    }

    /// Same precedence as [`MergeDecision::is_accepted`].
    pub fn show_in_diff_view(&self) -> bool {
        self.is_accepted()
    }

    /// Only an explicit `Yes` on the amendment itself counts.
    pub fn show_in_final_view(&self) -> bool {
        self.amendment == MergeState::Yes
    }
}

/// Rendering mode of a motion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Base text, no change applied.
    #[default]
    Original,
    /// Only change recommendations applied.
    Changed,
    /// All visible changes inline with insert/delete markup.
    Diff,
    /// Final-view changes applied, markup stripped.
    Final,
    /// Editor override text, else `Final`.
    ModifiedFinal,
}

impl ViewMode {
    pub const ALL: [ViewMode; 5] = [
        Self::Original,
        Self::Changed,
        Self::Diff,
        Self::Final,
        Self::ModifiedFinal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Changed => "changed",
            Self::Diff => "diff",
            Self::Final => "final",
            Self::ModifiedFinal => "modified_final",
        }
    }

    /// Whether `change` takes part in this mode.
    ///
    /// Title changes never touch the body and are excluded everywhere.
    /// `show_all` only widens the diff view.
    pub fn includes(self, change: &Change, show_all: bool) -> bool {
        if change.is_title_change() {
            return false;
        }
        match self {
            Self::Original => false,
            Self::Changed => matches!(change, Change::Recommendation(_)) && !change.is_rejected(),
            Self::Diff => show_all || change.show_in_diff_view(),
            Self::Final | Self::ModifiedFinal => change.show_in_final_view(),
        }
    }
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown view mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseViewModeError(pub String);

impl Display for ParseViewModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown view mode `{}`", self.0)
    }
}

impl std::error::Error for ParseViewModeError {}

impl FromStr for ViewMode {
    type Err = ParseViewModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ParseViewModeError(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{MergeDecision, ViewMode};
    use crate::model::amendment::MergeState::{No, Undefined, Yes};

    #[test]
    fn amendment_state_wins_over_recommendation() {
        assert!(!MergeDecision::new(No, Yes).is_accepted());
        assert!(MergeDecision::new(Yes, No).is_accepted());
        assert!(MergeDecision::new(Undefined, Yes).is_accepted());
        assert!(!MergeDecision::new(Undefined, No).is_accepted());
    }

    #[test]
    fn undefined_everywhere_is_rejected_and_hidden() {
        let decision = MergeDecision::new(Undefined, Undefined);
        assert!(!decision.is_accepted());
        assert!(decision.is_rejected());
        assert!(!decision.show_in_diff_view());
        assert!(!decision.show_in_final_view());
    }

    #[test]
    fn final_view_ignores_recommendation_state() {
        assert!(!MergeDecision::new(Undefined, Yes).show_in_final_view());
        assert!(MergeDecision::new(Yes, No).show_in_final_view());
        assert!(MergeDecision::new(Undefined, Yes).show_in_diff_view());
    }

    #[test]
    fn view_modes_parse_by_name() {
        for mode in ViewMode::ALL {
            assert_eq!(mode.as_str().parse::<ViewMode>(), Ok(mode));
        }
        assert_eq!("Modified-Final".parse::<ViewMode>(), Ok(ViewMode::ModifiedFinal));
        assert!("crossed".parse::<ViewMode>().is_err());
    }
}
