//! Change model, resolution rules, amendment resolution and unification.
//!
//! # Responsibility
//! - Wrap recommendations and amendment paragraphs as one `Change` enum.
//! - Decide acceptance and visibility per rendering mode.
//! - Resolve amendments into line-ranged paragraph diffs.
//! - Merge everything into one sorted, collision-annotated list.
//!
//! # Invariants
//! - A unified list never holds two changes with the same identifier.
//! - Collisions are reported on the changes, never resolved by dropping.
//! - Per-paragraph inconsistencies are values, not errors.
//!
//! # See also
//! - `crate::render` for the consumer of unified lists.

pub mod change;
pub mod resolution;
pub mod resolver;
pub mod unifier;

use crate::html::HtmlError;
use crate::lines::LineError;
use crate::model::RecordValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use change::{AmendmentChange, Change, LineChange, RecommendationChange};
pub use resolution::{MergeDecision, ViewMode};
pub use resolver::{resolve_amendment, DiffLinesInParagraph, ParagraphDiff};
pub use unifier::{unify, Inconsistency, UnifiedChange, UnifiedChangeList};

pub type ChangeResult<T> = Result<T, ChangeError>;

/// Failure of a unification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeError {
    /// A line-numbering contract was violated.
    Line(LineError),
    /// An input record failed validation.
    InvalidRecord(RecordValidationError),
}

impl Display for ChangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Line(err) => write!(f, "{err}"),
            Self::InvalidRecord(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ChangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Line(err) => Some(err),
            Self::InvalidRecord(err) => Some(err),
        }
    }
}

impl From<LineError> for ChangeError {
    fn from(value: LineError) -> Self {
        Self::Line(value)
    }
}

impl From<HtmlError> for ChangeError {
    fn from(value: HtmlError) -> Self {
        Self::Line(LineError::Html(value))
    }
}

impl From<RecordValidationError> for ChangeError {
    fn from(value: RecordValidationError) -> Self {
        Self::InvalidRecord(value)
    }
}
