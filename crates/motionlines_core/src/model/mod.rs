//! Plain records consumed by the line-numbering core.
//!
//! # Responsibility
//! - Define motions, change recommendations and amendments as read-only
//!   inputs, plus the snapshot bundle a render pass works on.
//! - Validate record-level invariants before they reach the algorithms.
//!
//! # Invariants
//! - Every record is identified by a stable `Uuid`.
//! - Line numbers are 1-based; line `0` addresses the motion title.
//! - Line ranges are half-open: `line_to` is the first line not touched.

pub mod amendment;
pub mod motion;
pub mod recommendation;
pub mod snapshot;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Record-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Motion numbering must start at line 1 or later.
    InvalidFirstLine { motion_id: Uuid, first_line: u32 },
    /// `line_to` lies before `line_from`.
    InvertedLineRange {
        recommendation_id: Uuid,
        line_from: u32,
        line_to: u32,
    },
    /// An amendment must not amend itself.
    SelfAmendment(Uuid),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFirstLine {
                motion_id,
                first_line,
            } => write!(
                f,
                "motion {motion_id} has invalid first line {first_line}; expected >= 1"
            ),
            Self::InvertedLineRange {
                recommendation_id,
                line_from,
                line_to,
            } => write!(
                f,
                "change recommendation {recommendation_id} has line_to {line_to} before line_from {line_from}"
            ),
            Self::SelfAmendment(id) => write!(f, "amendment {id} references itself as lead motion"),
        }
    }
}

impl Error for RecordValidationError {}
