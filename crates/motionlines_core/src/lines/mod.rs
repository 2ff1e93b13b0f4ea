//! Line numbering, range extraction and paragraph splitting.
//!
//! # Responsibility
//! - Insert and strip line markers under a configurable column width.
//! - Carve `[from, to)` line slices out of numbered documents.
//! - Split documents into paragraphs and replace line ranges.
//!
//! # Invariants
//! - Line numbers are contiguous and strictly increasing within one pass.
//! - Every numbering pass owns its own `WalkContext`; nothing is shared
//!   between passes.
//! - Structural violations are returned as `LineError`, never panics.

mod paragraphs;
mod range;
mod replace;
mod walker;

use crate::html::HtmlError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use paragraphs::{line_number_range, split_paragraphs};
pub use range::{extract_range, ExtractedRange};
pub use replace::replace_lines;
pub use walker::{insert_line_numbers, number_html, strip_html, strip_line_numbers};

pub type LineResult<T> = Result<T, LineError>;

/// Contract violation raised by line-numbering algorithms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// A requested line has no marker in the document.
    MissingLineNumber(u32),
    /// Root-level inline content where only blocks are allowed.
    RootInlineContent(String),
    /// Column width must be at least one character.
    InvalidColumnWidth(u32),
    Html(HtmlError),
}

impl Display for LineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLineNumber(line) => write!(f, "line number {line} not found in document"),
            Self::RootInlineContent(snippet) => {
                write!(f, "inline content at document root: `{snippet}`")
            }
            Self::InvalidColumnWidth(width) => {
                write!(f, "column width must be >= 1, got {width}")
            }
            Self::Html(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Html(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HtmlError> for LineError {
    fn from(value: HtmlError) -> Self {
        Self::Html(value)
    }
}

/// Half-open line interval `[from, to)`.
///
/// Unbounded ends are expressed as `Option<u32>` at call sites such as
/// [`extract_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub from: u32,
    pub to: u32,
}

impl LineRange {
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Returns whether `line` lies in `[from, to)`.
    pub fn contains(&self, line: u32) -> bool {
        line >= self.from && line < self.to
    }

    /// Overlap test where an empty range still claims its first line.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        let self_end = self.to.max(self.from + 1);
        let other_end = other.to.max(other.from + 1);
        self.from < other_end && other.from < self_end
    }
}

/// Parameters of one numbering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingOptions {
    pub column_width: u32,
    pub first_line: u32,
    /// Skip `<ins>` and `.insert` content when counting, so pending
    /// insertions do not shift the numbering of the original text.
    ///
    /// Internal render paths never set this: their diffs keep the base
    /// markers. It is for callers numbering diff markup from elsewhere,
    /// such as `motionlines number --ignore-inserted`.
    pub ignore_inserted_text: bool,
}

impl NumberingOptions {
    pub fn new(column_width: u32, first_line: u32) -> Self {
        Self {
            column_width,
            first_line,
            ignore_inserted_text: false,
        }
    }

    pub fn starting_at(self, first_line: u32) -> Self {
        Self { first_line, ..self }
    }

    pub fn ignoring_inserted_text(self) -> Self {
        Self {
            ignore_inserted_text: true,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LineRange;

    #[test]
    fn ranges_overlap_only_when_sharing_a_line() {
        let a = LineRange::new(3, 6);
        assert!(a.overlaps(&LineRange::new(3, 6)));
        assert!(a.overlaps(&LineRange::new(5, 9)));
        assert!(!a.overlaps(&LineRange::new(6, 8)));
        assert!(!a.overlaps(&LineRange::new(1, 3)));
    }

    #[test]
    fn empty_range_claims_its_first_line() {
        let point = LineRange::new(2, 2);
        assert!(point.overlaps(&LineRange::new(2, 3)));
        assert!(!point.overlaps(&LineRange::new(5, 6)));
    }
}
