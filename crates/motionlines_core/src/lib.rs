//! Line numbering and change unification for legislative motion texts.
//! This crate is the single source of truth for the numbering invariants.

pub mod cache;
pub mod changes;
pub mod config;
pub mod db;
pub mod diff;
pub mod html;
pub mod lines;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod service;

pub use cache::LineNumberCache;
pub use changes::{
    resolve_amendment, unify, Change, ChangeError, ChangeResult, LineChange, MergeDecision,
    ParagraphDiff, UnifiedChangeList, ViewMode,
};
pub use config::{ConfigError, RenderConfig, RenderOptions};
pub use diff::{DiffPrimitive, WordDiff};
pub use html::{parse_html, to_html, Document, HtmlError, Node};
pub use lines::{
    extract_range, insert_line_numbers, line_number_range, number_html, replace_lines,
    split_paragraphs, strip_html, strip_line_numbers, LineError, LineRange, LineResult,
    NumberingOptions,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::amendment::{Amendment, MergeState};
pub use model::motion::Motion;
pub use model::recommendation::{ChangeRecommendation, RecommendationKind};
pub use model::snapshot::{AmendmentSnapshot, MotionSnapshot};
pub use render::{MotionRenderer, RenderedText};
pub use repo::{MotionRepository, RepoError, RepoResult, SqliteMotionRepository};
pub use service::{MotionTextService, ServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
