//! Motion text use-case service.
//!
//! # Responsibility
//! - Own the recompute policy for unified change lists: a generation
//!   counter bumped by change notifications.
//! - Render motions in any view mode, reusing memoized numbering passes.
//!
//! # Invariants
//! - A cached unified list is served only while its generation matches the
//!   service generation; otherwise the whole unify pass reruns.
//! - Cached unified lists are bounded by `cache_capacity` and dropped on
//!   every generation bump.
//! - Numbered base documents are memoized by content, never invalidated.

use crate::cache::LineNumberCache;
use crate::changes::{unify, ChangeError, UnifiedChangeList};
use crate::config::{ConfigError, RenderConfig, RenderOptions};
use crate::diff::WordDiff;
use crate::lines::LineError;
use crate::model::amendment::AmendmentId;
use crate::model::motion::{Motion, MotionId};
use crate::model::snapshot::AmendmentSnapshot;
use crate::render::{AmendmentParagraphView, MotionRenderer, RenderedText};
use crate::repo::{MotionRepository, RepoError};
use log::{debug, info};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for motion text use-cases.
#[derive(Debug)]
pub enum ServiceError {
    MotionNotFound(MotionId),
    AmendmentNotFound(AmendmentId),
    Config(ConfigError),
    Repo(RepoError),
    Change(ChangeError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MotionNotFound(id) => write!(f, "motion not found: {id}"),
            Self::AmendmentNotFound(id) => write!(f, "amendment not found: {id}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Change(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Change(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::MotionNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ChangeError> for ServiceError {
    fn from(value: ChangeError) -> Self {
        Self::Change(value)
    }
}

impl From<LineError> for ServiceError {
    fn from(value: LineError) -> Self {
        Self::Change(ChangeError::Line(value))
    }
}

struct UnifiedEntry {
    generation: u64,
    motion: Motion,
    changes: UnifiedChangeList,
}

/// Motion text service facade over repository implementations.
pub struct MotionTextService<R: MotionRepository> {
    repo: R,
    renderer: MotionRenderer<WordDiff>,
    generation: u64,
    unified: LruCache<MotionId, UnifiedEntry>,
    numbered: LineNumberCache,
}

impl<R: MotionRepository> MotionTextService<R> {
    /// Creates a service using the provided repository and settings.
    ///
    /// # Errors
    /// - `Config` when `config` fails validation.
    pub fn new(repo: R, config: RenderConfig) -> ServiceResult<Self> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            repo,
            renderer: MotionRenderer::new(WordDiff::new(), config.column_width),
            generation: 0,
            unified: LruCache::new(capacity),
            numbered: LineNumberCache::new(config.cache_capacity),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn line_number_cache(&self) -> &LineNumberCache {
        &self.numbered
    }

    /// Number of motions with a cached unified change list.
    pub fn cached_change_lists(&self) -> usize {
        self.unified.len()
    }

    /// Signals that some recommendation (on a motion or an amendment) changed.
    pub fn notify_recommendations_changed(&mut self) {
        self.bump("recommendations");
    }

    /// Signals that some amendment or amendment paragraph changed.
    pub fn notify_amendments_changed(&mut self) {
        self.bump("amendments");
    }

    /// Signals that a motion record itself changed.
    pub fn notify_motion_changed(&mut self) {
        self.bump("motion");
    }

    fn bump(&mut self, source: &str) {
        self.generation += 1;
        let dropped = self.unified.len();
        self.unified.clear();
        debug!(
            "event=generation_bump module=service status=ok source={source} generation={} dropped={dropped}",
            self.generation
        );
    }

    /// Unified change list of `motion_id`, recomputed only when the
    /// generation moved since the last call for that motion.
    ///
    /// # Errors
    /// - `MotionNotFound` when the motion does not exist.
    /// - `Change` when the stored texts violate structural rules.
    pub fn unified_changes(&mut self, motion_id: MotionId) -> ServiceResult<UnifiedChangeList> {
        Ok(self.unified_entry(motion_id)?.changes.clone())
    }

    fn unified_entry(&mut self, motion_id: MotionId) -> ServiceResult<&UnifiedEntry> {
        let fresh = self
            .unified
            .peek(&motion_id)
            .is_some_and(|entry| entry.generation == self.generation);
        if !fresh {
            let snapshot = self.repo.load_snapshot(motion_id)?;
            let numbering = self.renderer.numbering(&snapshot.motion);
            let changes = unify(&snapshot, &numbering, self.renderer.differ())?;
            info!(
                "event=unify_recompute module=service status=ok motion_id={motion_id} generation={}",
                self.generation
            );
            self.unified.put(
                motion_id,
                UnifiedEntry {
                    generation: self.generation,
                    motion: snapshot.motion,
                    changes,
                },
            );
        }
        self.unified
            .get(&motion_id)
            .ok_or(ServiceError::MotionNotFound(motion_id))
    }

    /// Renders `motion_id` with `options`.
    ///
    /// # Errors
    /// - Same as [`MotionTextService::unified_changes`].
    pub fn render(
        &mut self,
        motion_id: MotionId,
        options: &RenderOptions,
    ) -> ServiceResult<RenderedText> {
        let (motion, changes) = {
            let entry = self.unified_entry(motion_id)?;
            (entry.motion.clone(), entry.changes.clone())
        };
        let renderer = &self.renderer;
        let numbered =
            self.numbered
                .get_or_try_insert(&motion.text, &renderer.numbering(&motion), || {
                    renderer.number(&motion)
                })?;
        Ok(renderer.render_numbered(&motion, &numbered, &changes, options)?)
    }

    /// Renders the changed paragraphs of one amendment against its lead
    /// motion.
    ///
    /// # Errors
    /// - `AmendmentNotFound` / `MotionNotFound` for missing records.
    pub fn render_amendment(
        &self,
        amendment_id: AmendmentId,
        line_numbers: bool,
    ) -> ServiceResult<Vec<AmendmentParagraphView>> {
        let amendment = self
            .repo
            .get_amendment(amendment_id)?
            .ok_or(ServiceError::AmendmentNotFound(amendment_id))?;
        let motion = self
            .repo
            .get_motion(amendment.lead_motion_id)?
            .ok_or(ServiceError::MotionNotFound(amendment.lead_motion_id))?;
        let recommendations = self.repo.list_recommendations(amendment_id)?;
        let snapshot = AmendmentSnapshot {
            amendment,
            recommendations,
        };
        Ok(self
            .renderer
            .render_amendment(&motion, &snapshot, line_numbers)?)
    }
}
