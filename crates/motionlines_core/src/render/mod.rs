//! Motion text rendering in the five view modes.
//!
//! # Responsibility
//! - Assemble the output markup of one motion from its numbered base text
//!   and its unified change list.
//! - Report colliding line ranges next to the markup.
//!
//! # Invariants
//! - Line numbers in every mode except `ModifiedFinal` with an override
//!   refer to the base numbering pass or a fresh renumbering of the result.
//! - Colliding changes are rendered, wrapped in a collision container, in
//!   the diff view; the applying views skip later overlapping changes.
//!
//! # See also
//! - `crate::changes::resolution` for the per-mode change filter.

mod amendment;

use crate::changes::{Change, ChangeResult, LineChange, UnifiedChangeList, ViewMode};
use crate::config::RenderOptions;
use crate::diff::DiffPrimitive;
use crate::html::{parse_html, Document};
use crate::lines::{
    extract_range, insert_line_numbers, replace_lines, strip_html, strip_line_numbers, LineRange,
    LineResult, NumberingOptions,
};
use crate::model::motion::Motion;
use log::{debug, warn};
use serde::Serialize;

pub use amendment::{AmendmentParagraphView, AMENDMENT_ERROR_CLASS};

/// CSS class of the container around colliding changes in the diff view.
pub const COLLISION_CLASS: &str = "os-change-collision";

/// Output of one render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedText {
    pub html: String,
    /// Line ranges of visible changes that overlap another visible change.
    pub collisions: Vec<LineRange>,
}

/// Renders motion texts with a fixed diff implementation and column width.
pub struct MotionRenderer<D: DiffPrimitive> {
    differ: D,
    column_width: u32,
}

impl<D: DiffPrimitive> MotionRenderer<D> {
    pub fn new(differ: D, column_width: u32) -> Self {
        Self {
            differ,
            column_width,
        }
    }

    pub fn differ(&self) -> &D {
        &self.differ
    }

    /// Numbering parameters for `motion`.
    pub fn numbering(&self, motion: &Motion) -> NumberingOptions {
        NumberingOptions::new(self.column_width, motion.first_line)
    }

    /// Numbers the motion text from scratch.
    pub fn number(&self, motion: &Motion) -> LineResult<Document> {
        let base = parse_html(&motion.text)?;
        insert_line_numbers(&base, &self.numbering(motion))
    }

    /// Renders `motion` in `options.mode`.
    ///
    /// # Errors
    /// - Structural `LineError`s (wrapped in `ChangeError::Line`) when a
    ///   change addresses a line the text does not have.
    pub fn render(
        &self,
        motion: &Motion,
        changes: &UnifiedChangeList,
        options: &RenderOptions,
    ) -> ChangeResult<RenderedText> {
        let numbered = self.number(motion)?;
        self.render_numbered(motion, &numbered, changes, options)
    }

    /// Same as [`MotionRenderer::render`] with a numbered base supplied by
    /// the caller, e.g. from a cache.
    pub fn render_numbered(
        &self,
        motion: &Motion,
        numbered: &Document,
        changes: &UnifiedChangeList,
        options: &RenderOptions,
    ) -> ChangeResult<RenderedText> {
        let visible = changes.filtered(|change| {
            (options.include_internal || !change.is_internal())
                && options.mode.includes(change, options.show_all_changes)
        });
        let numbering = self.numbering(motion);

        let html = match options.mode {
            ViewMode::Original => numbered.to_html(),
            ViewMode::Changed | ViewMode::Final => self.apply_changes(numbered, &visible, &numbering)?,
            ViewMode::ModifiedFinal => match &motion.modified_final_version {
                Some(text) => insert_line_numbers(&parse_html(text)?, &numbering)?.to_html(),
                None => self.apply_changes(numbered, &visible, &numbering)?,
            },
            ViewMode::Diff => self.render_diff(numbered, &visible)?,
        };
        let html = if options.line_numbers {
            html
        } else {
            strip_html(&html)?
        };

        debug!(
            "event=render module=render status=ok motion_id={} mode={} changes={}",
            motion.id,
            options.mode,
            visible.len()
        );
        Ok(RenderedText {
            html,
            collisions: visible.colliding_ranges(),
        })
    }

    /// Applies non-overlapping changes and renumbers the result.
    fn apply_changes(
        &self,
        numbered: &Document,
        changes: &UnifiedChangeList,
        numbering: &NumberingOptions,
    ) -> ChangeResult<String> {
        let mut chosen: Vec<&Change> = Vec::new();
        for change in changes.iter() {
            let range = change.line_range();
            if chosen.iter().any(|kept| kept.line_range().overlaps(&range)) {
                warn!(
                    "event=render module=render status=skipped_collision identifier={} line_from={} line_to={}",
                    change.identifier(),
                    range.from,
                    range.to
                );
                continue;
            }
            chosen.push(change);
        }

        // Replacements keep every marker outside their range, so applying in
        // list order still finds the markers of later changes.
        let mut doc = numbered.clone();
        for change in chosen {
            let text = self.final_text(change)?;
            let to = doc
                .line_numbers()
                .contains(&change.line_to())
                .then_some(change.line_to());
            doc = replace_lines(&doc, change.line_from(), to, &text)?;
        }
        Ok(insert_line_numbers(&strip_line_numbers(&doc), numbering)?.to_html())
    }

    fn final_text(&self, change: &Change) -> LineResult<String> {
        match change {
            Change::Recommendation(recommendation) => Ok(recommendation.text.clone()),
            Change::Amendment(amendment) => self.differ.diff_to_final_text(&amendment.paragraph.text),
        }
    }

    /// Base segments between changes, interleaved with change diffs.
    fn render_diff(&self, numbered: &Document, changes: &UnifiedChangeList) -> ChangeResult<String> {
        let lines = numbered.line_numbers();
        let mut out = String::new();
        let mut cursor: Option<u32> = None;

        for entry in &changes.changes {
            let change = &entry.change;
            let covered = cursor.is_some_and(|line| change.line_from() < line);
            if !covered {
                out.push_str(&segment(numbered, &lines, cursor, Some(change.line_from()))?);
            }

            let diff = self.change_diff(numbered, &lines, change)?;
            if entry.collision {
                out.push_str(&format!("<div class=\"{COLLISION_CLASS}\">{diff}</div>"));
            } else {
                out.push_str(&diff);
            }

            let end = change.line_to().max(change.line_from());
            cursor = Some(cursor.map_or(end, |line| line.max(end)));
        }

        out.push_str(&segment(numbered, &lines, cursor, None)?);
        Ok(out)
    }

    fn change_diff(&self, numbered: &Document, lines: &[u32], change: &Change) -> LineResult<String> {
        match change {
            Change::Amendment(amendment) => Ok(amendment.paragraph.text.clone()),
            Change::Recommendation(recommendation) => {
                let old = segment(
                    numbered,
                    lines,
                    Some(recommendation.line_from),
                    Some(recommendation.line_to),
                )?;
                self.differ.diff(&old, &recommendation.text)
            }
        }
    }
}

/// Balanced markup of lines `[from, to)`; bounds outside the numbered
/// lines are clamped, and empty selections render as nothing.
fn segment(doc: &Document, lines: &[u32], from: Option<u32>, to: Option<u32>) -> LineResult<String> {
    let (Some(first), Some(last)) = (lines.first().copied(), lines.last().copied()) else {
        return Ok(match (from, to) {
            (None, None) => doc.to_html(),
            _ => String::new(),
        });
    };
    if from.is_some_and(|line| line > last) {
        return Ok(String::new());
    }
    let from = from.filter(|line| *line > first);
    let to = to.filter(|line| *line <= last);
    if let (Some(from), Some(to)) = (from, to) {
        if to <= from {
            return Ok(String::new());
        }
    }
    if to.is_some_and(|line| line <= first) && from.is_none() {
        return Ok(String::new());
    }

    let range = extract_range(doc, from, to)?;
    Ok(if range.html.is_empty() {
        String::new()
    } else {
        range.standalone_html()
    })
}
