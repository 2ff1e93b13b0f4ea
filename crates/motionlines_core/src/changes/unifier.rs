use super::change::{AmendmentChange, Change, LineChange, RecommendationChange};
use super::resolution::MergeDecision;
use super::resolver::{resolve_amendment, ParagraphDiff};
use super::ChangeResult;
use crate::diff::DiffPrimitive;
use crate::html::parse_html;
use crate::lines::{LineError, LineRange, NumberingOptions};
use crate::model::amendment::AmendmentId;
use crate::model::snapshot::MotionSnapshot;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;

/// One entry of a unified change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedChange {
    pub change: Change,
    /// Whether this change overlaps another change of the same list.
    pub collision: bool,
}

/// Amendment paragraph that could not be resolved against the motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub amendment_id: AmendmentId,
    pub paragraph_no: usize,
}

/// Sorted, deduplicated, collision-annotated changes of one motion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnifiedChangeList {
    pub changes: Vec<UnifiedChange>,
    pub inconsistencies: Vec<Inconsistency>,
}

impl UnifiedChangeList {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().map(|entry| &entry.change)
    }

    pub fn has_collisions(&self) -> bool {
        self.changes.iter().any(|entry| entry.collision)
    }

    /// Line ranges of every colliding change, in list order.
    pub fn colliding_ranges(&self) -> Vec<LineRange> {
        self.changes
            .iter()
            .filter(|entry| entry.collision)
            .map(|entry| entry.change.line_range())
            .collect()
    }

    /// Keeps the changes matching `keep` and recomputes collisions among them.
    pub fn filtered(&self, mut keep: impl FnMut(&Change) -> bool) -> Self {
        let mut changes: Vec<UnifiedChange> = self
            .changes
            .iter()
            .filter(|entry| keep(&entry.change))
            .map(|entry| UnifiedChange {
                change: entry.change.clone(),
                collision: false,
            })
            .collect();
        mark_collisions(&mut changes);
        Self {
            changes,
            inconsistencies: self.inconsistencies.clone(),
        }
    }
}

/// Merges motion recommendations and amendment paragraph changes.
///
/// Amendment recommendations are filtered to those shown in the final view
/// before their amendment is resolved. The result is sorted by
/// `(line_from, identifier)`; a repeated identifier keeps the first position
/// and the last value.
///
/// # Errors
/// - `ChangeError::InvalidRecord` when a recommendation has an inverted range.
/// - `ChangeError::Line` when the motion text violates structural rules.
pub fn unify<D: DiffPrimitive + ?Sized>(
    snapshot: &MotionSnapshot,
    options: &NumberingOptions,
    differ: &D,
) -> ChangeResult<UnifiedChangeList> {
    let mut collected: Vec<Change> = Vec::new();
    for recommendation in &snapshot.recommendations {
        recommendation.validate()?;
        collected.push(Change::Recommendation(RecommendationChange::from(recommendation)));
    }

    let mut inconsistencies = Vec::new();
    if !snapshot.amendments.is_empty() {
        let base = parse_html(&snapshot.motion.text).map_err(LineError::from)?;
        for entry in &snapshot.amendments {
            let amendment = &entry.amendment;
            let accepted: Vec<_> = entry
                .recommendations
                .iter()
                .filter(|recommendation| {
                    RecommendationChange::from(*recommendation).show_in_final_view()
                })
                .cloned()
                .collect();
            let merge = MergeDecision::of(amendment);
            for paragraph in resolve_amendment(amendment, &base, options, &accepted, differ)? {
                match paragraph {
                    ParagraphDiff::Unchanged => {}
                    ParagraphDiff::Changed(diff) => {
                        collected.push(Change::Amendment(AmendmentChange {
                            amendment_id: amendment.id,
                            paragraph: diff,
                            merge,
                        }));
                    }
                    ParagraphDiff::Inconsistent { paragraph_no } => {
                        inconsistencies.push(Inconsistency {
                            amendment_id: amendment.id,
                            paragraph_no,
                        });
                    }
                }
            }
        }
    }

    let mut changes: Vec<UnifiedChange> = dedup_by_identifier(collected)
        .into_iter()
        .map(|change| UnifiedChange {
            change,
            collision: false,
        })
        .collect();
    changes.sort_by_cached_key(|entry| (entry.change.line_from(), entry.change.identifier()));
    mark_collisions(&mut changes);

    let list = UnifiedChangeList {
        changes,
        inconsistencies,
    };
    info!(
        "event=unify module=changes status=ok motion_id={} changes={} collisions={} inconsistencies={}",
        snapshot.motion.id,
        list.len(),
        list.colliding_ranges().len(),
        list.inconsistencies.len()
    );
    Ok(list)
}

fn dedup_by_identifier(changes: Vec<Change>) -> Vec<Change> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(changes.len());
    let mut out: Vec<Change> = Vec::with_capacity(changes.len());
    for change in changes {
        let identifier = change.identifier();
        match positions.get(&identifier) {
            Some(position) => {
                debug!("event=unify module=changes status=duplicate identifier={identifier}");
                out[*position] = change;
            }
            None => {
                positions.insert(identifier, out.len());
                out.push(change);
            }
        }
    }
    out
}

/// Flags every body change whose range overlaps another body change.
fn mark_collisions(changes: &mut [UnifiedChange]) {
    for entry in changes.iter_mut() {
        entry.collision = false;
    }
    for left in 0..changes.len() {
        if changes[left].change.is_title_change() {
            continue;
        }
        for right in left + 1..changes.len() {
            if changes[right].change.is_title_change() {
                continue;
            }
            if changes[left]
                .change
                .line_range()
                .overlaps(&changes[right].change.line_range())
            {
                changes[left].collision = true;
                changes[right].collision = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{dedup_by_identifier, unify};
    use crate::changes::{Change, LineChange, RecommendationChange};
    use crate::diff::WordDiff;
    use crate::lines::NumberingOptions;
    use crate::model::motion::Motion;
    use crate::model::recommendation::ChangeRecommendation;
    use crate::model::snapshot::MotionSnapshot;

    #[test]
    fn later_duplicate_wins_in_first_position() {
        let motion = Motion::new("T", "<p>x</p>");
        let first = ChangeRecommendation::new(motion.id, 1, 2, "<p>first</p>");
        let mut second = first.clone();
        second.text = "<p>second</p>".to_string();
        let other = ChangeRecommendation::new(motion.id, 3, 4, "<p>other</p>");

        let deduped = dedup_by_identifier(vec![
            Change::Recommendation(RecommendationChange::from(&first)),
            Change::Recommendation(RecommendationChange::from(&other)),
            Change::Recommendation(RecommendationChange::from(&second)),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].new_text(), "<p>second</p>");
    }

    #[test]
    fn title_changes_never_collide() {
        let motion = Motion::new("T", "<p>x</p>");
        let mut snapshot = MotionSnapshot::new(motion.clone());
        snapshot.recommendations = vec![
            ChangeRecommendation::new(motion.id, 0, 0, "Title A"),
            ChangeRecommendation::new(motion.id, 0, 0, "Title B"),
            ChangeRecommendation::new(motion.id, 1, 2, "<p>y</p>"),
        ];
        let list = unify(&snapshot, &NumberingOptions::new(80, 1), &WordDiff::new())
            .expect("unify succeeds");
        assert_eq!(list.len(), 3);
        assert!(!list.has_collisions());
        assert_eq!(list.changes[2].change.line_from(), 1);
    }

    #[test]
    fn inverted_recommendation_is_rejected() {
        let motion = Motion::new("T", "<p>x</p>");
        let mut snapshot = MotionSnapshot::new(motion.clone());
        snapshot.recommendations = vec![ChangeRecommendation::new(motion.id, 4, 2, "")];
        assert!(unify(&snapshot, &NumberingOptions::new(80, 1), &WordDiff::new()).is_err());
    }
}
