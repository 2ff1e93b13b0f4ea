//! Motion, recommendation and amendment persistence.
//!
//! # Responsibility
//! - Store the records a render pass reads and load them back as one
//!   [`MotionSnapshot`].
//!
//! # Invariants
//! - Amendment paragraphs are replaced as a whole set inside one transaction.
//! - Recommendations are listed in `(line_from, line_to, uuid)` order.

use super::{RepoError, RepoResult};
use crate::model::amendment::{Amendment, AmendmentId, MergeState};
use crate::model::motion::{Motion, MotionId};
use crate::model::recommendation::{ChangeRecommendation, RecommendationId, RecommendationKind};
use crate::model::snapshot::{AmendmentSnapshot, MotionSnapshot};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

const MOTION_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    text,
    first_line,
    modified_final_version
FROM motions";

const RECOMMENDATION_SELECT_SQL: &str = "SELECT
    uuid,
    target_uuid,
    line_from,
    line_to,
    text,
    type,
    internal,
    rejected
FROM change_recommendations";

const AMENDMENT_SELECT_SQL: &str = "SELECT
    uuid,
    lead_motion_uuid,
    state_merge,
    recommendation_merge
FROM amendments";

/// Read access needed to render a motion.
pub trait MotionRepository {
    fn get_motion(&self, id: MotionId) -> RepoResult<Option<Motion>>;
    /// Recommendations whose target is `target_id` (a motion or an amendment).
    fn list_recommendations(&self, target_id: Uuid) -> RepoResult<Vec<ChangeRecommendation>>;
    fn list_amendments(&self, lead_motion_id: MotionId) -> RepoResult<Vec<Amendment>>;
    fn get_amendment(&self, id: AmendmentId) -> RepoResult<Option<Amendment>>;

    /// Loads a motion together with its recommendations, its amendments and
    /// the recommendations on each amendment.
    ///
    /// # Errors
    /// - `NotFound` when the motion does not exist.
    fn load_snapshot(&self, motion_id: MotionId) -> RepoResult<MotionSnapshot> {
        let motion = self
            .get_motion(motion_id)?
            .ok_or(RepoError::NotFound(motion_id))?;
        let mut snapshot = MotionSnapshot::new(motion);
        snapshot.recommendations = self.list_recommendations(motion_id)?;
        for amendment in self.list_amendments(motion_id)? {
            let recommendations = self.list_recommendations(amendment.id)?;
            snapshot.amendments.push(AmendmentSnapshot {
                amendment,
                recommendations,
            });
        }
        Ok(snapshot)
    }
}

/// SQLite-backed motion repository.
pub struct SqliteMotionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMotionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts or replaces one motion.
    pub fn save_motion(&self, motion: &Motion) -> RepoResult<MotionId> {
        motion.validate()?;

        self.conn.execute(
            "INSERT INTO motions (uuid, title, text, first_line, modified_final_version)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (uuid) DO UPDATE SET
                title = excluded.title,
                text = excluded.text,
                first_line = excluded.first_line,
                modified_final_version = excluded.modified_final_version;",
            params![
                motion.id.to_string(),
                motion.title.as_str(),
                motion.text.as_str(),
                i64::from(motion.first_line),
                motion.modified_final_version.as_deref(),
            ],
        )?;

        Ok(motion.id)
    }

    /// Inserts or replaces one change recommendation.
    pub fn save_recommendation(
        &self,
        recommendation: &ChangeRecommendation,
    ) -> RepoResult<RecommendationId> {
        recommendation.validate()?;

        self.conn.execute(
            "INSERT INTO change_recommendations (
                uuid,
                target_uuid,
                line_from,
                line_to,
                text,
                type,
                internal,
                rejected
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (uuid) DO UPDATE SET
                target_uuid = excluded.target_uuid,
                line_from = excluded.line_from,
                line_to = excluded.line_to,
                text = excluded.text,
                type = excluded.type,
                internal = excluded.internal,
                rejected = excluded.rejected;",
            params![
                recommendation.id.to_string(),
                recommendation.target_id.to_string(),
                i64::from(recommendation.line_from),
                i64::from(recommendation.line_to),
                recommendation.text.as_str(),
                recommendation.kind.as_str(),
                bool_to_int(recommendation.internal),
                bool_to_int(recommendation.rejected),
            ],
        )?;

        Ok(recommendation.id)
    }

    pub fn delete_recommendation(&self, id: RecommendationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM change_recommendations WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Inserts or replaces one amendment and its whole paragraph set.
    pub fn save_amendment(&self, amendment: &Amendment) -> RepoResult<AmendmentId> {
        amendment.validate()?;

        let uuid = amendment.id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO amendments (uuid, lead_motion_uuid, state_merge, recommendation_merge)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (uuid) DO UPDATE SET
                lead_motion_uuid = excluded.lead_motion_uuid,
                state_merge = excluded.state_merge,
                recommendation_merge = excluded.recommendation_merge;",
            params![
                uuid,
                amendment.lead_motion_id.to_string(),
                amendment.state_merge.as_str(),
                amendment.recommendation_merge.as_str(),
            ],
        )?;
        tx.execute(
            "DELETE FROM amendment_paragraphs WHERE amendment_uuid = ?1;",
            [uuid.as_str()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO amendment_paragraphs (amendment_uuid, paragraph_no, text)
                 VALUES (?1, ?2, ?3);",
            )?;
            for (paragraph_no, text) in &amendment.paragraphs {
                let paragraph_no = i64::try_from(*paragraph_no).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "paragraph index `{paragraph_no}` does not fit amendment_paragraphs.paragraph_no"
                    ))
                })?;
                insert.execute(params![uuid, paragraph_no, text.as_str()])?;
            }
        }
        tx.commit()?;

        Ok(amendment.id)
    }

    fn load_paragraphs(&self, amendment_uuid: &str) -> RepoResult<BTreeMap<usize, String>> {
        let mut stmt = self.conn.prepare(
            "SELECT paragraph_no, text
             FROM amendment_paragraphs
             WHERE amendment_uuid = ?1
             ORDER BY paragraph_no ASC;",
        )?;
        let mut rows = stmt.query([amendment_uuid])?;
        let mut paragraphs = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let raw: i64 = row.get("paragraph_no")?;
            let paragraph_no = usize::try_from(raw).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid paragraph index `{raw}` in amendment_paragraphs.paragraph_no"
                ))
            })?;
            paragraphs.insert(paragraph_no, row.get("text")?);
        }
        Ok(paragraphs)
    }

    fn parse_amendment_row(&self, row: &Row<'_>) -> RepoResult<Amendment> {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_uuid(&uuid_text, "amendments.uuid")?;
        let lead_text: String = row.get("lead_motion_uuid")?;
        let amendment = Amendment {
            id,
            lead_motion_id: parse_uuid(&lead_text, "amendments.lead_motion_uuid")?,
            paragraphs: self.load_paragraphs(&uuid_text)?,
            state_merge: parse_merge_state(row, "state_merge")?,
            recommendation_merge: parse_merge_state(row, "recommendation_merge")?,
        };
        amendment.validate()?;
        Ok(amendment)
    }
}

impl MotionRepository for SqliteMotionRepository<'_> {
    fn get_motion(&self, id: MotionId) -> RepoResult<Option<Motion>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MOTION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_motion_row(row)?));
        }
        Ok(None)
    }

    fn list_recommendations(&self, target_id: Uuid) -> RepoResult<Vec<ChangeRecommendation>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECOMMENDATION_SELECT_SQL}
             WHERE target_uuid = ?1
             ORDER BY line_from ASC, line_to ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([target_id.to_string()])?;
        let mut recommendations = Vec::new();
        while let Some(row) = rows.next()? {
            recommendations.push(parse_recommendation_row(row)?);
        }
        Ok(recommendations)
    }

    fn list_amendments(&self, lead_motion_id: MotionId) -> RepoResult<Vec<Amendment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AMENDMENT_SELECT_SQL}
             WHERE lead_motion_uuid = ?1
             ORDER BY uuid ASC;"
        ))?;
        let mut rows = stmt.query([lead_motion_id.to_string()])?;
        let mut amendments = Vec::new();
        while let Some(row) = rows.next()? {
            amendments.push(self.parse_amendment_row(row)?);
        }
        Ok(amendments)
    }

    fn get_amendment(&self, id: AmendmentId) -> RepoResult<Option<Amendment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AMENDMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        stmt.query_row([id.to_string()], |row| Ok(self.parse_amendment_row(row)))
            .optional()?
            .transpose()
    }
}

fn parse_motion_row(row: &Row<'_>) -> RepoResult<Motion> {
    let uuid_text: String = row.get("uuid")?;
    let motion = Motion {
        id: parse_uuid(&uuid_text, "motions.uuid")?,
        title: row.get("title")?,
        text: row.get("text")?,
        first_line: parse_line(row, "first_line")?,
        modified_final_version: row.get("modified_final_version")?,
    };
    motion.validate()?;
    Ok(motion)
}

fn parse_recommendation_row(row: &Row<'_>) -> RepoResult<ChangeRecommendation> {
    let uuid_text: String = row.get("uuid")?;
    let target_text: String = row.get("target_uuid")?;
    let type_text: String = row.get("type")?;
    let kind = RecommendationKind::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid recommendation type `{type_text}` in change_recommendations.type"
        ))
    })?;

    let recommendation = ChangeRecommendation {
        id: parse_uuid(&uuid_text, "change_recommendations.uuid")?,
        target_id: parse_uuid(&target_text, "change_recommendations.target_uuid")?,
        line_from: parse_line(row, "line_from")?,
        line_to: parse_line(row, "line_to")?,
        text: row.get("text")?,
        kind,
        internal: parse_flag(row, "internal")?,
        rejected: parse_flag(row, "rejected")?,
    };
    recommendation.validate()?;
    Ok(recommendation)
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_line(row: &Row<'_>, column: &str) -> RepoResult<u32> {
    let raw: i64 = row.get(column)?;
    u32::try_from(raw)
        .map_err(|_| RepoError::InvalidData(format!("invalid line number `{raw}` in {column}")))
}

fn parse_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn parse_merge_state(row: &Row<'_>, column: &str) -> RepoResult<MergeState> {
    let value: String = row.get(column)?;
    MergeState::parse(&value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid merge state `{value}` in amendments.{column}"))
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{MotionRepository, SqliteMotionRepository};
    use crate::db::open_db_in_memory;
    use crate::model::amendment::{Amendment, MergeState};
    use crate::model::motion::Motion;
    use crate::model::recommendation::{ChangeRecommendation, RecommendationKind};
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn snapshot_collects_nested_recommendations() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteMotionRepository::new(&conn);

        let motion = Motion::new("Title", "<p>one two</p>");
        repo.save_motion(&motion).expect("save motion");
        let amendment = Amendment::new(motion.id)
            .with_paragraph(0, "<p>one three</p>")
            .with_merge_states(MergeState::Yes, MergeState::Undefined);
        repo.save_amendment(&amendment).expect("save amendment");

        let mut on_motion = ChangeRecommendation::new(motion.id, 1, 2, "<p>x</p>");
        on_motion.kind = RecommendationKind::Deletion;
        on_motion.internal = true;
        repo.save_recommendation(&on_motion).expect("save recommendation");
        let on_amendment = ChangeRecommendation::new(amendment.id, 1, 2, "<p>y</p>");
        repo.save_recommendation(&on_amendment)
            .expect("save recommendation");

        let snapshot = repo.load_snapshot(motion.id).expect("load snapshot");
        assert_eq!(snapshot.motion, motion);
        assert_eq!(snapshot.recommendations, vec![on_motion]);
        assert_eq!(snapshot.amendments.len(), 1);
        assert_eq!(snapshot.amendments[0].amendment, amendment);
        assert_eq!(snapshot.amendments[0].recommendations, vec![on_amendment]);
    }

    #[test]
    fn saving_amendment_replaces_paragraph_set() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteMotionRepository::new(&conn);
        let motion = Motion::new("Title", "<p>a</p><p>b</p>");
        repo.save_motion(&motion).expect("save motion");

        let amendment = Amendment::new(motion.id)
            .with_paragraph(0, "<p>A</p>")
            .with_paragraph(1, "<p>B</p>");
        repo.save_amendment(&amendment).expect("first save");
        let mut narrowed = amendment.clone();
        narrowed.paragraphs.remove(&0);
        repo.save_amendment(&narrowed).expect("second save");

        let loaded = repo
            .get_amendment(amendment.id)
            .expect("query")
            .expect("exists");
        assert_eq!(loaded.paragraphs.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn missing_records_are_reported() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteMotionRepository::new(&conn);
        let id = Uuid::new_v4();
        assert!(repo.get_motion(id).expect("query").is_none());
        assert!(repo.get_amendment(id).expect("query").is_none());
        assert!(matches!(repo.load_snapshot(id), Err(RepoError::NotFound(found)) if found == id));
        assert!(matches!(
            repo.delete_recommendation(id),
            Err(RepoError::NotFound(_))
        ));
    }

    #[test]
    fn invalid_records_are_not_written() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteMotionRepository::new(&conn);
        let inverted = ChangeRecommendation::new(Uuid::new_v4(), 4, 2, "");
        assert!(matches!(
            repo.save_recommendation(&inverted),
            Err(RepoError::Validation(_))
        ));
    }

    #[test]
    fn corrupt_rows_surface_as_invalid_data() {
        let conn = open_db_in_memory().expect("open db");
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO motions (uuid, title, text, first_line) VALUES (?1, 'T', '<p>x</p>', 1);",
            [id.to_string()],
        )
        .expect("insert");
        conn.execute(
            "INSERT INTO change_recommendations (uuid, target_uuid, line_from, line_to, text, type)
             VALUES ('not-a-uuid', ?1, 1, 2, 'x', 'replacement');",
            [id.to_string()],
        )
        .expect("insert");

        let repo = SqliteMotionRepository::new(&conn);
        assert!(matches!(
            repo.list_recommendations(id),
            Err(RepoError::InvalidData(_))
        ));
    }
}
