//! Motion record.

use super::RecordValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MotionId = Uuid;

fn default_first_line() -> u32 {
    1
}

/// Motion text source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motion {
    pub id: MotionId,
    pub title: String,
    /// Rich-text markup; root content must be block elements.
    pub text: String,
    /// Number of the first body line.
    #[serde(default = "default_first_line")]
    pub first_line: u32,
    /// Editor-supplied override for the modified final view.
    #[serde(default)]
    pub modified_final_version: Option<String>,
}

impl Motion {
    /// Creates a motion with a generated ID, numbered from line 1.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, text)
    }

    /// Creates a motion with a caller-provided stable ID.
    pub fn with_id(id: MotionId, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
            first_line: default_first_line(),
            modified_final_version: None,
        }
    }

    /// Validates record invariants.
    ///
    /// # Errors
    /// - `InvalidFirstLine` when `first_line == 0`.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.first_line == 0 {
            return Err(RecordValidationError::InvalidFirstLine {
                motion_id: self.id,
                first_line: self.first_line,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Motion;

    #[test]
    fn deserializes_with_default_first_line() {
        let motion: Motion = serde_json::from_str(
            r#"{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","title":"T","text":"<p>x</p>"}"#,
        )
        .expect("valid json");
        assert_eq!(motion.first_line, 1);
        assert!(motion.modified_final_version.is_none());
        assert!(motion.validate().is_ok());
    }

    #[test]
    fn zero_first_line_is_invalid() {
        let mut motion = Motion::new("T", "<p>x</p>");
        motion.first_line = 0;
        assert!(motion.validate().is_err());
    }
}
