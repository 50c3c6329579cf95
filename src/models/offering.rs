use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An offering as the panels see it: a course paired with a course type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub id: i64,
    pub course_id: i64,
    pub course_type_id: i64,
}

/// An offering row as stored. The store names its foreign keys `course` and
/// `course_type`; convert with `Offering::from` on the way in and
/// `OfferingFields::new` on the way out, nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OfferingRecord {
    pub id: i64,
    pub course: i64,
    pub course_type: i64,
}

impl From<OfferingRecord> for Offering {
    fn from(record: OfferingRecord) -> Self {
        Self {
            id: record.id,
            course_id: record.course,
            course_type_id: record.course_type,
        }
    }
}

/// Select-box state for adding or editing an offering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferingDraft {
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub course_type_id: Option<i64>,
}

/// Writable offering columns, keyed the way the store expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferingFields {
    pub course: i64,
    pub course_type: i64,
}

impl OfferingFields {
    pub fn new(course_id: i64, course_type_id: i64) -> Self {
        Self {
            course: course_id,
            course_type: course_type_id,
        }
    }
}
