//! Client-side joins between the four tables.
//!
//! Foreign keys are looked up by scanning the cached rows, which stay small.
//! A key that matches nothing is not an error; it renders as a sentinel
//! label, one per hop.

use crate::models::{Course, CourseType, Offering};

pub const NOT_AVAILABLE: &str = "N/A";
pub const UNKNOWN_OFFERING: &str = "Unknown Offering";
pub const UNKNOWN_COURSE: &str = "Unknown Course";
pub const UNKNOWN_COURSE_TYPE: &str = "Unknown Course Type";

pub trait Labeled {
    fn id(&self) -> i64;
    fn label(&self) -> &str;
}

impl Labeled for Course {
    fn id(&self) -> i64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

impl Labeled for CourseType {
    fn id(&self) -> i64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Name of the row with the given id, or `sentinel` when the id is absent,
/// unmatched, or names a row whose label is empty.
pub fn resolve_label<'a, T: Labeled>(id: Option<i64>, rows: &'a [T], sentinel: &'a str) -> &'a str {
    id.and_then(|id| rows.iter().find(|row| row.id() == id))
        .map(Labeled::label)
        .filter(|label| !label.is_empty())
        .unwrap_or(sentinel)
}

/// `"<course type> - <course>"` as listed on the offerings panel.
pub fn offering_label(offering: &Offering, course_types: &[CourseType], courses: &[Course]) -> String {
    format!(
        "{} - {}",
        resolve_label(Some(offering.course_type_id), course_types, NOT_AVAILABLE),
        resolve_label(Some(offering.course_id), courses, NOT_AVAILABLE),
    )
}

/// Label for a registration's offering. A dangling offering short-circuits
/// to `UNKNOWN_OFFERING` without looking at courses or course types.
pub fn registration_label(
    offering_id: Option<i64>,
    offerings: &[Offering],
    course_types: &[CourseType],
    courses: &[Course],
) -> String {
    let Some(offering) = offering_id.and_then(|id| offerings.iter().find(|o| o.id == id)) else {
        return UNKNOWN_OFFERING.to_string();
    };

    format!(
        "{} - {}",
        resolve_label(Some(offering.course_type_id), course_types, UNKNOWN_COURSE_TYPE),
        resolve_label(Some(offering.course_id), courses, UNKNOWN_COURSE),
    )
}

/// Rows of the referenced tables a panel keeps cached for label lookups.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub course_types: Vec<CourseType>,
    pub courses: Vec<Course>,
    pub offerings: Vec<Offering>,
}

impl Lookups {
    pub fn offering_label(&self, offering: &Offering) -> String {
        offering_label(offering, &self.course_types, &self.courses)
    }

    pub fn registration_label(&self, offering_id: Option<i64>) -> String {
        registration_label(offering_id, &self.offerings, &self.course_types, &self.courses)
    }
}
