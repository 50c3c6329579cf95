use serde::{Serialize, de::DeserializeOwned};

use super::view::{OfferingRow, RegistrationRow, SelectOption, SelectOptions};
use crate::error::ValidationError;
use crate::models::{
    Course, CourseType, NameDraft, NameFields, Offering, OfferingDraft, OfferingFields,
    OfferingRecord, Registration, RegistrationDraft, RegistrationFields,
};
use crate::resolve::Lookups;
use crate::store::Table;

/// What a panel needs to know about the entity it manages.
pub trait PanelEntity: Clone + Send + Sync + 'static {
    const TABLE: Table;
    const TITLE: &'static str;
    /// Tables cached into `Lookups` to resolve this entity's labels.
    const DEPENDENCIES: &'static [Table];

    /// Shape of a row as the store returns it.
    type Record: DeserializeOwned + Send;
    type Draft: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Shape of a row as the store accepts it.
    type Fields: Serialize + Send + Sync;
    type Row: Serialize + Send;

    fn from_record(record: Self::Record) -> Self;
    fn id(&self) -> i64;
    fn draft(&self) -> Self::Draft;

    /// Advisory required-field checks; turns a draft into writable fields.
    fn validate(draft: &Self::Draft, lookups: &Lookups) -> Result<Self::Fields, ValidationError>;

    fn display(&self, lookups: &Lookups) -> Self::Row;

    fn options(_lookups: &Lookups) -> SelectOptions {
        SelectOptions::default()
    }

    fn can_submit(_lookups: &Lookups) -> bool {
        true
    }
}

fn name_fields(draft: &NameDraft) -> Result<NameFields, ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(NameFields {
        name: draft.name.clone(),
    })
}

fn course_type_options(lookups: &Lookups) -> Vec<SelectOption> {
    lookups
        .course_types
        .iter()
        .map(|t| SelectOption {
            value: t.id,
            label: t.name.clone(),
        })
        .collect()
}

fn course_options(lookups: &Lookups) -> Vec<SelectOption> {
    lookups
        .courses
        .iter()
        .map(|c| SelectOption {
            value: c.id,
            label: c.name.clone(),
        })
        .collect()
}

impl PanelEntity for CourseType {
    const TABLE: Table = Table::CourseTypes;
    const TITLE: &'static str = "Course Types";
    const DEPENDENCIES: &'static [Table] = &[];

    type Record = CourseType;
    type Draft = NameDraft;
    type Fields = NameFields;
    type Row = CourseType;

    fn from_record(record: Self::Record) -> Self {
        record
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn draft(&self) -> Self::Draft {
        NameDraft {
            name: self.name.clone(),
        }
    }

    fn validate(draft: &Self::Draft, _lookups: &Lookups) -> Result<Self::Fields, ValidationError> {
        name_fields(draft)
    }

    fn display(&self, _lookups: &Lookups) -> Self::Row {
        self.clone()
    }
}

impl PanelEntity for Course {
    const TABLE: Table = Table::Courses;
    const TITLE: &'static str = "Courses";
    const DEPENDENCIES: &'static [Table] = &[];

    type Record = Course;
    type Draft = NameDraft;
    type Fields = NameFields;
    type Row = Course;

    fn from_record(record: Self::Record) -> Self {
        record
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn draft(&self) -> Self::Draft {
        NameDraft {
            name: self.name.clone(),
        }
    }

    fn validate(draft: &Self::Draft, _lookups: &Lookups) -> Result<Self::Fields, ValidationError> {
        name_fields(draft)
    }

    fn display(&self, _lookups: &Lookups) -> Self::Row {
        self.clone()
    }
}

impl PanelEntity for Offering {
    const TABLE: Table = Table::Offerings;
    const TITLE: &'static str = "Course Offerings";
    const DEPENDENCIES: &'static [Table] = &[Table::CourseTypes, Table::Courses];

    type Record = OfferingRecord;
    type Draft = OfferingDraft;
    type Fields = OfferingFields;
    type Row = OfferingRow;

    fn from_record(record: Self::Record) -> Self {
        Offering::from(record)
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn draft(&self) -> Self::Draft {
        OfferingDraft {
            course_id: Some(self.course_id),
            course_type_id: Some(self.course_type_id),
        }
    }

    fn validate(draft: &Self::Draft, lookups: &Lookups) -> Result<Self::Fields, ValidationError> {
        if !Self::can_submit(lookups) {
            return Err(ValidationError::NoCourseOptions);
        }
        match (draft.course_id, draft.course_type_id) {
            (Some(course_id), Some(course_type_id)) => {
                Ok(OfferingFields::new(course_id, course_type_id))
            }
            _ => Err(ValidationError::MissingSelection),
        }
    }

    fn display(&self, lookups: &Lookups) -> Self::Row {
        OfferingRow {
            id: self.id,
            course_id: self.course_id,
            course_type_id: self.course_type_id,
            label: lookups.offering_label(self),
        }
    }

    fn options(lookups: &Lookups) -> SelectOptions {
        SelectOptions {
            course_types: course_type_options(lookups),
            courses: course_options(lookups),
            ..SelectOptions::default()
        }
    }

    fn can_submit(lookups: &Lookups) -> bool {
        !lookups.courses.is_empty() && !lookups.course_types.is_empty()
    }
}

impl PanelEntity for Registration {
    const TABLE: Table = Table::Registrations;
    const TITLE: &'static str = "Student Registration";
    const DEPENDENCIES: &'static [Table] = &[Table::Offerings, Table::CourseTypes, Table::Courses];

    type Record = Registration;
    type Draft = RegistrationDraft;
    type Fields = RegistrationFields;
    type Row = RegistrationRow;

    fn from_record(record: Self::Record) -> Self {
        record
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn draft(&self) -> Self::Draft {
        RegistrationDraft {
            student: self.student.clone(),
            offering_id: Some(self.offering_id),
        }
    }

    fn validate(draft: &Self::Draft, lookups: &Lookups) -> Result<Self::Fields, ValidationError> {
        if !Self::can_submit(lookups) {
            return Err(ValidationError::NoOfferings);
        }
        if draft.student.trim().is_empty() {
            return Err(ValidationError::MissingStudent);
        }
        let offering_id = draft.offering_id.ok_or(ValidationError::MissingOffering)?;
        Ok(RegistrationFields {
            student: draft.student.clone(),
            offering_id,
        })
    }

    fn display(&self, lookups: &Lookups) -> Self::Row {
        let label = lookups.registration_label(Some(self.offering_id));
        RegistrationRow {
            id: self.id,
            student: self.student.clone(),
            offering_id: self.offering_id,
            display: format!("{} — {}", self.student, label),
            label,
        }
    }

    fn options(lookups: &Lookups) -> SelectOptions {
        SelectOptions {
            offerings: lookups
                .offerings
                .iter()
                .map(|o| SelectOption {
                    value: o.id,
                    label: lookups.registration_label(Some(o.id)),
                })
                .collect(),
            no_offerings_available: lookups.offerings.is_empty(),
            ..SelectOptions::default()
        }
    }

    fn can_submit(lookups: &Lookups) -> bool {
        !lookups.offerings.is_empty()
    }
}
