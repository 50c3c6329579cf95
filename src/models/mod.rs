pub mod course;
pub mod course_type;
pub mod offering;
pub mod registration;

pub use course::{Course, NameDraft, NameFields};
pub use course_type::CourseType;
pub use offering::{Offering, OfferingDraft, OfferingFields, OfferingRecord};
pub use registration::{Registration, RegistrationDraft, RegistrationFields};
