use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PanelMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Validation,
    Store,
}

/// Inline message shown on a panel after a failed action.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: i64,
    pub label: String,
}

/// Choices offered by a panel's select boxes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub course_types: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub courses: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub offerings: Vec<SelectOption>,
    /// Set on the registration panel when there is nothing to register for.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_offerings_available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferingRow {
    pub id: i64,
    pub course_id: i64,
    pub course_type_id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRow {
    pub id: i64,
    pub student: String,
    pub offering_id: i64,
    pub label: String,
    pub display: String,
}

/// Snapshot of a panel handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct PanelView<R, D> {
    pub title: &'static str,
    pub rows: Vec<R>,
    pub form: D,
    pub mode: PanelMode<D>,
    pub options: SelectOptions,
    pub can_submit: bool,
    pub notice: Option<Notice>,
}
