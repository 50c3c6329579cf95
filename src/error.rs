use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::Table;

/// A required form field was missing; the store was never called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a name")]
    EmptyName,

    #[error("Please enter a student name")]
    MissingStudent,

    #[error("Please select both course and type")]
    MissingSelection,

    #[error("Please select a course offering")]
    MissingOffering,

    #[error("Add a course and a course type before creating offerings")]
    NoCourseOptions,

    #[error("No offerings available")]
    NoOfferings,

    #[error("Row {0} is not listed")]
    UnknownRow(i64),

    #[error("No row is being edited")]
    NotEditing,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed {table} row: {source}")]
    Codec {
        table: Table,
        source: serde_json::Error,
    },

    #[error("No row {id} in {table}")]
    NotFound { table: Table, id: i64 },

    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Failure of a single panel action.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<PanelError> for AppError {
    fn from(err: PanelError) -> Self {
        match err {
            PanelError::Validation(e) => AppError::Validation(e),
            PanelError::Store(e) => AppError::Store(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e @ StoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Store(e) => {
                error!("store error: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
