use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Per-attribute validation messages, keyed by the offending attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(attribute, message);
        errors
    }

    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.0
            .entry(attribute.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, attribute: &str) -> Option<&[String]> {
        self.0.get(attribute).map(Vec::as_slice)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.0.contains_key(attribute)
    }

    /// `Ok(())` when nothing was collected, otherwise the collected errors
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (attribute, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", attribute, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
    Validation(FieldErrors),
    SerializationError(String),
    ConfigurationError(String),
}

impl AppError {
    /// Shorthand for a single-attribute validation failure
    pub fn invalid(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(FieldErrors::single(attribute, message))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::SerializationError(_)
            | AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation error: {}", errors),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::SerializationError(_)
            | AppError::ConfigurationError(_) => {
                tracing::error!("{}", self);
                json!({"error": "Internal server error", "status": status.as_u16()})
            }
            AppError::Validation(errors) => json!({
                "error": "The given data was invalid",
                "status": status.as_u16(),
                "errors": errors,
            }),
            AppError::NotFound(msg) | AppError::Conflict(msg) => {
                json!({"error": msg, "status": status.as_u16()})
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
