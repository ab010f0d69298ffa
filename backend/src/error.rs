use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::typed_header::TypedHeaderRejection;
use serde_json::{json, Map, Value};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Database error")]
    DatabaseError(sqlx::Error),

    #[error("Authentication error")]
    JwtError(jsonwebtoken::errors::Error),

    #[error("Authentication error")]
    PasswordError(bcrypt::BcryptError),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Resource not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(ValidationErrors),
}

/// Renders validation failures as `{ "field": ["message", ...] }`.
pub fn field_messages(errors: &ValidationErrors) -> Value {
    let mut body = Map::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| match &e.message {
                Some(message) => Value::String(message.to_string()),
                None => Value::String(e.code.to_string()),
            })
            .collect();
        body.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(body)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::JwtError(e) => {
                tracing::error!("Token encoding error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Token error".to_string(),
                )
            }
            AppError::PasswordError(e) => {
                tracing::error!("Password hashing error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Password hashing error".to_string(),
                )
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected malformed request: {}", msg);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "non_field_errors": [msg] })),
                )
                    .into_response();
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            AppError::ValidationError(errors) => {
                tracing::info!("Validation failed: {}", errors.to_string().replace('\n', ", "));
                return (StatusCode::BAD_REQUEST, Json(field_messages(&errors))).into_response();
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// From implementations for '?' conversion in handlers
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DatabaseError(e)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::ValidationError(errors)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::JwtError(e)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::PasswordError(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

// A lead id that doesn't parse can't match any row.
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::NotFound
    }
}

// Absent, non-Bearer and unparsable Authorization headers are all a failed login.
impl From<TypedHeaderRejection> for AppError {
    fn from(rejection: TypedHeaderRejection) -> Self {
        tracing::debug!("Rejected Authorization header: {}", rejection);
        AppError::Unauthorized
    }
}
