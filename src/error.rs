//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every handler returns `Result<_, AppError>`, so any failure is translated into one
//! of a small set of HTTP responses with a JSON body of the shape
//! `{"success": false, "message": "..."}` (plus `errors` for validation failures).
//!
//! Server-side failures (`DatabaseError`, `InternalServerError`) are logged in full and
//! reported to the client with a generic message only.
//!
//! `From` implementations for `validator::ValidationErrors`, [`TokenError`] and
//! [`StoreError`] allow handlers and services to use `?` directly.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::store::StoreError;

/// Message shown to clients for any 500-class failure.
pub const GENERIC_SERVER_ERROR: &str = "Something went wrong on the server!";

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Represents all possible errors that can occur within the application.
///
/// Each variant corresponds to a specific type of error, often carrying a message
/// detailing the issue. These errors are then converted into appropriate HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed input fields (HTTP 400), with one entry per offending field.
    ValidationError(Vec<FieldError>),
    /// A request that could not be parsed at all (HTTP 400).
    BadRequest(String),
    /// The request collides with existing state, e.g. a duplicate email (HTTP 400).
    Conflict(String),
    /// Missing, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but not the owner of the resource (HTTP 403).
    Forbidden(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Represents an error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
}

impl AppError {
    /// Client-facing message. Server-side details never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "Validation failed".to_string(),
            AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                GENERIC_SERVER_ERROR.to_string()
            }
        }
    }

    /// Shorthand for a validation failure on a single field.
    pub fn invalid_field(field: &str, message: &str) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                write!(f, "Validation Error: {}", fields.join(", "))
            }
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// This implementation allows Actix Web to automatically translate `AppError`
/// results from handlers into the correct HTTP status codes and JSON error responses.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::DatabaseError(detail) | AppError::InternalServerError(detail) = self {
            log::error!("request failed: {}", detail);
        }

        let body = match self {
            AppError::ValidationError(errors) => json!({
                "success": false,
                "message": self.public_message(),
                "errors": errors,
            }),
            _ => json!({
                "success": false,
                "message": self.public_message(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// Only field-level errors are produced by the request types in this crate; entries
/// are sorted by field name so responses are stable.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationError(fields)
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Expired => AppError::Unauthorized("Token expired".into()),
            TokenError::Invalid(_) => AppError::Unauthorized("Invalid token".into()),
            TokenError::Create(msg) => {
                AppError::InternalServerError(format!("token creation failed: {}", msg))
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::DuplicateEmail => AppError::Conflict("User already exists".into()),
            StoreError::Database(e) => AppError::DatabaseError(e.to_string()),
            StoreError::Migration(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(error: AppError) -> serde_json::Value {
        let response = error.error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_responses() {
        assert_eq!(
            AppError::invalid_field("title", "Title is required")
                .error_response()
                .status(),
            400
        );
        assert_eq!(
            AppError::Conflict("User already exists".into())
                .error_response()
                .status(),
            400
        );
        assert_eq!(
            AppError::Unauthorized("Invalid token".into())
                .error_response()
                .status(),
            401
        );
        assert_eq!(
            AppError::Forbidden("Not authorized".into())
                .error_response()
                .status(),
            403
        );
        assert_eq!(
            AppError::NotFound("Task not found".into())
                .error_response()
                .status(),
            404
        );
        assert_eq!(
            AppError::DatabaseError("connection reset".into())
                .error_response()
                .status(),
            500
        );
    }

    #[actix_rt::test]
    async fn test_internal_detail_is_not_exposed() {
        let json = body_json(AppError::DatabaseError(
            "relation \"tasks\" does not exist".into(),
        ))
        .await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], GENERIC_SERVER_ERROR);
    }

    #[actix_rt::test]
    async fn test_validation_body_lists_fields() {
        let json = body_json(AppError::ValidationError(vec![
            FieldError {
                field: "email".into(),
                message: "Valid email is required".into(),
            },
            FieldError {
                field: "password".into(),
                message: "Password must be at least 6 characters".into(),
            },
        ]))
        .await;
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(json["errors"][0]["field"], "email");
        assert_eq!(json["errors"][1]["message"], "Password must be at least 6 characters");
    }

    #[test]
    fn test_token_errors_map_to_distinct_unauthorized_messages() {
        match AppError::from(TokenError::Expired) {
            AppError::Unauthorized(msg) => assert_eq!(msg, "Token expired"),
            other => panic!("unexpected: {:?}", other),
        }
        match AppError::from(TokenError::Invalid("InvalidSignature".into())) {
            AppError::Unauthorized(msg) => assert_eq!(msg, "Invalid token"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
