//! Error types for Spotly.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::onboarding::state::Step;

/// Message shown to the user for any failed onboarding commit.
pub const SUBMISSION_FAILED_MESSAGE: &str =
    "There was an error submitting your data. Please try again.";

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the external persistence / auth collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Request to {backend} failed during {operation}: {reason}")]
    Request {
        backend: String,
        operation: String,
        reason: String,
    },

    #[error("{backend} timed out during {operation} after {timeout:?}")]
    Timeout {
        backend: String,
        operation: String,
        timeout: Duration,
    },

    #[error("{backend} rejected {operation} with status {status}: {body}")]
    Rejected {
        backend: String,
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {backend}: {reason}")]
    InvalidResponse { backend: String, reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single field that blocked confirmation of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The standard error for an empty required field.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "This field is required")
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field-level problem found by a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Onboarding wizard errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// A required field was empty at confirm time.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Action {action} is not available on step {step}")]
    InvalidAction { step: Step, action: String },

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: Step, to: Step },

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// The profile update failed; the review insert was never attempted.
    #[error("Profile update failed: {0}")]
    ProfileWriteFailed(#[source] StoreError),

    /// The review insert failed after the profile was already marked onboarded.
    #[error("Review insert failed: {0}")]
    ReviewWriteFailed(#[source] StoreError),
}

impl WizardError {
    /// Whether this error came from a failed commit to the collaborator.
    pub fn is_commit_failure(&self) -> bool {
        matches!(self, Self::ProfileWriteFailed(_) | Self::ReviewWriteFailed(_))
    }

    /// The text safe to show the user. Commit failures collapse into one
    /// generic message; store detail stays in the logs.
    pub fn user_message(&self) -> String {
        if self.is_commit_failure() {
            SUBMISSION_FAILED_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<ValidationErrors> for WizardError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not signed in")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"error": self.to_string(), "redirect": "/auth/sign-up"}),
            ),
            ApiError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                serde_json::json!({"error": self.to_string()}),
            ),
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": self.to_string()}),
            ),
            ApiError::Conflict(_) => (
                StatusCode::CONFLICT,
                serde_json::json!({"error": self.to_string()}),
            ),
            ApiError::Wizard(WizardError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({"error": "Please fill in the required fields", "fields": errors}),
            ),
            ApiError::Wizard(e) if e.is_commit_failure() => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({"error": e.user_message()}),
            ),
            ApiError::Wizard(e) => (
                StatusCode::CONFLICT,
                serde_json::json!({"error": e.user_message()}),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": self.to_string()}),
            ),
            ApiError::Store(e) => {
                tracing::warn!(error = %e, "Store request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    serde_json::json!({"error": "Upstream service unavailable"}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for Spotly.
pub type Result<T> = std::result::Result<T, Error>;
