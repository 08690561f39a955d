//! Application-level error type
//!
//! Outer error surface for adapters sitting on top of the service layer.
//! Domain errors pass through transparently; everything else is one of a
//! small set of categories that map directly onto HTTP-style status codes.

use std::fmt;

use serde::Serialize;
use warband_core::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::InsufficientPermissions => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
            Self::Domain(e) if e.is_validation() => 400,
            Self::Domain(e) if e.is_authorization() => 403,
            Self::Domain(e) if e.is_not_found() => 404,
            Self::Domain(e) if e.is_conflict() => 409,
            Self::Domain(_) => 500,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller is at fault (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Wire shape of an error, for adapters that serialize failures
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use warband_core::Snowflake;

    #[test]
    fn test_category_status_codes() {
        assert_eq!(AppError::validation("bad date").status_code(), 400);
        assert_eq!(AppError::InsufficientPermissions.status_code(), 403);
        assert_eq!(AppError::not_found("war 9").status_code(), 404);
        assert_eq!(AppError::Conflict("pending war".into()).status_code(), 409);
        assert!(!AppError::internal(anyhow::anyhow!("boom")).is_client_error());
    }

    #[test]
    fn test_domain_errors_keep_their_code() {
        let err = AppError::from(DomainError::WarNotFound(Snowflake::new(1)));
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "UNKNOWN_WAR");

        let err = AppError::from(DomainError::WarAlreadyFinished);
        assert_eq!(err.status_code(), 409);

        let err = AppError::from(DomainError::MissingPermission("change_war".into()));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse::from(AppError::not_found("war 123"));
        assert_eq!(response.code, "NOT_FOUND");
        assert_eq!(response.message, "Resource not found: war 123");
        assert!(response.details.is_none());
    }
}
