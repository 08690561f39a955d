//! Service layer errors
//!
//! Services fail with [`ServiceError`]; the variants carry enough context
//! for an adapter to render a status code and stable error code without
//! inspecting message strings.

use std::fmt;

use warband_common::AppError;
use warband_core::DomainError;

#[derive(Debug)]
pub enum ServiceError {
    /// A domain rule rejected the operation
    Domain(DomainError),
    /// Propagated application error
    App(AppError),
    NotFound { resource: &'static str, id: String },
    PermissionDenied { permission: String },
    Validation(String),
    Conflict(String),
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::PermissionDenied { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
            Self::App(e) => e.status_code(),
            Self::Domain(e) if e.is_validation() => 400,
            Self::Domain(e) if e.is_authorization() => 403,
            Self::Domain(e) if e.is_not_found() => 404,
            Self::Domain(e) if e.is_conflict() => 409,
            Self::Domain(_) => 500,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PermissionDenied { .. } => "MISSING_PERMISSIONS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => e.fmt(f),
            Self::App(e) => e.fmt(f),
            Self::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            Self::PermissionDenied { permission } => {
                write!(f, "Missing required permission: {permission}")
            }
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::NotFound { resource, id } => {
                AppError::NotFound(format!("{resource} {id}"))
            }
            ServiceError::PermissionDenied { .. } => AppError::InsufficientPermissions,
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_core::Snowflake;

    #[test]
    fn test_constructors_and_codes() {
        let err = ServiceError::not_found("War", "123");
        assert_eq!((err.status_code(), err.error_code()), (404, "NOT_FOUND"));
        assert_eq!(err.to_string(), "War not found: 123");

        let err = ServiceError::permission_denied("delete_war");
        assert_eq!(
            (err.status_code(), err.error_code()),
            (403, "MISSING_PERMISSIONS")
        );
    }

    #[test]
    fn test_domain_errors_classify() {
        let conflict = ServiceError::from(DomainError::WarAlreadyFinished);
        assert_eq!(conflict.status_code(), 409);
        assert_eq!(conflict.error_code(), "WAR_ALREADY_FINISHED");

        let missing = ServiceError::from(DomainError::WarNotFound(Snowflake::new(1)));
        assert_eq!(missing.status_code(), 404);
    }

    #[test]
    fn test_status_survives_app_error_conversion() {
        let app: AppError = ServiceError::not_found("Guild", "456").into();
        assert_eq!(app.status_code(), 404);
    }
}
