use fleetkit_errors::catalog::{
    AUTH_HEADER_INVALID, AUTH_HEADER_MISSING, SYSTEM_ERROR, TENANT_INVALID, TENANT_MISSING,
};
use fleetkit_errors::{ErrDef, Problem};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("X-User-ID header is missing")]
    UserMissing,

    #[error("Invalid X-User-ID format: {0}")]
    UserInvalid(String),

    #[error("X-Tenant-ID header is missing")]
    TenantMissing,

    #[error("Invalid X-Tenant-ID format: {0}")]
    TenantInvalid(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Catalog entry this error is reported as.
    #[must_use]
    pub fn err_def(&self) -> &'static ErrDef {
        match self {
            AuthError::UserMissing => &AUTH_HEADER_MISSING,
            AuthError::UserInvalid(_) => &AUTH_HEADER_INVALID,
            AuthError::TenantMissing => &TENANT_MISSING,
            AuthError::TenantInvalid(_) => &TENANT_INVALID,
            AuthError::Internal(_) => &SYSTEM_ERROR,
        }
    }

    /// Problem body sent to the client.
    ///
    /// Header problems name the header; tenant and internal problems keep the
    /// catalog message so nothing internal leaks.
    pub fn to_problem(&self) -> Problem {
        let def = self.err_def();
        match self {
            AuthError::UserMissing => def.problem_with("X-User-ID header is missing"),
            AuthError::UserInvalid(_) => def.problem_with("Invalid X-User-ID format"),
            AuthError::TenantMissing | AuthError::TenantInvalid(_) | AuthError::Internal(_) => {
                def.problem()
            }
        }
    }

    /// Equivalent gRPC status.
    #[must_use]
    pub fn to_status(&self) -> tonic::Status {
        let problem = self.to_problem();
        match self.err_def().status {
            401 => tonic::Status::unauthenticated(problem.detail),
            400 => tonic::Status::invalid_argument(problem.detail),
            _ => tonic::Status::internal(problem.detail),
        }
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        if let AuthError::Internal(reason) = &self {
            tracing::error!(reason = %reason, "claims unavailable");
        }
        self.to_problem().into_response()
    }
}
