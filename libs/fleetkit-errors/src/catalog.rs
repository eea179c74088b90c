//! Business error catalog shared across the fleet.
//!
//! Every service answers the same failure with the same status, code and
//! default message, so clients can branch on `code` alone.

use crate::problem::Problem;
use http::StatusCode;

/// Static error definition from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub message: &'static str,
}

impl ErrDef {
    /// HTTP status for this definition, `500` if the stored code is not a valid status.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Build a problem carrying the catalog's default message.
    pub fn problem(&self) -> Problem {
        self.problem_with(self.message)
    }

    /// Build a problem with a request-specific detail.
    pub fn problem_with(&self, detail: impl Into<String>) -> Problem {
        Problem::new(self.status_code(), self.title, detail).with_code(self.code)
    }
}

pub const SYSTEM_ERROR: ErrDef = ErrDef {
    status: 500,
    title: "Internal Server Error",
    code: "SYSTEM_ERROR",
    message: "system error, please retry later",
};

pub const AUTH_HEADER_MISSING: ErrDef = ErrDef {
    status: 401,
    title: "Unauthorized",
    code: "AUTH_HEADER_MISSING",
    message: "authentication header is missing",
};

pub const AUTH_HEADER_INVALID: ErrDef = ErrDef {
    status: 401,
    title: "Unauthorized",
    code: "AUTH_HEADER_INVALID",
    message: "authentication header is invalid",
};

pub const TENANT_MISSING: ErrDef = ErrDef {
    status: 400,
    title: "Bad Request",
    code: "TENANT_MISSING",
    message: "tenant is required for this operation",
};

pub const TENANT_INVALID: ErrDef = ErrDef {
    status: 400,
    title: "Bad Request",
    code: "TENANT_INVALID",
    message: "tenant id is invalid",
};

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn catalog_entry_builds_problem_with_default_message() {
        let problem = TENANT_MISSING.problem();
        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        assert_eq!(problem.code, "TENANT_MISSING");
        assert_eq!(problem.detail, TENANT_MISSING.message);
    }

    #[test]
    fn custom_detail_overrides_message() {
        let problem = AUTH_HEADER_MISSING.problem_with("X-User-ID header is missing");
        assert_eq!(problem.status, StatusCode::UNAUTHORIZED);
        assert_eq!(problem.title, "Unauthorized");
        assert_eq!(problem.detail, "X-User-ID header is missing");
    }

    #[test]
    fn invalid_status_falls_back_to_500() {
        let def = ErrDef {
            status: 1000,
            title: "Broken",
            code: "BROKEN",
            message: "broken",
        };
        assert_eq!(def.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
