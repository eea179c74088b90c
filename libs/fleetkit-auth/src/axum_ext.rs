//! Axum extractor and middleware for claims

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{AuthError, Claims, claims_from_headers};

/// Extractor for [`Claims`]; fails with `SYSTEM_ERROR` if [`require_claims`] did not run.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthClaims)
            .ok_or_else(|| {
                AuthError::Internal("Claims not found - claims middleware not configured".to_owned())
            })
    }
}

/// Per-router requirements for [`require_claims`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsPolicy {
    pub need_tenant: bool,
}

impl ClaimsPolicy {
    #[must_use]
    pub fn user_only() -> Self {
        Self { need_tenant: false }
    }

    #[must_use]
    pub fn with_tenant() -> Self {
        Self { need_tenant: true }
    }
}

/// Rejects requests without valid identity headers and stores [`Claims`]
/// in the request extensions otherwise.
///
/// ```ignore
/// let app = Router::new()
///     .route("/files", get(list_files))
///     .layer(axum::middleware::from_fn_with_state(ClaimsPolicy::with_tenant(), require_claims));
/// ```
pub async fn require_claims(
    State(policy): State<ClaimsPolicy>,
    mut request: Request,
    next: Next,
) -> Response {
    match claims_from_headers(request.headers(), policy.need_tenant) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, path = %request.uri().path(), "request rejected");
            err.into_response()
        }
    }
}
