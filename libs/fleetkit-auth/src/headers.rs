//! Strict claims parsing for inbound requests.

use http::HeaderMap;

use crate::{AuthError, Claims, REGION_NAME_HEADER, TENANT_ID_HEADER, USER_ID_HEADER};

/// Parse claims from any header-like source.
///
/// The user id is always required. The tenant id is only inspected when
/// `need_tenant` is set; otherwise it stays `0`. The region is taken as-is.
pub(crate) fn parse_claims<'a, F>(lookup: F, need_tenant: bool) -> Result<Claims, AuthError>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let raw_user = lookup(USER_ID_HEADER)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::UserMissing)?;
    let user_id = raw_user
        .parse::<u32>()
        .map_err(|_| AuthError::UserInvalid(raw_user.to_owned()))?;

    let tenant_id = if need_tenant {
        let raw_tenant = lookup(TENANT_ID_HEADER)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::TenantMissing)?;
        raw_tenant
            .parse::<u32>()
            .map_err(|_| AuthError::TenantInvalid(raw_tenant.to_owned()))?
    } else {
        0
    };

    Ok(Claims {
        user_id,
        tenant_id,
        region_name: lookup(REGION_NAME_HEADER).unwrap_or_default().to_owned(),
    })
}

/// Claims from HTTP request headers.
///
/// Header values that are not visible ASCII count as missing.
///
/// # Errors
/// - [`AuthError::UserMissing`] / [`AuthError::UserInvalid`] for `x-user-id`
/// - [`AuthError::TenantMissing`] / [`AuthError::TenantInvalid`] for
///   `x-tenant-id` when `need_tenant` is set
pub fn claims_from_headers(headers: &HeaderMap, need_tenant: bool) -> Result<Claims, AuthError> {
    parse_claims(
        |name| headers.get(name).and_then(|v| v.to_str().ok()),
        need_tenant,
    )
}
