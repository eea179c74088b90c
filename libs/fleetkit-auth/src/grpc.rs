//! Claims over gRPC metadata.

use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::headers::parse_claims;
use crate::{Claims, REGION_NAME_HEADER, TENANT_ID_HEADER, USER_ID_HEADER};

fn metadata_str<'a>(meta: &'a MetadataMap, key: &str) -> Option<&'a str> {
    meta.get(key).and_then(|v| v.to_str().ok())
}

/// Best-effort claims from incoming metadata.
///
/// Returns `None` unless `x-user-id` is a valid `u32`. Tenant and region are
/// filled in when present and well-formed and left at their defaults otherwise.
#[must_use]
pub fn claims_from_metadata(meta: &MetadataMap) -> Option<Claims> {
    let user_id = metadata_str(meta, USER_ID_HEADER)?.parse::<u32>().ok()?;
    let tenant_id = metadata_str(meta, TENANT_ID_HEADER)
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or_default();
    let region_name = metadata_str(meta, REGION_NAME_HEADER)
        .unwrap_or_default()
        .to_owned();

    Some(Claims {
        user_id,
        tenant_id,
        region_name,
    })
}

/// Write claims into outgoing metadata using the same keys the servers read.
///
/// A zero tenant and an empty region are omitted.
///
/// # Errors
/// Returns `Status::internal` if the region name is not valid metadata.
pub fn attach_claims(meta: &mut MetadataMap, claims: &Claims) -> Result<(), Status> {
    meta.insert(USER_ID_HEADER, ascii_value(&claims.user_id.to_string())?);
    if claims.has_tenant() {
        meta.insert(TENANT_ID_HEADER, ascii_value(&claims.tenant_id.to_string())?);
    }
    if !claims.region_name.is_empty() {
        meta.insert(REGION_NAME_HEADER, ascii_value(&claims.region_name)?);
    }
    Ok(())
}

fn ascii_value(raw: &str) -> Result<AsciiMetadataValue, Status> {
    raw.parse::<AsciiMetadataValue>()
        .map_err(|e| Status::internal(format!("claims metadata encode: {e}")))
}

/// Claims stored on a request by [`ClaimsInterceptor`].
#[must_use]
pub fn request_claims<T>(request: &Request<T>) -> Option<&Claims> {
    request.extensions().get::<Claims>()
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Lenient,
    Required { need_tenant: bool },
}

/// Server interceptor that stores [`Claims`] in the request extensions.
///
/// ```ignore
/// let svc = FileServiceServer::with_interceptor(handler, ClaimsInterceptor::lenient());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClaimsInterceptor {
    mode: Mode,
}

impl ClaimsInterceptor {
    /// Never rejects; claims are stored only when the user id is valid.
    #[must_use]
    pub fn lenient() -> Self {
        Self { mode: Mode::Lenient }
    }

    /// Rejects like the HTTP middleware: unauthenticated for a bad user id,
    /// invalid-argument for a bad tenant id when `need_tenant` is set.
    #[must_use]
    pub fn required(need_tenant: bool) -> Self {
        Self {
            mode: Mode::Required { need_tenant },
        }
    }
}

impl Interceptor for ClaimsInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let claims = match self.mode {
            Mode::Lenient => claims_from_metadata(request.metadata()),
            Mode::Required { need_tenant } => {
                let meta = request.metadata();
                let parsed = parse_claims(|key| metadata_str(meta, key), need_tenant)
                    .map_err(|e| {
                        tracing::debug!(error = %e, "grpc request rejected");
                        e.to_status()
                    })?;
                Some(parsed)
            }
        };

        if let Some(claims) = claims {
            request.extensions_mut().insert(claims);
        }
        Ok(request)
    }
}
