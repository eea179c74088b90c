//! Caller identity for FleetKit services
//!
//! The edge gateway authenticates users and forwards the result as trusted
//! headers (`x-user-id`, `x-tenant-id`, `x-region-name`). This crate turns
//! those headers into [`Claims`] on the way in and writes them back out on
//! outbound gRPC calls.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[cfg(feature = "axum-ext")]
pub mod axum_ext;
pub mod claims;
pub mod errors;
pub mod grpc;
pub mod headers;

#[cfg(feature = "axum-ext")]
pub use axum_ext::{AuthClaims, ClaimsPolicy, require_claims};
pub use claims::{Claims, REGION_NAME_HEADER, TENANT_ID_HEADER, USER_ID_HEADER};
pub use errors::AuthError;
pub use grpc::{ClaimsInterceptor, attach_claims, claims_from_metadata};
pub use headers::claims_from_headers;
