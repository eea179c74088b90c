#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Resource service SDK
//!
//! Client for `resource.v1.FileService`:
//! - Client (`ResourceClient`) with per-call timeout and claims propagation
//! - Transport seam (`FileTransport`) for tests and custom stacks
//! - Batch aggregation (`aggregate`) of per-file URL results
//! - Generated wire types and server stubs (`proto`)
//!
//! ## Usage
//!
//! ```ignore
//! use fleetkit_resource_sdk::{ResourceClient, ResourceClientConfig};
//!
//! let client = ResourceClient::connect_with_discovery(
//!     ResourceClientConfig::default(),
//!     &discovery,
//! )
//! .await?;
//! let urls = client.batch_get_file_urls(Some(&claims), &ids).await?;
//! ```

// === API TRAIT AND TYPES ===
mod api;
mod error;
mod models;
pub use api::FileTransport;
pub use error::ResourceError;
pub use models::{BatchGetFileUrlsRequest, DEFAULT_EXPIRES_IN, FileObject, FileUrlInfo};

// === CLIENT ===
mod client;
mod config;
mod transport;
pub use client::{MAX_BATCH_SIZE, ResourceClient};
pub use config::{DISCOVERY_SCHEME, ResourceClientConfig};

pub mod aggregate;
pub use aggregate::aggregate;

// === GRPC PROTO STUBS ===
/// Generated protobuf types for `resource.v1.FileService`
#[allow(clippy::all, clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("resource.v1");
}

pub use proto::file_service_server::{FileService, FileServiceServer};

/// Registry name of the resource service.
pub const SERVICE_NAME: &str = "resource-service";
