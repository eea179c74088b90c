#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod client;

pub use client::{
    GrpcClientConfig, connect_lazy, connect_with_stack, registry_uri_to_transport,
};
