//! Service registration for containerized FleetKit services
//!
//! A service inside a container advertises the ports it listens on, but the
//! registry must publish the host's address and the host-side ports. This
//! crate provides:
//! - [`rewrite_endpoints`]: host/port substitution with HTTP endpoints first
//! - [`PortMap`]: `"internal:external"` pairs collected from the environment
//! - [`Registrar`] / [`Discovery`]: the registry contract
//! - [`PortMappingRegistrar`]: decorator that rewrites before delegating
//! - [`ConsulRegistrar`] / [`ConsulDiscovery`]: Consul agent HTTP API backend
//!
//! ## Usage
//!
//! ```ignore
//! use fleetkit_registry::{new_consul_registrar, Registrar, ServiceInstance};
//!
//! let registrar = new_consul_registrar("127.0.0.1:8500", vec!["fleet".into()])?;
//! let instance = ServiceInstance::new("user-service", "1.4.0")
//!     .with_endpoint("grpc://0.0.0.0:9000")
//!     .with_endpoint("http://0.0.0.0:8000");
//! registrar.register(&instance).await?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod consul;
pub mod env;
pub mod error;
pub mod instance;
pub mod port_map;
pub mod registrar;
pub mod rewrite;

pub use consul::{ConsulConfig, ConsulDiscovery, ConsulRegistrar};
pub use env::{RegistrarEnv, detect_local_ip};
pub use error::RegistryError;
pub use instance::ServiceInstance;
pub use port_map::PortMap;
pub use registrar::{Discovery, PortMappingRegistrar, Registrar};
pub use rewrite::rewrite_endpoints;

/// Build the standard fleet registrar: Consul backend wrapped with port remapping.
///
/// The advertised host comes from `SERVICE_HOST`, falling back to the first
/// non-loopback IPv4 address of this machine. Port mappings come from
/// `HTTP_PORT_MAP` and `GRPC_PORT_MAP`.
///
/// # Errors
/// Returns [`RegistryError::Config`] if the Consul address is unusable or the
/// HTTP client cannot be built.
pub fn new_consul_registrar(
    consul_addr: &str,
    tags: Vec<String>,
) -> Result<PortMappingRegistrar<ConsulRegistrar>, RegistryError> {
    let consul = ConsulRegistrar::new(ConsulConfig::new(consul_addr).with_tags(tags))?;
    let env = RegistrarEnv::from_env();
    let host = env.service_host_or_local();
    let port_map = env.port_map();

    tracing::info!(
        consul = consul_addr,
        host = %host,
        mappings = port_map.len(),
        "consul registrar configured"
    );

    Ok(PortMappingRegistrar::new(consul, host, port_map))
}
