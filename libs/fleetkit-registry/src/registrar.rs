//! Registry contract and the port-mapping decorator.

use async_trait::async_trait;

use crate::{PortMap, RegistryError, ServiceInstance, rewrite_endpoints};

/// Publishes service instances to a registry.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError>;

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError>;
}

/// Resolves a service name to its healthy instances.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn get_service(&self, name: &str) -> Result<Vec<ServiceInstance>, RegistryError>;
}

/// Registrar decorator that publishes host-reachable endpoints.
///
/// `register` rewrites the instance's endpoints to `host` plus mapped ports
/// and then delegates; `deregister` is forwarded untouched. With an empty host
/// the decorator is transparent.
pub struct PortMappingRegistrar<R> {
    inner: R,
    host: String,
    port_map: PortMap,
}

impl<R: Registrar> PortMappingRegistrar<R> {
    pub fn new(inner: R, host: impl Into<String>, port_map: PortMap) -> Self {
        Self {
            inner,
            host: host.into(),
            port_map,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port_map(&self) -> &PortMap {
        &self.port_map
    }

    #[must_use]
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: Registrar> Registrar for PortMappingRegistrar<R> {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        if self.host.is_empty() {
            return self.inner.register(instance).await;
        }

        let mut rewritten = instance.clone();
        rewritten.endpoints = rewrite_endpoints(&instance.endpoints, &self.host, &self.port_map);

        tracing::info!(
            service = %rewritten.name,
            endpoints = ?rewritten.endpoints,
            "registering service"
        );
        self.inner.register(&rewritten).await
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        self.inner.deregister(instance).await
    }
}
