//! Consul agent HTTP API backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Discovery, Registrar, RegistryError, ServiceInstance};

const VERSION_TAG_PREFIX: &str = "version=";

/// Tagged-address keys Consul fills in by itself; not service endpoints.
const CONSUL_BUILTIN_ADDRESSES: [&str; 4] = ["lan_ipv4", "wan_ipv4", "lan_ipv6", "wan_ipv6"];

#[derive(Debug, Clone)]
pub struct ConsulConfig {
    /// Agent base URL, e.g. `http://127.0.0.1:8500`.
    pub address: String,
    pub tags: Vec<String>,
    pub health_check: bool,
    pub health_check_interval: Duration,
    pub health_check_timeout: Duration,
    pub deregister_critical_after: Duration,
    /// Per-request timeout against the agent.
    pub timeout: Duration,
}

impl ConsulConfig {
    /// Accepts `host:port` or a full URL; a missing scheme defaults to `http`.
    #[must_use]
    pub fn new(address: &str) -> Self {
        let address = address.trim().trim_end_matches('/');
        let address = if address.contains("://") {
            address.to_owned()
        } else {
            format!("http://{address}")
        };
        Self {
            address,
            tags: Vec::new(),
            health_check: true,
            health_check_interval: Duration::from_secs(10),
            health_check_timeout: Duration::from_secs(5),
            deregister_critical_after: Duration::from_secs(600),
            timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    #[must_use]
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    tags: Vec<String>,
    address: String,
    port: u16,
    meta: HashMap<String, String>,
    tagged_addresses: HashMap<String, ServiceAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    checks: Vec<AgentServiceCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceAddress {
    address: String,
    port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceCheck {
    #[serde(rename = "TCP")]
    tcp: String,
    interval: String,
    timeout: String,
    deregister_critical_service_after: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEntry {
    service: AgentService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentService {
    #[serde(rename = "ID")]
    id: String,
    service: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    meta: Option<HashMap<String, String>>,
    #[serde(default)]
    address: String,
    #[serde(default)]
    port: u16,
    #[serde(default)]
    tagged_addresses: Option<HashMap<String, ServiceAddress>>,
}

/// Scheme, host and port of an endpoint URI. Brackets are stripped from IPv6 hosts.
fn endpoint_parts(endpoint: &str) -> Result<(String, String, u16), RegistryError> {
    let url = Url::parse(endpoint)
        .map_err(|e| RegistryError::InvalidInstance(format!("endpoint '{endpoint}': {e}")))?;
    let host = url
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_owned())
        .ok_or_else(|| RegistryError::InvalidInstance(format!("endpoint '{endpoint}' has no host")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| RegistryError::InvalidInstance(format!("endpoint '{endpoint}' has no port")))?;
    Ok((url.scheme().to_owned(), host, port))
}

fn format_go_duration(d: Duration) -> String {
    humantime::format_duration(d).to_string().replace(' ', "")
}

async fn ensure_success(op: &'static str, resp: Response) -> Result<Response, RegistryError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RegistryError::Rejected {
        op,
        status: status.as_u16(),
        body,
    })
}

fn build_client(timeout: Duration) -> Result<Client, RegistryError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RegistryError::Config(format!("failed to build HTTP client: {e}")))
}

fn validate_base(address: &str) -> Result<(), RegistryError> {
    Url::parse(address)
        .map(|_| ())
        .map_err(|e| RegistryError::Config(format!("invalid consul address '{address}': {e}")))
}

/// Registers instances with the local Consul agent.
pub struct ConsulRegistrar {
    client: Client,
    config: ConsulConfig,
}

impl ConsulRegistrar {
    /// # Errors
    /// Returns [`RegistryError::Config`] if the agent address is not a URL or
    /// the HTTP client cannot be built.
    pub fn new(config: ConsulConfig) -> Result<Self, RegistryError> {
        validate_base(&config.address)?;
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ConsulConfig {
        &self.config
    }

    /// Builds the agent payload. The first usable endpoint supplies the
    /// service address and port; endpoints that do not parse are skipped.
    fn registration(&self, instance: &ServiceInstance) -> Result<AgentServiceRegistration, RegistryError> {
        let mut primary = None;
        let mut tagged_addresses = HashMap::new();
        let mut checks = Vec::new();
        for endpoint in &instance.endpoints {
            let (scheme, host, ep_port) = match endpoint_parts(endpoint) {
                Ok(parts) => parts,
                Err(e) => {
                    tracing::warn!(
                        service = %instance.name,
                        endpoint = %endpoint,
                        error = %e,
                        "skipping endpoint consul cannot publish"
                    );
                    continue;
                }
            };
            if primary.is_none() {
                primary = Some((host.clone(), ep_port));
            }
            tagged_addresses.insert(
                scheme,
                ServiceAddress {
                    address: endpoint.clone(),
                    port: ep_port,
                },
            );
            if self.config.health_check {
                checks.push(AgentServiceCheck {
                    tcp: format!("{host}:{ep_port}"),
                    interval: format_go_duration(self.config.health_check_interval),
                    timeout: format_go_duration(self.config.health_check_timeout),
                    deregister_critical_service_after: format_go_duration(
                        self.config.deregister_critical_after,
                    ),
                });
            }
        }

        let Some((address, port)) = primary else {
            return Err(RegistryError::InvalidInstance(format!(
                "service '{}' has no usable endpoints",
                instance.name
            )));
        };

        let mut tags = self.config.tags.clone();
        tags.push(format!("{VERSION_TAG_PREFIX}{}", instance.version));

        Ok(AgentServiceRegistration {
            id: instance.id.clone(),
            name: instance.name.clone(),
            tags,
            address,
            port,
            meta: instance.metadata.clone(),
            tagged_addresses,
            checks,
        })
    }
}

#[async_trait]
impl Registrar for ConsulRegistrar {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        let payload = self.registration(instance)?;
        let url = format!("{}/v1/agent/service/register", self.config.address);

        let resp = self
            .client
            .put(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| RegistryError::Request {
                op: "register",
                source,
            })?;
        ensure_success("register", resp).await?;

        tracing::debug!(
            service = %instance.name,
            id = %instance.id,
            address = %payload.address,
            port = payload.port,
            "registered with consul"
        );
        Ok(())
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        let url = format!(
            "{}/v1/agent/service/deregister/{}",
            self.config.address, instance.id
        );

        let resp = self
            .client
            .put(&url)
            .send()
            .await
            .map_err(|source| RegistryError::Request {
                op: "deregister",
                source,
            })?;
        ensure_success("deregister", resp).await?;

        tracing::debug!(service = %instance.name, id = %instance.id, "deregistered from consul");
        Ok(())
    }
}

/// Looks up passing instances through the Consul health API.
pub struct ConsulDiscovery {
    client: Client,
    address: String,
}

impl ConsulDiscovery {
    /// # Errors
    /// Returns [`RegistryError::Config`] if the agent address is not a URL or
    /// the HTTP client cannot be built.
    pub fn new(config: &ConsulConfig) -> Result<Self, RegistryError> {
        validate_base(&config.address)?;
        Ok(Self {
            client: build_client(config.timeout)?,
            address: config.address.clone(),
        })
    }
}

fn instance_from_entry(svc: AgentService) -> ServiceInstance {
    let tags = svc.tags.unwrap_or_default();
    let version = tags
        .iter()
        .find_map(|t| t.strip_prefix(VERSION_TAG_PREFIX))
        .unwrap_or_default()
        .to_owned();

    let mut endpoints: Vec<String> = svc
        .tagged_addresses
        .unwrap_or_default()
        .into_iter()
        .filter(|(key, _)| !CONSUL_BUILTIN_ADDRESSES.contains(&key.as_str()))
        .map(|(_, addr)| addr.address)
        .collect();
    endpoints.sort();
    if endpoints.is_empty() && !svc.address.is_empty() {
        endpoints.push(format!("http://{}:{}", svc.address, svc.port));
    }

    ServiceInstance {
        id: svc.id,
        name: svc.service,
        version,
        metadata: svc.meta.unwrap_or_default(),
        endpoints,
    }
}

#[async_trait]
impl Discovery for ConsulDiscovery {
    async fn get_service(&self, name: &str) -> Result<Vec<ServiceInstance>, RegistryError> {
        let url = format!("{}/v1/health/service/{name}", self.address);

        let resp = self
            .client
            .get(&url)
            .query(&[("passing", "true")])
            .send()
            .await
            .map_err(|source| RegistryError::Request {
                op: "get_service",
                source,
            })?;
        let entries: Vec<ServiceEntry> = ensure_success("get_service", resp)
            .await?
            .json()
            .await
            .map_err(|source| RegistryError::Request {
                op: "get_service",
                source,
            })?;

        let instances: Vec<ServiceInstance> = entries
            .into_iter()
            .map(|e| instance_from_entry(e.service))
            .collect();
        tracing::debug!(service = name, count = instances.len(), "resolved service");
        Ok(instances)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn registrar() -> ConsulRegistrar {
        ConsulRegistrar::new(ConsulConfig::new("127.0.0.1:8500").with_tags(vec!["fleet".into()]))
            .unwrap()
    }

    #[test]
    fn address_without_scheme_gets_http() {
        assert_eq!(ConsulConfig::new("consul:8500").address, "http://consul:8500");
        assert_eq!(
            ConsulConfig::new("https://consul:8501/").address,
            "https://consul:8501"
        );
    }

    #[test]
    fn first_endpoint_supplies_address_and_port() {
        let inst = ServiceInstance::new("orders", "2.1.0")
            .with_id("orders-1")
            .with_endpoint("http://10.0.0.5:30001")
            .with_endpoint("grpc://10.0.0.5:9000");

        let reg = registrar().registration(&inst).unwrap();
        assert_eq!(reg.address, "10.0.0.5");
        assert_eq!(reg.port, 30001);
        assert_eq!(reg.tags, vec!["fleet".to_owned(), "version=2.1.0".to_owned()]);
        assert_eq!(reg.tagged_addresses["grpc"].address, "grpc://10.0.0.5:9000");
        assert_eq!(reg.tagged_addresses["grpc"].port, 9000);
        assert_eq!(reg.checks.len(), 2);
        assert_eq!(reg.checks[0].tcp, "10.0.0.5:30001");
        assert_eq!(reg.checks[0].interval, "10s");
        assert_eq!(reg.checks[0].deregister_critical_service_after, "10m");
    }

    #[test]
    fn health_checks_can_be_disabled() {
        let r = ConsulRegistrar::new(ConsulConfig::new("127.0.0.1:8500").with_health_check(false))
            .unwrap();
        let inst = ServiceInstance::new("orders", "1").with_endpoint("grpc://10.0.0.5:9000");
        assert!(r.registration(&inst).unwrap().checks.is_empty());
    }

    #[test]
    fn instance_without_endpoints_is_rejected() {
        let inst = ServiceInstance::new("orders", "1");
        assert!(matches!(
            registrar().registration(&inst),
            Err(RegistryError::InvalidInstance(_))
        ));
    }

    #[test]
    fn unparseable_endpoints_are_skipped() {
        let inst = ServiceInstance::new("orders", "1")
            .with_endpoint("not-a-uri")
            .with_endpoint("grpc://10.0.0.5:9000");

        let reg = registrar().registration(&inst).unwrap();
        assert_eq!(reg.address, "10.0.0.5");
        assert_eq!(reg.port, 9000);
        assert_eq!(reg.tagged_addresses.len(), 1);
        assert_eq!(reg.checks.len(), 1);
    }

    #[test]
    fn only_unparseable_endpoints_are_rejected() {
        let inst = ServiceInstance::new("orders", "1").with_endpoint("not-a-uri");
        assert!(matches!(
            registrar().registration(&inst),
            Err(RegistryError::InvalidInstance(_))
        ));
    }

    #[test]
    fn ipv6_host_loses_brackets() {
        let (scheme, host, port) = endpoint_parts("grpc://[fd00::5]:9000").unwrap();
        assert_eq!((scheme.as_str(), host.as_str(), port), ("grpc", "fd00::5", 9000));
    }

    #[test]
    fn entry_rebuilds_instance_without_builtin_addresses() {
        let svc: AgentService = serde_json::from_value(serde_json::json!({
            "ID": "orders-1",
            "Service": "orders",
            "Tags": ["fleet", "version=2.1.0"],
            "Address": "10.0.0.5",
            "Port": 30001,
            "TaggedAddresses": {
                "http": {"Address": "http://10.0.0.5:30001", "Port": 30001},
                "grpc": {"Address": "grpc://10.0.0.5:9000", "Port": 9000},
                "lan_ipv4": {"Address": "10.0.0.5", "Port": 30001}
            }
        }))
        .unwrap();

        let inst = instance_from_entry(svc);
        assert_eq!(inst.version, "2.1.0");
        assert_eq!(
            inst.endpoints,
            vec!["grpc://10.0.0.5:9000".to_owned(), "http://10.0.0.5:30001".to_owned()]
        );
    }

    #[test]
    fn entry_without_tagged_addresses_falls_back_to_http() {
        let svc: AgentService = serde_json::from_value(serde_json::json!({
            "ID": "legacy-1",
            "Service": "legacy",
            "Address": "10.0.0.9",
            "Port": 8080
        }))
        .unwrap();

        let inst = instance_from_entry(svc);
        assert_eq!(inst.endpoints, vec!["http://10.0.0.9:8080".to_owned()]);
        assert!(inst.version.is_empty());
    }
}
