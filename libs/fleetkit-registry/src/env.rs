//! Environment-sourced registrar settings.

use std::net::IpAddr;

use crate::PortMap;

pub const SERVICE_HOST_ENV: &str = "SERVICE_HOST";
pub const HTTP_PORT_MAP_ENV: &str = "HTTP_PORT_MAP";
pub const GRPC_PORT_MAP_ENV: &str = "GRPC_PORT_MAP";

const LOOPBACK_FALLBACK: &str = "127.0.0.1";

/// Values read from `SERVICE_HOST`, `HTTP_PORT_MAP` and `GRPC_PORT_MAP`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrarEnv {
    pub service_host: Option<String>,
    pub http_port_map: Option<String>,
    pub grpc_port_map: Option<String>,
}

impl RegistrarEnv {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset and empty values are treated alike.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            service_host: read(SERVICE_HOST_ENV),
            http_port_map: read(HTTP_PORT_MAP_ENV),
            grpc_port_map: read(GRPC_PORT_MAP_ENV),
        }
    }

    /// Merge both port-map sources, gRPC last so it wins on collision.
    #[must_use]
    pub fn port_map(&self) -> PortMap {
        let mut map = PortMap::new();
        for raw in [&self.http_port_map, &self.grpc_port_map].into_iter().flatten() {
            map.merge_pair(raw);
        }
        map
    }

    /// Configured host, or this machine's first non-loopback IPv4 address.
    #[must_use]
    pub fn service_host_or_local(&self) -> String {
        self.service_host.clone().unwrap_or_else(detect_local_ip)
    }
}

/// First non-loopback IPv4 address of any local interface, `127.0.0.1` if none.
#[must_use]
pub fn detect_local_ip() -> String {
    match local_ip_address::list_afinet_netifas() {
        Ok(ifaces) => ifaces
            .into_iter()
            .find_map(|(_, ip)| match ip {
                IpAddr::V4(v4) if !v4.is_loopback() => Some(v4.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| {
                tracing::warn!("no non-loopback IPv4 address found, advertising loopback");
                LOOPBACK_FALLBACK.to_owned()
            }),
        Err(e) => {
            tracing::warn!(error = %e, "failed to list network interfaces");
            LOOPBACK_FALLBACK.to_owned()
        }
    }
}
