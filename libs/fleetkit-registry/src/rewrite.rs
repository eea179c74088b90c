//! Advertised-endpoint rewriting.

use crate::PortMap;

const HTTP_SCHEME: &str = "http";

/// Rewrite advertised endpoints to the externally reachable host and ports.
///
/// Each `scheme://host:port` entry gets `host` substituted and its port mapped
/// through `port_map` (unmapped ports are kept). Entries that do not parse are
/// passed through untouched so one odd endpoint never blocks registration.
///
/// The result lists every `http` endpoint first, then everything else, each
/// group in input order. Registries that derive a single primary address from
/// the first endpoint therefore publish the HTTP one.
#[must_use]
pub fn rewrite_endpoints(endpoints: &[String], host: &str, port_map: &PortMap) -> Vec<String> {
    let mut http = Vec::with_capacity(endpoints.len());
    let mut other = Vec::new();

    for endpoint in endpoints {
        let Some((scheme, addr)) = endpoint.split_once("://") else {
            other.push(endpoint.clone());
            continue;
        };
        let Some((_, port)) = addr.rsplit_once(':').filter(|(h, p)| splits_cleanly(h, p)) else {
            other.push(endpoint.clone());
            continue;
        };

        let final_port = port_map.get(port).unwrap_or(port);
        let rewritten = format!("{scheme}://{host}:{final_port}");

        if scheme == HTTP_SCHEME {
            http.push(rewritten);
        } else {
            other.push(rewritten);
        }
    }

    http.extend(other);
    http
}

/// A split inside a bracketed IPv6 host leaves brackets unbalanced.
fn splits_cleanly(host: &str, port: &str) -> bool {
    host.starts_with('[') == host.ends_with(']') && !port.contains(['[', ']'])
}
