//! Container-port to host-port translation table.

use std::collections::HashMap;

/// Internal (container) port → external (host) port.
///
/// Built once at startup from environment values and read-only afterwards.
/// Each source string carries a single `"internal:external"` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMap {
    entries: HashMap<String, String>,
}

impl PortMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one `"internal:external"` pair into a fresh map.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut map = Self::new();
        map.merge_pair(raw);
        map
    }

    /// Merge one `"internal:external"` pair.
    ///
    /// Anything other than exactly two `:`-separated tokens is ignored, as is the
    /// empty string. A later pair for the same internal port replaces the earlier one.
    pub fn merge_pair(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let parts: Vec<&str> = raw.split(':').collect();
        if let [internal, external] = parts.as_slice() {
            self.entries
                .insert((*internal).to_owned(), (*external).to_owned());
        } else {
            tracing::debug!(value = raw, "ignoring malformed port mapping");
        }
    }

    /// Mapped port for `internal`, if one is configured and non-empty.
    #[must_use]
    pub fn get(&self, internal: &str) -> Option<&str> {
        self.entries
            .get(internal)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PortMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parses_single_pair() {
        let map = PortMap::parse("8000:25678");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("8000"), Some("25678"));
    }

    #[test]
    fn ignores_malformed_values() {
        for raw in ["", "abc", "a:b:c", "8000:9000,9001:9002:1"] {
            assert!(PortMap::parse(raw).is_empty(), "expected no entry for {raw:?}");
        }
    }

    #[test]
    fn later_sources_overwrite_earlier_ones() {
        let mut map = PortMap::new();
        map.merge_pair("8000:30001");
        map.merge_pair("9000:30002");
        map.merge_pair("8000:30003");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("8000"), Some("30003"));
        assert_eq!(map.get("9000"), Some("30002"));
    }

    #[test]
    fn empty_target_is_treated_as_unmapped() {
        let map = PortMap::parse("8000:");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("8000"), None);
    }
}
