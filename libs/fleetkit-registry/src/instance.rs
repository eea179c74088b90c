use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A running service instance as published to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Unique per process; defaults to a random UUID.
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Advertised endpoints, e.g. `http://0.0.0.0:8000`.
    #[serde(default)]
    pub endpoints: Vec<String>,
}

impl ServiceInstance {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            version: version.into(),
            metadata: HashMap::new(),
            endpoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// First endpoint with the given scheme, e.g. `"grpc"`.
    #[must_use]
    pub fn endpoint_for(&self, scheme: &str) -> Option<&str> {
        self.endpoints
            .iter()
            .map(String::as_str)
            .find(|ep| ep.split_once("://").is_some_and(|(s, _)| s == scheme))
    }
}
