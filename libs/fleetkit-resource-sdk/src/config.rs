use std::time::Duration;

use crate::{ResourceError, SERVICE_NAME};

/// Address prefix resolved through a [`fleetkit_registry::Discovery`].
pub const DISCOVERY_SCHEME: &str = "discovery:///";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceClientConfig {
    /// `discovery:///<name>` or a direct `host:port` / `http://host:port`.
    pub address: String,
    /// Upper bound for every remote call.
    pub timeout: Duration,
    /// Open a span per call and log channel setup.
    pub enable_trace: bool,
    /// Log successful calls at info level.
    pub enable_log: bool,
}

impl Default for ResourceClientConfig {
    fn default() -> Self {
        Self {
            address: format!("{DISCOVERY_SCHEME}{SERVICE_NAME}"),
            timeout: DEFAULT_TIMEOUT,
            enable_trace: true,
            enable_log: true,
        }
    }
}

impl ResourceClientConfig {
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.enable_trace = enabled;
        self
    }

    #[must_use]
    pub fn with_log(mut self, enabled: bool) -> Self {
        self.enable_log = enabled;
        self
    }

    /// Service name when the address goes through discovery.
    #[must_use]
    pub fn discovery_name(&self) -> Option<&str> {
        self.address
            .strip_prefix(DISCOVERY_SCHEME)
            .filter(|name| !name.is_empty())
    }

    /// Rejects an empty address and replaces a zero timeout with 10 s.
    ///
    /// # Errors
    /// Returns [`ResourceError::Config`] when the address is empty.
    pub fn validate(&mut self) -> Result<(), ResourceError> {
        if self.address.trim().is_empty() {
            return Err(ResourceError::Config("address is required".to_owned()));
        }
        if self.address.starts_with(DISCOVERY_SCHEME) && self.discovery_name().is_none() {
            return Err(ResourceError::Config(format!(
                "discovery address '{}' has no service name",
                self.address
            )));
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        Ok(())
    }
}
