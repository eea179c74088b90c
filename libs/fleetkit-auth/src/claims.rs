use serde::{Deserialize, Serialize};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const REGION_NAME_HEADER: &str = "x-region-name";

/// Identity of the caller, as asserted by the upstream gateway.
///
/// `tenant_id` is `0` when the route does not require a tenant or the caller
/// did not send one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u32,
    pub tenant_id: u32,
    pub region_name: String,
}

impl Claims {
    #[must_use]
    pub fn new(user_id: u32) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: u32) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    #[must_use]
    pub fn with_region(mut self, region_name: impl Into<String>) -> Self {
        self.region_name = region_name.into();
        self
    }

    #[must_use]
    pub fn has_tenant(&self) -> bool {
        self.tenant_id != 0
    }
}
