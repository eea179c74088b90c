use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("invalid resource client configuration: {0}")]
    Config(String),

    #[error("failed to reach resource service at {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error(transparent)]
    Discovery(#[from] fleetkit_registry::RegistryError),

    #[error("{op} failed ({context}): {status}")]
    Remote {
        op: &'static str,
        context: String,
        #[source]
        status: Box<tonic::Status>,
    },

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

impl ResourceError {
    /// gRPC code of a remote failure.
    #[must_use]
    pub fn code(&self) -> Option<tonic::Code> {
        match self {
            Self::Remote { status, .. } => Some(status.code()),
            _ => None,
        }
    }
}
