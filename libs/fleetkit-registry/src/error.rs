use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid registry configuration: {0}")]
    Config(String),

    #[error("registry request '{op}' failed: {source}")]
    Request {
        op: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry rejected '{op}' with status {status}: {body}")]
    Rejected {
        op: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid service instance: {0}")]
    InvalidInstance(String),
}
