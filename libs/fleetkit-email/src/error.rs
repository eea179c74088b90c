use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid email configuration: {0}")]
    Config(String),

    #[error("failed to load email configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid email request: {0}")]
    Validation(String),

    #[error("email template error: {0}")]
    Template(String),

    #[error("failed to render {kind} template: {source}")]
    Render {
        kind: &'static str,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("failed to send email: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("sending email timed out after {0:?}")]
    Timeout(Duration),
}
