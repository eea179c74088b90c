//! Delivery of finished messages.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::{EmailError, SmtpConfig};

/// Hands a built message to a mail server.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), EmailError>;
}

/// SMTP over implicit TLS, authenticating with PLAIN or LOGIN.
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Build the pooled transport. No connection is made until the first send.
    ///
    /// # Errors
    /// Returns [`EmailError::Smtp`] if TLS parameters cannot be built for the host.
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .timeout(Some(config.timeout));

        if config.has_credentials() {
            builder = builder
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.expose_secret().to_owned(),
                ))
                .authentication(vec![Mechanism::Plain, Mechanism::Login]);
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        let response = self.inner.send(message).await?;
        tracing::debug!(code = %response.code(), "smtp server accepted message");
        Ok(())
    }
}
