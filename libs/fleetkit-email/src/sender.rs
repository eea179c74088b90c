use std::sync::Arc;
use std::time::Duration;

use lettre::Message;
use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Body, Mailbox};

use crate::{EmailConfig, EmailError, MailTransport, RenderedEmail, SmtpMailTransport};

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.parse::<Mailbox>().map_err(|source| EmailError::Address {
        address: address.to_owned(),
        source,
    })
}

/// Wraps rendered content into an HTML message and sends it.
#[derive(Clone)]
pub struct EmailSender {
    from: Mailbox,
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl EmailSender {
    /// # Errors
    /// Returns [`EmailError::Address`] if `from` is not a valid mailbox.
    pub fn new(
        from: &str,
        transport: Arc<dyn MailTransport>,
        timeout: Duration,
    ) -> Result<Self, EmailError> {
        Ok(Self {
            from: parse_mailbox(from)?,
            transport,
            timeout,
        })
    }

    /// Sender backed by SMTP as configured.
    ///
    /// # Errors
    /// Fails if the configuration is incomplete, the sender address is invalid
    /// or the SMTP transport cannot be built.
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        config.validate()?;
        let transport = SmtpMailTransport::new(&config.smtp)?;
        Self::new(&config.smtp.from, Arc::new(transport), config.smtp.timeout)
    }

    /// `text/html; charset=utf-8` message from the configured sender to `to`.
    ///
    /// The body is always quoted-printable so long HTML lines survive relays.
    ///
    /// # Errors
    /// Returns [`EmailError::Address`] for an invalid recipient.
    pub fn build_message(&self, to: &str, email: &RenderedEmail) -> Result<Message, EmailError> {
        let body = Body::new_with_encoding(
            email.body.clone(),
            ContentTransferEncoding::QuotedPrintable,
        )
        .map_err(|_| EmailError::Template("body cannot be quoted-printable encoded".to_owned()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(body)?;
        Ok(message)
    }

    /// Build and send, bounded by the configured timeout.
    ///
    /// # Errors
    /// Returns the transport error, or [`EmailError::Timeout`] if the send did
    /// not finish in time.
    pub async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let message = self.build_message(to, email)?;

        match tokio::time::timeout(self.timeout, self.transport.send(message)).await {
            Ok(Ok(())) => {
                tracing::info!(to, subject = %email.subject, "email sent");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(to, error = %e, "email delivery failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(to, timeout = ?self.timeout, "email delivery timed out");
                Err(EmailError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailTransport for Recorder {
        async fn send(&self, message: Message) -> Result<(), EmailError> {
            let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
            self.sent.lock().unwrap().push(raw);
            Ok(())
        }
    }

    struct Stalled;

    #[async_trait]
    impl MailTransport for Stalled {
        async fn send(&self, _message: Message) -> Result<(), EmailError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn rendered() -> RenderedEmail {
        RenderedEmail {
            subject: "Reset your password".to_owned(),
            body: "<p>hello</p>".to_owned(),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn message_carries_html_headers() {
        let recorder = Arc::new(Recorder::default());
        let sender = EmailSender::new(
            "Fleet <noreply@example.com>",
            recorder.clone(),
            Duration::from_secs(5),
        )
        .unwrap();

        sender.send("ana@example.com", &rendered()).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        let raw = &sent[0];
        assert!(raw.contains("From: Fleet <noreply@example.com>"));
        assert!(raw.contains("To: ana@example.com"));
        assert!(raw.contains("Subject: Reset your password"));
        assert!(raw.contains("MIME-Version: 1.0"));
        assert!(raw.contains("Content-Type: text/html; charset=utf-8"));
        assert!(raw.contains("Content-Transfer-Encoding: quoted-printable"));
        assert!(raw.contains("<p>hello</p>"));
        assert!(logs_contain("email sent"));
    }

    #[tokio::test]
    async fn invalid_recipient_is_rejected_before_sending() {
        let recorder = Arc::new(Recorder::default());
        let sender =
            EmailSender::new("noreply@example.com", recorder.clone(), Duration::from_secs(5))
                .unwrap();

        let err = sender.send("not an address", &rendered()).await.unwrap_err();
        assert!(matches!(err, EmailError::Address { .. }));
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_sender_fails_construction() {
        let err = EmailSender::new("nope", Arc::new(Recorder::default()), Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, EmailError::Address { .. }));
    }

    #[tokio::test]
    async fn slow_transport_times_out() {
        let timeout = Duration::from_millis(50);
        let sender =
            EmailSender::new("noreply@example.com", Arc::new(Stalled), timeout).unwrap();
        let err = sender.send("ana@example.com", &rendered()).await.unwrap_err();
        assert!(matches!(err, EmailError::Timeout(d) if d == timeout));
    }
}
