#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fleetkit_email::{
    EmailError, EmailSender, EmailService, InvitationEmail, MailTransport, PasswordResetEmail,
    TemplateRegistry, TenantActivationEmail,
};
use lettre::Message;

#[derive(Default)]
struct RecordingTransport {
    messages: Mutex<Vec<Message>>,
}

impl RecordingTransport {
    fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    fn last_raw(&self) -> String {
        let messages = self.messages.lock().unwrap();
        let msg = messages.last().expect("a message was sent");
        String::from_utf8_lossy(&msg.formatted()).into_owned()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

fn service() -> (EmailService, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let sender = EmailSender::new(
        "FleetKit <noreply@example.com>",
        transport.clone(),
        Duration::from_secs(5),
    )
    .unwrap();
    let templates = Arc::new(TemplateRegistry::new().unwrap());
    (EmailService::new(sender, templates), transport)
}

/// Decoded HTML body; lettre may transfer-encode long lines.
fn body_of(transport: &RecordingTransport) -> String {
    let messages = transport.messages.lock().unwrap();
    let msg = messages.last().expect("a message was sent");
    let raw = String::from_utf8_lossy(&msg.formatted()).into_owned();
    let (_, body) = raw.split_once("\r\n\r\n").expect("headers and body");
    decode_quoted_printable(body)
}

fn decode_quoted_printable(s: &str) -> String {
    let joined = s.replace("=\r\n", "");
    let mut out = Vec::with_capacity(joined.len());
    let bytes = joined.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' && i + 2 < bytes.len() {
            if let Ok(b) = u8::from_str_radix(&joined[i + 1..i + 3], 16) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn activation_uses_default_expiry_and_current_year() {
    let (svc, transport) = service();
    svc.send_tenant_activation_email(&TenantActivationEmail {
        to: "ana@example.com".into(),
        user_name: "Ana".into(),
        tenant_name: "Acme".into(),
        activation_link: "https://app.example.com/activate".into(),
        expire_time: None,
    })
    .await
    .unwrap();

    assert!(transport
        .last_raw()
        .contains("Subject: Welcome to Acme - please activate your account"));
    let body = body_of(&transport);
    assert!(body.contains("24 hours"));
    let year = chrono::Datelike::year(&chrono::Local::now()).to_string();
    assert!(body.contains(&year));
}

#[tokio::test]
async fn explicit_expiry_overrides_default() {
    let (svc, transport) = service();
    svc.send_password_reset_email(&PasswordResetEmail {
        to: "ana@example.com".into(),
        user_name: "Ana".into(),
        reset_link: "https://app.example.com/reset".into(),
        expire_time: Some("30 minutes".into()),
        ..Default::default()
    })
    .await
    .unwrap();

    let body = body_of(&transport);
    assert!(body.contains("30 minutes"));
    assert!(!body.contains("1 hour"));
}

#[tokio::test]
async fn invitation_defaults_invite_time_to_now() {
    let (svc, transport) = service();
    svc.send_invitation_email(&InvitationEmail {
        to: "ben@example.com".into(),
        user_name: "Ben".into(),
        tenant_name: "Acme".into(),
        department_name: "Platform".into(),
        accept_link: "https://app.example.com/accept".into(),
        ..Default::default()
    })
    .await
    .unwrap();

    let body = body_of(&transport);
    assert!(body.contains("7 days"));
    let line = body
        .lines()
        .find(|l| l.contains("Invited at: "))
        .expect("invite time line");
    let stamp = line
        .split("Invited at: ")
        .nth(1)
        .and_then(|rest| rest.split('<').next())
        .unwrap();
    assert!(
        chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok(),
        "unexpected invite time {stamp:?}"
    );
}

#[tokio::test]
async fn missing_required_field_fails_before_transport() {
    let (svc, transport) = service();

    let err = svc
        .send_invitation_email(&InvitationEmail {
            to: "ben@example.com".into(),
            user_name: "Ben".into(),
            tenant_name: "Acme".into(),
            department_name: String::new(),
            accept_link: "https://app.example.com/accept".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, EmailError::Validation(msg) if msg.contains("department_name")));

    let err = svc
        .send_tenant_activation_email(&TenantActivationEmail::default())
        .await
        .unwrap_err();
    assert!(matches!(&err, EmailError::Validation(msg) if msg.contains("to")));

    let err = svc
        .send_password_reset_email(&PasswordResetEmail {
            to: "ana@example.com".into(),
            user_name: "  ".into(),
            reset_link: "https://r".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EmailError::Validation(_)));

    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn user_values_are_escaped_in_body() {
    let (svc, transport) = service();
    svc.send_tenant_activation_email(&TenantActivationEmail {
        to: "ana@example.com".into(),
        user_name: "<b>Ana</b>".into(),
        tenant_name: "Acme".into(),
        activation_link: "https://app.example.com/activate".into(),
        expire_time: None,
    })
    .await
    .unwrap();

    let body = body_of(&transport);
    assert!(body.contains("&lt;b&gt;Ana&lt;/b&gt;"));
    assert!(!body.contains("<b>Ana</b>"));
}
