//! Typed entry points for each email kind.

use std::sync::Arc;

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::{EmailConfig, EmailError, EmailSender, EmailType, TemplateRegistry};

pub const DEFAULT_ACTIVATION_EXPIRY: &str = "24 hours";
pub const DEFAULT_INVITATION_EXPIRY: &str = "7 days";
pub const DEFAULT_RESET_EXPIRY: &str = "1 hour";
pub const INVITE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantActivationEmail {
    pub to: String,
    pub user_name: String,
    pub tenant_name: String,
    pub activation_link: String,
    /// Human-readable validity, 24 hours if unset.
    #[serde(default)]
    pub expire_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvitationEmail {
    pub to: String,
    pub user_name: String,
    pub tenant_name: String,
    pub department_name: String,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub inviter_name: Option<String>,
    /// Defaults to the local time of sending.
    #[serde(default)]
    pub invite_time: Option<String>,
    pub accept_link: String,
    #[serde(default)]
    pub decline_link: Option<String>,
    /// Human-readable validity, 7 days if unset.
    #[serde(default)]
    pub expire_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasswordResetEmail {
    pub to: String,
    pub user_name: String,
    pub reset_link: String,
    /// Shown in the body and footer when set.
    #[serde(default)]
    pub tenant_name: Option<String>,
    /// Human-readable validity, 1 hour if unset.
    #[serde(default)]
    pub expire_time: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ActivationData<'a> {
    user_name: &'a str,
    tenant_name: &'a str,
    activation_link: &'a str,
    expire_time: &'a str,
    current_year: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InvitationData<'a> {
    user_name: &'a str,
    tenant_name: &'a str,
    department_name: &'a str,
    role_name: &'a str,
    inviter_name: &'a str,
    invite_time: String,
    accept_link: &'a str,
    decline_link: &'a str,
    expire_time: &'a str,
    current_year: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PasswordResetData<'a> {
    user_name: &'a str,
    tenant_name: &'a str,
    reset_link: &'a str,
    expire_time: &'a str,
    current_year: i32,
}

fn require(fields: &[(&'static str, &str)]) -> Result<(), EmailError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(EmailError::Validation(format!("{name} is required"))),
        None => Ok(()),
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn or_default<'a>(value: Option<&'a String>, default: &'a str) -> &'a str {
    non_empty(value).unwrap_or(default)
}

/// Validates requests, fills defaults, renders and sends.
#[derive(Clone)]
pub struct EmailService {
    sender: EmailSender,
    templates: Arc<TemplateRegistry>,
}

impl EmailService {
    #[must_use]
    pub fn new(sender: EmailSender, templates: Arc<TemplateRegistry>) -> Self {
        Self { sender, templates }
    }

    /// SMTP-backed service with the built-in templates.
    ///
    /// # Errors
    /// Fails on incomplete configuration or if the transport cannot be built.
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        let templates = Arc::new(TemplateRegistry::new()?);
        let sender = EmailSender::from_config(config)?;
        Ok(Self::new(sender, templates))
    }

    /// # Errors
    /// [`EmailError::Validation`] if `to`, `user_name`, `tenant_name` or
    /// `activation_link` is empty; otherwise any render or delivery error.
    pub async fn send_tenant_activation_email(
        &self,
        req: &TenantActivationEmail,
    ) -> Result<(), EmailError> {
        require(&[
            ("to", req.to.as_str()),
            ("user_name", req.user_name.as_str()),
            ("tenant_name", req.tenant_name.as_str()),
            ("activation_link", req.activation_link.as_str()),
        ])?;

        let data = ActivationData {
            user_name: &req.user_name,
            tenant_name: &req.tenant_name,
            activation_link: &req.activation_link,
            expire_time: or_default(req.expire_time.as_ref(), DEFAULT_ACTIVATION_EXPIRY),
            current_year: Local::now().year(),
        };
        self.deliver(EmailType::TenantActivation, &req.to, &data)
            .await
    }

    /// # Errors
    /// [`EmailError::Validation`] if `to`, `user_name`, `tenant_name`,
    /// `department_name` or `accept_link` is empty; otherwise any render or
    /// delivery error.
    pub async fn send_invitation_email(&self, req: &InvitationEmail) -> Result<(), EmailError> {
        require(&[
            ("to", req.to.as_str()),
            ("user_name", req.user_name.as_str()),
            ("tenant_name", req.tenant_name.as_str()),
            ("department_name", req.department_name.as_str()),
            ("accept_link", req.accept_link.as_str()),
        ])?;

        let now = Local::now();
        let data = InvitationData {
            user_name: &req.user_name,
            tenant_name: &req.tenant_name,
            department_name: &req.department_name,
            role_name: non_empty(req.role_name.as_ref()).unwrap_or_default(),
            inviter_name: non_empty(req.inviter_name.as_ref()).unwrap_or_default(),
            invite_time: non_empty(req.invite_time.as_ref()).map_or_else(
                || now.format(INVITE_TIME_FORMAT).to_string(),
                str::to_owned,
            ),
            accept_link: &req.accept_link,
            decline_link: non_empty(req.decline_link.as_ref()).unwrap_or_default(),
            expire_time: or_default(req.expire_time.as_ref(), DEFAULT_INVITATION_EXPIRY),
            current_year: now.year(),
        };
        self.deliver(EmailType::Invitation, &req.to, &data).await
    }

    /// # Errors
    /// [`EmailError::Validation`] if `to`, `user_name` or `reset_link` is
    /// empty; otherwise any render or delivery error.
    pub async fn send_password_reset_email(
        &self,
        req: &PasswordResetEmail,
    ) -> Result<(), EmailError> {
        require(&[
            ("to", req.to.as_str()),
            ("user_name", req.user_name.as_str()),
            ("reset_link", req.reset_link.as_str()),
        ])?;

        let data = PasswordResetData {
            user_name: &req.user_name,
            tenant_name: non_empty(req.tenant_name.as_ref()).unwrap_or_default(),
            reset_link: &req.reset_link,
            expire_time: or_default(req.expire_time.as_ref(), DEFAULT_RESET_EXPIRY),
            current_year: Local::now().year(),
        };
        self.deliver(EmailType::PasswordReset, &req.to, &data).await
    }

    async fn deliver<T: Serialize>(
        &self,
        kind: EmailType,
        to: &str,
        data: &T,
    ) -> Result<(), EmailError> {
        let rendered = self.templates.render(kind, data)?;
        tracing::debug!(email_type = %kind, to, "rendered email");
        self.sender.send(to, &rendered).await
    }
}
