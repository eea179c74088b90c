//! Transactional email for FleetKit services
//!
//! Three message kinds are supported: tenant activation, invitation and
//! password reset. Each is rendered from a built-in HTML template and sent over
//! SMTP with implicit TLS.
//!
//! ```ignore
//! use fleetkit_email::{EmailConfig, EmailService, PasswordResetEmail};
//!
//! let config = EmailConfig::load(Some("config/email.yaml".as_ref()))?;
//! let service = EmailService::from_config(&config)?;
//! service
//!     .send_password_reset_email(&PasswordResetEmail {
//!         to: "ana@example.com".into(),
//!         user_name: "Ana".into(),
//!         reset_link: "https://app.example.com/reset?t=abc".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod error;
pub mod sender;
pub mod service;
pub mod templates;
pub mod transport;

pub use config::{EmailConfig, SmtpConfig};
pub use error::EmailError;
pub use sender::EmailSender;
pub use service::{EmailService, InvitationEmail, PasswordResetEmail, TenantActivationEmail};
pub use templates::{EmailTemplate, EmailType, RenderedEmail, TemplateRegistry};
pub use transport::{MailTransport, SmtpMailTransport};
