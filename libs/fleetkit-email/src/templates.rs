//! Built-in HTML templates and the registry that renders them.

use std::collections::HashMap;
use std::fmt;

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use crate::EmailError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    TenantActivation,
    Invitation,
    PasswordReset,
}

impl EmailType {
    pub const ALL: [EmailType; 3] = [
        EmailType::TenantActivation,
        EmailType::Invitation,
        EmailType::PasswordReset,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EmailType::TenantActivation => "tenant_activation",
            EmailType::Invitation => "invitation",
            EmailType::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template source for one email type: a plain-text subject and an HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Compiled templates for every [`EmailType`].
///
/// Bodies are HTML-escaped; subjects are not, since they end up in a MIME
/// header rather than markup. Rendering is strict: a template that refers to a
/// field the data does not carry fails instead of printing nothing.
pub struct TemplateRegistry {
    subjects: Handlebars<'static>,
    bodies: Handlebars<'static>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.bodies.get_templates().len())
            .finish()
    }
}

const STYLES_PARTIAL: &str = "styles";
const FOOTER_PARTIAL: &str = "footer";

impl TemplateRegistry {
    /// Registry with the built-in templates.
    ///
    /// # Errors
    /// Only fails if a built-in template does not compile.
    pub fn new() -> Result<Self, EmailError> {
        Self::from_sources(builtin_templates())
    }

    /// Registry from custom sources. Every [`EmailType`] must be present with a
    /// non-empty subject and body.
    ///
    /// # Errors
    /// Returns [`EmailError::Template`] for a missing type, an empty part or a
    /// template that does not compile.
    pub fn from_sources<I>(sources: I) -> Result<Self, EmailError>
    where
        I: IntoIterator<Item = (EmailType, EmailTemplate)>,
    {
        let mut sources: HashMap<EmailType, EmailTemplate> = sources.into_iter().collect();

        let mut subjects = Handlebars::new();
        subjects.register_escape_fn(handlebars::no_escape);
        subjects.set_strict_mode(true);

        let mut bodies = Handlebars::new();
        bodies.set_strict_mode(true);
        bodies
            .register_partial(STYLES_PARTIAL, STYLES)
            .map_err(|e| EmailError::Template(format!("styles partial: {e}")))?;
        bodies
            .register_partial(FOOTER_PARTIAL, FOOTER)
            .map_err(|e| EmailError::Template(format!("footer partial: {e}")))?;

        for kind in EmailType::ALL {
            let template = sources
                .remove(&kind)
                .ok_or_else(|| EmailError::Template(format!("no template for {kind}")))?;
            if template.subject.trim().is_empty() {
                return Err(EmailError::Template(format!("{kind}: subject part is empty")));
            }
            if template.body.trim().is_empty() {
                return Err(EmailError::Template(format!("{kind}: body part is empty")));
            }

            subjects
                .register_template_string(kind.as_str(), template.subject.trim())
                .map_err(|e| EmailError::Template(format!("{kind} subject: {e}")))?;
            bodies
                .register_template_string(kind.as_str(), template.body)
                .map_err(|e| EmailError::Template(format!("{kind} body: {e}")))?;
        }

        Ok(Self { subjects, bodies })
    }

    /// # Errors
    /// Returns [`EmailError::Render`] if the data is missing a field the
    /// template refers to.
    pub fn render<T: Serialize>(
        &self,
        kind: EmailType,
        data: &T,
    ) -> Result<RenderedEmail, EmailError> {
        let subject = self
            .subjects
            .render(kind.as_str(), data)
            .map_err(|source| EmailError::Render {
                kind: kind.as_str(),
                source,
            })?;
        let body = self
            .bodies
            .render(kind.as_str(), data)
            .map_err(|source| EmailError::Render {
                kind: kind.as_str(),
                source,
            })?;
        Ok(RenderedEmail { subject, body })
    }
}

fn builtin_templates() -> [(EmailType, EmailTemplate); 3] {
    [
        (
            EmailType::TenantActivation,
            EmailTemplate::new(
                "Welcome to {{TenantName}} - please activate your account",
                TENANT_ACTIVATION_BODY,
            ),
        ),
        (
            EmailType::Invitation,
            EmailTemplate::new(
                "You have been invited to join {{TenantName}}",
                INVITATION_BODY,
            ),
        ),
        (
            EmailType::PasswordReset,
            EmailTemplate::new("Reset your password", PASSWORD_RESET_BODY),
        ),
    ]
}

const STYLES: &str = r"<style>
  body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif;
         line-height: 1.6; color: #333333; font-size: 16px; margin: 0; padding: 0; background-color: #f4f4f7; }
  .container { max-width: 600px; margin: 20px auto; background-color: #ffffff;
               border: 1px solid #e0e0e0; border-radius: 8px; overflow: hidden; }
  .header { padding: 30px 20px; text-align: center; border-bottom: 1px solid #e0e0e0; }
  .header h1 { margin: 0; color: #222222; font-size: 24px; }
  .content { padding: 32px; }
  .footer { background: #f9f9f9; padding: 20px; text-align: center; font-size: 13px; color: #777777; }
  .button { display: inline-block; padding: 14px 28px; text-decoration: none !important; border-radius: 8px;
            margin: 20px 0; font-size: 16px; font-weight: 600; color: #ffffff !important; }
  .button-primary { background-color: #007bff; }
  .button-secondary { background-color: #6c757d; }
  .highlight { color: #007bff; font-weight: bold; }
  .link-box { word-break: break-all; background: #f8f9fa; padding: 12px; border-radius: 4px;
              font-family: 'Courier New', Courier, monospace; font-size: 13px; }
  .notice { background: #fff8e1; border-left: 4px solid #ffc107; padding: 12px 16px; font-size: 14px; }
</style>";

const FOOTER: &str = r#"<div class="footer">
  <p>This message was sent automatically, please do not reply.</p>
  <p>&copy; {{CurrentYear}} {{#if TenantName}}{{TenantName}}{{else}}FleetKit{{/if}}. All rights reserved.</p>
</div>"#;

const TENANT_ACTIVATION_BODY: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Activate your account</title>
  {{> styles}}
</head>
<body>
  <div class="container">
    <div class="header"><h1>Welcome to {{TenantName}}</h1></div>
    <div class="content">
      <p>Hello {{UserName}},</p>
      <p>An account has been created for you in <span class="highlight">{{TenantName}}</span>.
         Activate it to start working with your team.</p>
      <p style="text-align: center;">
        <a class="button button-primary" href="{{ActivationLink}}">Activate account</a>
      </p>
      <p>If the button does not work, copy this link into your browser:</p>
      <div class="link-box">{{ActivationLink}}</div>
      <div class="notice">This link expires in {{ExpireTime}}.</div>
    </div>
    {{> footer}}
  </div>
</body>
</html>"#;

const INVITATION_BODY: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Invitation</title>
  {{> styles}}
</head>
<body>
  <div class="container">
    <div class="header"><h1>You are invited</h1></div>
    <div class="content">
      <p>Hello {{UserName}},</p>
      <p>{{#if InviterName}}{{InviterName}} has invited you{{else}}You have been invited{{/if}} to join
         <span class="highlight">{{TenantName}}</span>.</p>
      <ul>
        <li>Department: {{DepartmentName}}</li>
        {{#if RoleName}}<li>Role: {{RoleName}}</li>{{/if}}
        <li>Invited at: {{InviteTime}}</li>
      </ul>
      <p style="text-align: center;">
        <a class="button button-primary" href="{{AcceptLink}}">Accept invitation</a>
        {{#if DeclineLink}}<a class="button button-secondary" href="{{DeclineLink}}">Decline</a>{{/if}}
      </p>
      <div class="notice">This invitation expires in {{ExpireTime}}.</div>
    </div>
    {{> footer}}
  </div>
</body>
</html>"#;

const PASSWORD_RESET_BODY: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Reset your password</title>
  {{> styles}}
</head>
<body>
  <div class="container">
    <div class="header"><h1>Password reset</h1></div>
    <div class="content">
      <p>Hello {{UserName}},</p>
      <p>We received a request to reset the password of your
         {{#if TenantName}}<span class="highlight">{{TenantName}}</span> {{/if}}account.</p>
      <p style="text-align: center;">
        <a class="button button-primary" href="{{ResetLink}}">Reset password</a>
      </p>
      <p>If the button does not work, copy this link into your browser:</p>
      <div class="link-box">{{ResetLink}}</div>
      <div class="notice">This link expires in {{ExpireTime}}. If you did not ask for a reset,
        you can ignore this email.</div>
    </div>
    {{> footer}}
  </div>
</body>
</html>"#;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn activation_data(user: &str) -> serde_json::Value {
        json!({
            "UserName": user,
            "TenantName": "Acme & Co",
            "ActivationLink": "https://app.example.com/activate?t=1&u=2",
            "ExpireTime": "24 hours",
            "CurrentYear": 2026,
        })
    }

    #[test]
    fn builtin_registry_renders_every_type() {
        let reg = TemplateRegistry::new().unwrap();

        let a = reg
            .render(EmailType::TenantActivation, &activation_data("Ana"))
            .unwrap();
        assert_eq!(a.subject, "Welcome to Acme & Co - please activate your account");
        assert!(a.body.contains("Hello Ana,"));
        assert!(a.body.contains("24 hours"));
        assert!(a.body.contains("2026"));

        let i = reg
            .render(
                EmailType::Invitation,
                &json!({
                    "UserName": "Ben", "TenantName": "Acme", "DepartmentName": "R&D",
                    "RoleName": "", "InviterName": "Ana", "InviteTime": "2026-10-19 09:00:00",
                    "AcceptLink": "https://a", "DeclineLink": "", "ExpireTime": "7 days",
                    "CurrentYear": 2026,
                }),
            )
            .unwrap();
        assert_eq!(i.subject, "You have been invited to join Acme");
        assert!(i.body.contains("Ana has invited you"));
        assert!(!i.body.contains("Role:"));
        assert!(!i.body.contains("Decline"));

        let p = reg
            .render(
                EmailType::PasswordReset,
                &json!({
                    "UserName": "Cy", "TenantName": "", "ResetLink": "https://r",
                    "ExpireTime": "1 hour", "CurrentYear": 2026,
                }),
            )
            .unwrap();
        assert_eq!(p.subject, "Reset your password");
        assert!(p.body.contains("1 hour"));
        assert!(p.body.contains("FleetKit. All rights reserved"));
    }

    #[test]
    fn body_escapes_html_but_subject_does_not() {
        let reg = TemplateRegistry::new().unwrap();
        let out = reg
            .render(EmailType::TenantActivation, &activation_data("<script>x</script>"))
            .unwrap();

        assert!(out.body.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!out.body.contains("<script>"));
        assert!(out.body.contains("Acme &amp; Co"));
        assert!(out.subject.contains("Acme & Co"));
    }

    #[test]
    fn missing_field_fails_to_render() {
        let reg = TemplateRegistry::new().unwrap();
        let err = reg
            .render(EmailType::PasswordReset, &json!({"UserName": "Cy"}))
            .unwrap_err();
        assert!(matches!(err, EmailError::Render { kind: "password_reset", .. }));
    }

    #[test]
    fn custom_sources_must_cover_every_type() {
        let only_one = [(
            EmailType::PasswordReset,
            EmailTemplate::new("Reset", "<p>{{ResetLink}}</p>"),
        )];
        let err = TemplateRegistry::from_sources(only_one).unwrap_err();
        assert!(err.to_string().contains("no template for"));
    }

    #[test]
    fn empty_parts_are_rejected_at_construction() {
        let mut sources = builtin_templates();
        sources[1].1.body = "   ".to_owned();
        let err = TemplateRegistry::from_sources(sources).unwrap_err();
        assert!(err.to_string().contains("invitation: body part is empty"));
    }

    #[test]
    fn broken_syntax_is_rejected_at_construction() {
        let mut sources = builtin_templates();
        sources[0].1.subject = "{{#if TenantName}}unclosed".to_owned();
        assert!(matches!(
            TemplateRegistry::from_sources(sources),
            Err(EmailError::Template(_))
        ));
    }

    #[test]
    fn email_type_wire_names() {
        assert_eq!(EmailType::TenantActivation.to_string(), "tenant_activation");
        let parsed: EmailType = serde_json::from_str("\"password_reset\"").unwrap();
        assert_eq!(parsed, EmailType::PasswordReset);
    }
}
