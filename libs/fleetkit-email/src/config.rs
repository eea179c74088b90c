//! SMTP settings, loaded from YAML and `EMAIL_*` environment variables.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::EmailError;

pub const ENV_PREFIX: &str = "EMAIL_";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmtpConfig {
    pub host: String,
    /// Implicit-TLS port, 465 unless overridden.
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Sender address, `noreply@example.com` or `Example <noreply@example.com>`.
    pub from: String,
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 465,
            username: String::new(),
            password: SecretString::from(String::new()),
            from: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl EmailConfig {
    /// Layer an optional YAML file under `EMAIL_` environment variables.
    ///
    /// Nested keys use `__`, e.g. `EMAIL_SMTP__HOST=smtp.example.com`.
    ///
    /// # Errors
    /// Returns [`EmailError::Load`] if a source cannot be parsed and
    /// [`EmailError::Config`] if required settings are missing.
    pub fn load(path: Option<&Path>) -> Result<Self, EmailError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        config.validate()?;
        tracing::debug!(
            host = %config.smtp.host,
            port = config.smtp.port,
            from = %config.smtp.from,
            "email configuration loaded"
        );
        Ok(config)
    }

    /// # Errors
    /// Returns [`EmailError::Config`] naming the first missing setting.
    pub fn validate(&self) -> Result<(), EmailError> {
        let smtp = &self.smtp;
        if smtp.host.trim().is_empty() {
            return Err(EmailError::Config("smtp.host is required".to_owned()));
        }
        if smtp.port == 0 {
            return Err(EmailError::Config("smtp.port must be non-zero".to_owned()));
        }
        if smtp.from.trim().is_empty() {
            return Err(EmailError::Config("smtp.from is required".to_owned()));
        }
        if smtp.timeout.is_zero() {
            return Err(EmailError::Config("smtp.timeout must be positive".to_owned()));
        }
        Ok(())
    }
}

impl SmtpConfig {
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.expose_secret().is_empty()
    }
}

/// `Duration` from a humantime string (`"10s"`, `"1m 30s"`) or whole seconds.
mod humantime_duration {
    use std::fmt;
    use std::time::Duration;

    use serde::Deserializer;
    use serde::de::{self, Visitor};

    struct DurationVisitor;

    impl Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a duration like \"10s\" or a number of seconds")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
            humantime::parse_duration(v).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must not be negative"))
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(DurationVisitor)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn yaml_file_with_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "email.yaml",
                r"
smtp:
  host: smtp.example.com
  port: 465
  username: mailer
  password: file-secret
  from: Fleet <noreply@example.com>
  timeout: 30s
",
            )?;
            jail.set_env("EMAIL_SMTP__HOST", "smtp.internal");

            let cfg = EmailConfig::load(Some(Path::new("email.yaml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(cfg.smtp.host, "smtp.internal");
            assert_eq!(cfg.smtp.port, 465);
            assert_eq!(cfg.smtp.password.expose_secret(), "file-secret");
            assert_eq!(cfg.smtp.timeout, Duration::from_secs(30));
            assert!(cfg.smtp.has_credentials());
            Ok(())
        });
    }

    #[test]
    fn env_only_uses_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("EMAIL_SMTP__HOST", "smtp.example.com");
            jail.set_env("EMAIL_SMTP__FROM", "noreply@example.com");

            let cfg = EmailConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(cfg.smtp.port, 465);
            assert_eq!(cfg.smtp.timeout, Duration::from_secs(10));
            assert!(!cfg.smtp.has_credentials());
            Ok(())
        });
    }

    #[test]
    fn numeric_timeout_means_seconds() {
        Jail::expect_with(|jail| {
            jail.set_env("EMAIL_SMTP__HOST", "smtp.example.com");
            jail.set_env("EMAIL_SMTP__FROM", "noreply@example.com");
            jail.set_env("EMAIL_SMTP__TIMEOUT", "5");

            let cfg = EmailConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(cfg.smtp.timeout, Duration::from_secs(5));
            Ok(())
        });
    }

    #[test]
    fn missing_host_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.set_env("EMAIL_SMTP__FROM", "noreply@example.com");
            match EmailConfig::load(None) {
                Err(EmailError::Config(msg)) => assert!(msg.contains("host")),
                other => panic!("expected config error, got {other:?}"),
            }
            Ok(())
        });
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let cfg = SmtpConfig {
            password: SecretString::from("hunter2".to_owned()),
            ..SmtpConfig::default()
        };
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }
}
