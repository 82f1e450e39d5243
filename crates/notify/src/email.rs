//! Alert delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport (STARTTLS on
//! the relay, optional login) to send plain-text alert emails. Transport
//! and authentication failures are returned to the caller unchanged: a
//! failed alert must fail the invocation.

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email configuration and delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Required configuration variables are not set.
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    /// A configuration variable is set but unusable.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },

    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

pub const SMTP_HOST: &str = "ALERTS_SMTP_HOST";
pub const SMTP_PORT: &str = "ALERTS_SMTP_PORT";
pub const EMAIL_FROM: &str = "ALERTS_EMAIL_FROM";
pub const EMAIL_TO: &str = "ALERTS_EMAIL_TO";
pub const EMAIL_USER: &str = "ALERTS_EMAIL_USER";
pub const EMAIL_PASS: &str = "ALERTS_EMAIL_PASS";

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Configuration for the SMTP alert relay.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname.
    pub smtp_host: String,
    /// SMTP relay port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// One or more recipients.
    pub to_addresses: Vec<String>,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("from_address", &self.from_address)
            .field("to_addresses", &self.to_addresses)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable             | Required | Default |
    /// |----------------------|----------|---------|
    /// | `ALERTS_SMTP_HOST`   | yes      | --      |
    /// | `ALERTS_SMTP_PORT`   | no       | `587`   |
    /// | `ALERTS_EMAIL_FROM`  | yes      | --      |
    /// | `ALERTS_EMAIL_TO`    | yes      | --  (comma-separated) |
    /// | `ALERTS_EMAIL_USER`  | no       | --      |
    /// | `ALERTS_EMAIL_PASS`  | no       | --      |
    pub fn from_env() -> Result<Self, EmailError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EmailError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (host, from, to) = (get(SMTP_HOST), get(EMAIL_FROM), get(EMAIL_TO));
        let missing: Vec<&'static str> = [
            (SMTP_HOST, host.is_none()),
            (EMAIL_FROM, from.is_none()),
            (EMAIL_TO, to.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();
        let (Some(smtp_host), Some(from_address), Some(to)) = (host, from, to) else {
            return Err(EmailError::MissingConfig(missing));
        };

        let smtp_port = match get(SMTP_PORT) {
            None => DEFAULT_SMTP_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| EmailError::InvalidConfig {
                key: SMTP_PORT,
                value: raw,
            })?,
        };

        let to_addresses = to
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            smtp_host,
            smtp_port,
            from_address,
            to_addresses,
            smtp_user: get(EMAIL_USER),
            smtp_password: get(EMAIL_PASS),
        })
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Anything that can push an alert out of the process.
#[async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), EmailError>;
}

/// Sends alert emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    /// Create a new email delivery service with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AlertSender for EmailDelivery {
    async fn send(&self, subject: &str, body: &str) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let mut builder = Message::builder()
            .from(self.config.from_address.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for to in &self.config.to_addresses {
            builder = builder.to(to.parse()?);
        }
        let email = builder
            .body(body.to_string())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = %self.config.to_addresses.join(", "),
            subject,
            "Alert email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |k| map.get(k).map(|v| (*v).to_string())
    }

    #[test]
    fn missing_required_keys_are_all_named() {
        let err = EmailConfig::from_lookup(lookup(&[(SMTP_HOST, "smtp.local")])).unwrap_err();
        assert_matches!(err, EmailError::MissingConfig(keys) if keys == vec![EMAIL_FROM, EMAIL_TO]);
    }

    #[test]
    fn port_defaults_and_recipients_split() {
        let config = EmailConfig::from_lookup(lookup(&[
            (SMTP_HOST, "smtp.local"),
            (EMAIL_FROM, "dba@example.com"),
            (EMAIL_TO, "oncall@example.com, lead@example.com"),
        ]))
        .expect("valid config");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.to_addresses, vec!["oncall@example.com", "lead@example.com"]);
        assert!(config.smtp_user.is_none());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = EmailConfig::from_lookup(lookup(&[
            (SMTP_HOST, "smtp.local"),
            (SMTP_PORT, "smtp"),
            (EMAIL_FROM, "dba@example.com"),
            (EMAIL_TO, "oncall@example.com"),
        ]))
        .unwrap_err();
        assert_matches!(err, EmailError::InvalidConfig { key: SMTP_PORT, .. });
    }

    #[test]
    fn debug_redacts_password() {
        let config = EmailConfig::from_lookup(lookup(&[
            (SMTP_HOST, "smtp.local"),
            (EMAIL_FROM, "dba@example.com"),
            (EMAIL_TO, "oncall@example.com"),
            (EMAIL_USER, "dba"),
            (EMAIL_PASS, "hunter2"),
        ]))
        .expect("valid config");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn email_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = EmailError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }
}
