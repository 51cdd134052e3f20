//! Outbound mail transports.

use std::sync::Mutex;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid address {0}")]
    Address(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// `Ok(None)` when no SMTP host is configured
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, EmailError> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };

        let from = format!("{} <{}>", config.from_name, config.from_address);
        let from: Mailbox = from.parse().map_err(|_| EmailError::Address(from.clone()))?;

        let transport = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(pass)) => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| EmailError::Smtp(e.to_string()))?
                .port(config.smtp_port)
                .credentials(Credentials::new(user.clone(), pass.clone()))
                .build(),
            // Unauthenticated local relay (mailpit, mailhog)
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .port(config.smtp_port)
                .build(),
        };

        info!("SMTP mailer configured for {}:{}", host, config.smtp_port);
        Ok(Some(Self { transport, from }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| EmailError::Address(message.to.clone()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| EmailError::Smtp(e.to_string()))?;
        Ok(())
    }
}

/// Used when SMTP is not configured: mail is logged, not sent
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!("Email (not sent, SMTP disabled) to={} subject={:?}", message.to, message.subject);
        Ok(())
    }
}

/// Keeps every message in memory; lets callers inspect what would have gone out
#[derive(Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl OutboxMailer {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn no_host_means_no_smtp() {
        let config = AppConfig::development().email;
        assert!(SmtpMailer::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn smtp_mailer_builds_for_local_relay() {
        let mut config = AppConfig::development().email;
        config.smtp_host = Some("localhost".into());
        assert!(SmtpMailer::from_config(&config).unwrap().is_some());
    }

    #[tokio::test]
    async fn outbox_records_messages() {
        let outbox = OutboxMailer::default();
        outbox
            .send(EmailMessage {
                to: "a@b.test".into(),
                subject: "Hi".into(),
                html: "<p>hi</p>".into(),
            })
            .await
            .unwrap();
        assert_eq!(outbox.messages().len(), 1);
    }
}
