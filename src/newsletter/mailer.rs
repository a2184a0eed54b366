//! Outbound email.

use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use tracing::debug;

use crate::config::MailConfig;
use crate::{HntldrError, Result};

/// Sends one HTML email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// SMTP mailer over an implicit-TLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a mailer from configuration.
    pub fn new(config: &MailConfig) -> Result<Self> {
        if config.smtp_host.is_empty() {
            return Err(HntldrError::Config("mail.smtp_host is not set".to_string()));
        }

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| HntldrError::Config(format!("invalid SMTP host: {}", e)))?
            .port(config.smtp_port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from = config
            .from
            .parse()
            .map_err(|e| HntldrError::Config(format!("invalid mail.from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| HntldrError::Mail(format!("invalid recipient {}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| HntldrError::Mail(format!("failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| HntldrError::Mail(format!("failed to send to {}: {}", to, e)))?;

        debug!("Sent \"{}\" to {}", subject, to);
        Ok(())
    }
}
