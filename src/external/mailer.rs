use crate::config::SmtpConfig;
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Transactional email sender.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let relay = if cfg.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
        };
        let builder = relay.with_context(|| format!("invalid SMTP relay {}", cfg.host))?;

        let mut builder = builder.port(cfg.port);
        if !cfg.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ));
        }

        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender address {}", cfg.from))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let to = to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient {to}"))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured: the mail is logged, not sent.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        log::warn!("SMTP not configured, mail to {to} not sent: {subject}");
        log::debug!("Unsent mail body for {to}: {html}");
        Ok(())
    }
}

/// SMTP mailer when configured, otherwise [`LogMailer`].
pub fn mailer_from_config(cfg: &SmtpConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    if cfg.is_configured() {
        Ok(Arc::new(SmtpMailer::new(cfg)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

pub const OTP_EMAIL_SUBJECT: &str = "Your Email Verification OTP - Consultation Platform";

pub fn otp_email_html(code: &str, valid_minutes: i64) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto;">
  <h2>Email Verification</h2>
  <p>Your One-Time Password (OTP) is:</p>
  <h1 style="color: #4CAF50; letter-spacing: 5px;">{code}</h1>
  <p style="color: #999;">This OTP will expire in {valid_minutes} minutes.</p>
  <p style="color: #999;">Do not share this code with anyone.</p>
</div>"#
    )
}
