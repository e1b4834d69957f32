//! Outbound email: contact/course-request forms and password-reset links.
//!
//! Built from SMTP_* environment variables; when they are absent the mailer
//! reports itself disabled and the form endpoints answer 503 instead of
//! panicking at boot.

use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use tracing::info;

pub struct Mailer {
    inner: Option<SmtpMailer>,
}

struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Inbox that receives contact and course-request form submissions.
    inbox: Mailbox,
}

impl Mailer {
    pub fn from_env() -> Result<Self> {
        let vars = (
            std::env::var("SMTP_HOST"),
            std::env::var("SMTP_USER"),
            std::env::var("SMTP_PASS"),
            std::env::var("MAIL_FROM"),
            std::env::var("CONTACT_INBOX"),
        );
        let (Ok(host), Ok(user), Ok(pass), Ok(from_addr), Ok(inbox_addr)) = vars else {
            info!("SMTP not configured, outbound email disabled");
            return Ok(Self { inner: None });
        };

        let creds = Credentials::new(user, pass);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();
        let from = from_addr.parse().context("invalid MAIL_FROM")?;
        let inbox = inbox_addr.parse().context("invalid CONTACT_INBOX")?;

        Ok(Self {
            inner: Some(SmtpMailer { transport, from, inbox }),
        })
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Deliver a form submission to the configured inbox.
    pub async fn send_to_inbox(&self, subject: &str, body: &str) -> Result<()> {
        let Some(mailer) = &self.inner else {
            anyhow::bail!("mailer disabled");
        };
        mailer.send(mailer.inbox.clone(), subject, body).await
    }

    /// Deliver to an arbitrary recipient (password-reset links).
    pub async fn send_to(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let Some(mailer) = &self.inner else {
            anyhow::bail!("mailer disabled");
        };
        let to = to.parse().context("invalid recipient address")?;
        mailer.send(to, subject, body).await
    }
}

impl SmtpMailer {
    async fn send(&self, to: Mailbox, subject: &str, body: &str) -> Result<()> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")?;
        self.transport.send(msg).await.context("send email")?;
        Ok(())
    }
}
