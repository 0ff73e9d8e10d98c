//! Outgoing mail. The only transport logs messages instead of delivering them.

use anyhow::Result;
use tracing::info;

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Message {
    pub fn verification(from: &str, to: &str, link: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: "Email Verification".to_string(),
            body: format!("Click here to verify your email: {}", link),
        }
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: &Message) -> Result<()>;
}

/// Writes each message to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &Message) -> Result<()> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Outgoing email"
        );
        Ok(())
    }
}
