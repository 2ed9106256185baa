//! Outgoing HTML email.

use async_trait::async_trait;
use thiserror::Error;

pub mod in_memory;
pub mod smtp;

pub use in_memory::{RecordingMailRelay, SentMail};
pub use smtp::SmtpMailRelay;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("invalid address '{0}'")]
    Address(String),

    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait MailRelay: Send + Sync {
    /// Deliver one message. No retries.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

/// Escape text for inclusion in an HTML body.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
