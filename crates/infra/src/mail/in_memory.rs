use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::info;

use super::{MailError, MailRelay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Keeps outgoing mail in memory instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingMailRelay {
    sent: RwLock<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deliveries(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailRelay for RecordingMailRelay {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Delivery("relay unavailable".to_string()));
        }
        let mut sent = self
            .sent
            .write()
            .map_err(|_| MailError::Delivery("mail log lock poisoned".to_string()))?;
        sent.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        info!(to, subject, "mail recorded");
        Ok(())
    }
}
