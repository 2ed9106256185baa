//! Configuration loading and representation.
//!
//! Every setting comes from an environment variable with a default; a default
//! being used is logged so misconfiguration shows up in the startup logs.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{0} is required when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    /// Firebase Web API key; `None` selects the in-memory identity provider.
    pub firebase_api_key: Option<String>,
    /// `None` selects the recording mail relay.
    pub smtp: Option<SmtpConfig>,
    /// Where public enquiry and contact forms are delivered.
    pub enquiry_inbox: String,
    pub upload_dir: PathBuf,
    pub session_cookie: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let use_persistent_stores: bool = try_load("USE_PERSISTENT_STORES", "false")?;
        let database_url = optional("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let firebase_api_key = optional("FIREBASE_API_KEY");
        if firebase_api_key.is_none() {
            warn!("FIREBASE_API_KEY not set, using in-memory identity provider");
        }

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: try_load("SMTP_PORT", "587")?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
                from: try_load("SMTP_FROM", "no-reply@agriconnect.local")?,
            }),
            None => {
                warn!("SMTP_HOST not set, outgoing mail is recorded in memory only");
                None
            }
        };

        Ok(Self {
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:8080")?,
            use_persistent_stores,
            database_url,
            firebase_api_key,
            smtp,
            enquiry_inbox: try_load("ENQUIRY_INBOX", "enquiries@agriconnect.local")?,
            upload_dir: try_load("UPLOAD_DIR", "wwwroot/uploads")?,
            session_cookie: try_load("SESSION_COOKIE", "agri_session")?,
        })
    }
}

impl Default for AppConfig {
    /// In-memory everything; what the tests and a bare `cargo run` use.
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            use_persistent_stores: false,
            database_url: None,
            firebase_api_key: None,
            smtp: None,
            enquiry_inbox: "enquiries@agriconnect.local".to_string(),
            upload_dir: PathBuf::from("wwwroot/uploads"),
            session_cookie: "agri_session".to_string(),
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
