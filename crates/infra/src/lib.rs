//! Infrastructure layer: persistence, sessions, identity provider, mail,
//! uploads and configuration.

pub mod config;
pub mod files;
pub mod identity;
pub mod mail;
pub mod session;
pub mod store;

pub use config::{AppConfig, ConfigError, SmtpConfig};
pub use files::{FileArea, FileAreaError, InMemoryFileArea, LocalFileArea};
pub use identity::{
    FirebaseIdentityProvider, IdentityError, IdentityProvider, InMemoryIdentityProvider,
};
pub use mail::{MailError, MailRelay, RecordingMailRelay, SentMail, SmtpMailRelay};
pub use session::{InMemorySessionStore, SessionEntries, SessionId, SessionStore};
pub use store::{
    BlogStore, CategoryFilter, CategoryStore, InMemoryStore, ListingStore, PostgresStore,
    ResourceStore, StoreError, StoreResult, UserStore,
};
