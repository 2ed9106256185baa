//! Server-side session storage.
//!
//! A session is a plain string map keyed by an opaque id carried in a cookie.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::store::{StoreError, StoreResult};

/// Opaque session id. Random (v4) so it cannot be guessed from creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0.simple(), f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

pub type SessionEntries = HashMap<String, String>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, entries: SessionEntries) -> StoreResult<SessionId>;

    async fn get(&self, id: SessionId) -> StoreResult<Option<SessionEntries>>;

    /// Drop the session. Unknown ids are ignored.
    async fn destroy(&self, id: SessionId) -> StoreResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntries>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Storage("session table lock poisoned".to_string())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, entries: SessionEntries) -> StoreResult<SessionId> {
        let id = SessionId::random();
        self.sessions.write().map_err(poisoned)?.insert(id, entries);
        Ok(id)
    }

    async fn get(&self, id: SessionId) -> StoreResult<Option<SessionEntries>> {
        Ok(self.sessions.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn destroy(&self, id: SessionId) -> StoreResult<()> {
        self.sessions.write().map_err(poisoned)?.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn destroyed_sessions_are_gone() {
        let store = InMemorySessionStore::new();
        let id = store
            .create(HashMap::from([("UID".to_string(), "u1".to_string())]))
            .await
            .unwrap();
        assert!(store.get(id).await.unwrap().is_some());

        store.destroy(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
        store.destroy(id).await.unwrap();
    }

    #[test]
    fn ids_round_trip_through_cookie_text() {
        let id = SessionId::random();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-session".parse::<SessionId>().is_err());
    }
}
