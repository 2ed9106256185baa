use agriconnect_auth::{AuthzError, SessionState};
use agriconnect_infra::SessionId;

/// Session context for a request.
///
/// Inserted by the session middleware on every request; `state` is `None`
/// for anonymous visitors and for cookies that no longer resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    id: Option<SessionId>,
    state: Option<SessionState>,
}

impl SessionContext {
    pub fn new(id: Option<SessionId>, state: Option<SessionState>) -> Self {
        Self { id, state }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<SessionId> {
        self.id
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    /// The logged-in session, for handlers behind the gate.
    pub fn require(&self) -> Result<&SessionState, AuthzError> {
        self.state.as_ref().ok_or(AuthzError::Unauthenticated)
    }
}
