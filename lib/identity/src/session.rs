//! Session containers and the per-session profile cache.
//!
//! A session holds at most one resolved `UserProfile`. Once a profile is
//! stored it is reused for every later request of that session, so the
//! identity provider is contacted at most once per session. Concurrent
//! writers for the same session race benignly: the last stored profile wins.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use profile_gate_core::SessionId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::profile::UserProfile;

/// State kept for one browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    id: SessionId,
    /// The resolved profile, once identity resolution succeeded.
    profile: Option<UserProfile>,
    /// Set when the profile came from a direct credential exchange.
    silent_login: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionState {
    /// Creates an empty session valid for `duration`.
    #[must_use]
    pub fn new(id: SessionId, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            profile: None,
            silent_login: false,
            created_at: now,
            expires_at: now + duration,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn is_silent_login(&self) -> bool {
        self.silent_login
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Result of opening a session for a request.
#[derive(Debug, Clone)]
pub struct OpenedSession {
    pub state: SessionState,
    /// True if a fresh container was created for this request.
    pub created: bool,
}

/// In-memory store of session containers, shared across requests.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionState>>>,
    duration: Duration,
}

impl SessionStore {
    /// Creates an empty store whose sessions live for `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            duration,
        }
    }

    /// Returns the live session for `id`, or creates a fresh one when the
    /// id is absent, unknown or expired.
    pub async fn open(&self, id: Option<SessionId>) -> OpenedSession {
        if let Some(id) = id {
            let sessions = self.sessions.read().await;
            if let Some(state) = sessions.get(&id).filter(|s| !s.is_expired()) {
                return OpenedSession {
                    state: state.clone(),
                    created: false,
                };
            }
        }

        let state = SessionState::new(SessionId::new(), self.duration);
        tracing::debug!(session_id = %state.id(), "created session container");
        self.sessions.write().await.insert(state.id(), state.clone());
        OpenedSession {
            state,
            created: true,
        }
    }

    /// Returns a snapshot of the session, if it exists and has not expired.
    pub async fn get(&self, id: SessionId) -> Option<SessionState> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|s| !s.is_expired())
            .cloned()
    }

    /// Replaces the session's profile. Returns false if the session is gone.
    pub async fn store_profile(&self, id: SessionId, profile: UserProfile) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(state) => {
                state.profile = Some(profile);
                true
            }
            None => {
                tracing::debug!(session_id = %id, "session vanished before profile was stored");
                false
            }
        }
    }

    /// Sets the silent-login marker on the session.
    pub async fn mark_silent_login(&self, id: SessionId) {
        if let Some(state) = self.sessions.write().await.get_mut(&id) {
            state.silent_login = true;
        }
    }

    /// Removes a session, returning its final state.
    pub async fn remove(&self, id: SessionId) -> Option<SessionState> {
        self.sessions.write().await.remove(&id)
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, state| !state.is_expired());
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
