//! Session registry: the list of camp sessions and which one is current.
//!
//! The registry keeps an in-memory copy of the session list and of the
//! current pointer, loaded once from storage. Callers that need the current
//! session get a [`SessionContext`] and pass it along explicitly.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::domain::models::SessionContext;
use crate::storage::record::record_key;
use crate::storage::{Collection, PreferenceStorage, Record, RecordStorage, CURRENT_SESSION_KEY};
use shared::{CreateSessionRequest, Session, SessionListResponse, SessionResponse};

const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Default)]
struct RegistryState {
    sessions: Vec<Session>,
    current: Option<String>,
    /// Ids handed out to creations whose row is not stored yet
    reserved: HashSet<String>,
}

/// Service managing camp sessions
#[derive(Clone)]
pub struct SessionService {
    records: Arc<dyn RecordStorage>,
    preferences: Arc<dyn PreferenceStorage>,
    state: Arc<RwLock<RegistryState>>,
}

impl SessionService {
    /// Create an empty registry. Call [`SessionService::load`] to populate it.
    pub fn new(records: Arc<dyn RecordStorage>, preferences: Arc<dyn PreferenceStorage>) -> Self {
        Self {
            records,
            preferences,
            state: Arc::new(RwLock::new(RegistryState::default())),
        }
    }

    /// Read sessions and the current pointer from storage, replacing the
    /// in-memory state. A pointer to a missing session is cleared.
    pub async fn load(&self) -> Result<()> {
        let records = self
            .records
            .get_all(Collection::Sessions, None)
            .await
            .context("Failed to load sessions")?;
        let sessions: Vec<Session> = records.iter().filter_map(session_from_record).collect();

        let mut current = self
            .preferences
            .get_preference(CURRENT_SESSION_KEY)
            .await
            .context("Failed to read current session")?;
        if let Some(id) = current.as_deref() {
            if !sessions.iter().any(|s| s.id == id) {
                warn!("Current session {} no longer exists, clearing it", id);
                self.preferences.remove_preference(CURRENT_SESSION_KEY).await?;
                current = None;
            }
        }

        info!("Loaded {} sessions, current: {:?}", sessions.len(), current);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.sessions = sessions;
        state.current = current;
        Ok(())
    }

    /// Create a session and make it current
    pub async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionResponse> {
        info!("Creating session: name={}", request.name);

        let name = request.name.trim();
        if name.is_empty() {
            return Err(anyhow::anyhow!("Session name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(anyhow::anyhow!(
                "Session name cannot exceed {} characters",
                MAX_NAME_LENGTH
            ));
        }

        let now = Utc::now();
        let session = Session {
            id: self.reserve_id(now.timestamp_millis().max(0) as u64),
            name: name.to_string(),
            created_at: now.to_rfc3339(),
        };

        let stored: Result<()> = async {
            let record = serde_json::to_value(&session)?;
            self.records
                .save(Collection::Sessions, &record)
                .await
                .context("Failed to store session")?;
            Ok(())
        }
        .await;
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.reserved.remove(&session.id);
            if stored.is_ok() {
                state.sessions.push(session.clone());
            }
        }
        stored?;

        // The row exists from here on; a failure only leaves it non-current
        self.preferences
            .set_preference(CURRENT_SESSION_KEY, &session.id)
            .await
            .context("Failed to store current session")?;
        self.state.write().unwrap_or_else(PoisonError::into_inner).current = Some(session.id.clone());

        info!("Created session: {} with ID: {}", session.name, session.id);
        Ok(SessionResponse {
            session,
            success_message: "Session created successfully".to_string(),
        })
    }

    /// Timestamp-based id, moved forward while it collides with a known or
    /// reserved one. The id stays reserved until the caller releases it.
    fn reserve_id(&self, mut millis: u64) -> String {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        loop {
            let id = Session::generate_id(millis);
            if !state.reserved.contains(&id) && !state.sessions.iter().any(|s| s.id == id) {
                state.reserved.insert(id.clone());
                return id;
            }
            millis += 1;
        }
    }

    /// Delete a session. Records that reference it are left in place.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        info!("Deleting session: {}", session_id);

        let session = self
            .get_session(session_id)
            .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;

        self.records
            .delete(Collection::Sessions, session_id)
            .await
            .context("Failed to delete session")?;

        let was_current = self.current_session_id().as_deref() == Some(session_id);
        if was_current {
            self.preferences.remove_preference(CURRENT_SESSION_KEY).await?;
        }

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.sessions.retain(|s| s.id != session_id);
            if was_current {
                state.current = None;
            }
        }

        info!("Deleted session: {} with ID: {}", session.name, session.id);
        Ok(())
    }

    /// Make `session_id` the current session
    pub async fn switch_session(&self, session_id: &str) -> Result<SessionContext> {
        info!("Switching to session: {}", session_id);

        let session = self
            .get_session(session_id)
            .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;

        self.preferences
            .set_preference(CURRENT_SESSION_KEY, &session.id)
            .await
            .context("Failed to store current session")?;
        self.state.write().unwrap_or_else(PoisonError::into_inner).current = Some(session.id.clone());

        Ok(SessionContext::new(session))
    }

    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.sessions.iter().find(|s| s.id == session_id).cloned()
    }

    pub fn current_session(&self) -> Option<Session> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let current = state.current.as_deref()?;
        state.sessions.iter().find(|s| s.id == current).cloned()
    }

    pub fn current_context(&self) -> Option<SessionContext> {
        self.current_session().map(SessionContext::new)
    }

    fn current_session_id(&self) -> Option<String> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).current.clone()
    }

    pub fn list_sessions(&self) -> SessionListResponse {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        SessionListResponse {
            sessions: state.sessions.clone(),
            current_session_id: state.current.clone(),
        }
    }
}

/// Sessions written by older versions may carry numeric ids or lack fields
fn session_from_record(record: &Record) -> Option<Session> {
    let id = match record_key(Collection::Sessions, record) {
        Ok(id) => id,
        Err(e) => {
            warn!("Skipping unreadable session record: {}", e);
            return None;
        }
    };
    let text = |field: &str| match record.get(field) {
        Some(Value::String(value)) => value.clone(),
        _ => String::new(),
    };
    Some(Session {
        id,
        name: text("name"),
        created_at: text("createdAt"),
    })
}
