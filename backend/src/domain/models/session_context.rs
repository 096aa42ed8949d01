use shared::Session;

/// The active camp session, handed explicitly to every service call that
/// reads or writes session-scoped records
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
