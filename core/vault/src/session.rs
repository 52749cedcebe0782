//! Profile session management.
//!
//! An unlocked session is the only place a live master key exists. Callers
//! borrow the key through the session handle; once the session locks (by
//! logout, idle timeout, or drop) the key is zeroized and no path to the
//! master key remains without unlocking again.

use std::time::{Duration, Instant};
use uuid::Uuid;

use finvault_common::{Error, ProfileId, Result};
use finvault_crypto::MasterKey;

/// Session handle for tracking active sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Generate a new unique session handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a profile session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session is active and the master key is available.
    Active,
    /// Session is locked, the master key has been cleared.
    Locked,
}

/// Active profile session owning the live master key.
///
/// The master key is zeroized when the session is locked or dropped.
/// Locking never touches persisted state: the wrapped copies remain and
/// the profile can be unlocked again with either factor.
pub struct Session {
    /// Unique session identifier.
    handle: SessionHandle,
    /// Profile this session belongs to.
    profile_id: ProfileId,
    /// Master key (zeroized on drop).
    master_key: Option<MasterKey>,
    /// Session state.
    state: SessionState,
    /// Last caller activity, for idle expiry.
    last_activity: Instant,
    /// Host-supplied inactivity timeout; None disables expiry.
    idle_timeout: Option<Duration>,
}

impl Session {
    /// Create an unlocked session holding the master key.
    pub(crate) fn unlocked(
        profile_id: ProfileId,
        master_key: MasterKey,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            handle: SessionHandle::new(),
            profile_id,
            master_key: Some(master_key),
            state: SessionState::Active,
            last_activity: Instant::now(),
            idle_timeout,
        }
    }

    /// Get the session handle.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Get the profile id.
    pub fn profile_id(&self) -> &ProfileId {
        &self.profile_id
    }

    /// Get the master key, if the session is active.
    ///
    /// # Errors
    /// - `KeyNotFound` if the session is locked
    pub fn master_key(&self) -> Result<&MasterKey> {
        match self.state {
            SessionState::Active => self
                .master_key
                .as_ref()
                .ok_or_else(|| Error::KeyNotFound("Master key not available".to_string())),
            SessionState::Locked => Err(Error::KeyNotFound("Session is locked".to_string())),
        }
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session is active.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Record caller activity, postponing idle expiry.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Lock the session if the host-supplied idle timeout has elapsed.
    ///
    /// The host UI calls this on its own cadence. An operation that
    /// borrowed the master key before the timeout keeps its borrow and
    /// completes normally; the lock only prevents new borrows.
    ///
    /// Returns true if the session was locked by this call.
    pub fn expire_if_idle(&mut self) -> bool {
        let Some(timeout) = self.idle_timeout else {
            return false;
        };
        if self.state == SessionState::Active && self.last_activity.elapsed() >= timeout {
            self.lock();
            return true;
        }
        false
    }

    /// Lock the session, clearing the master key from memory.
    ///
    /// # Postconditions
    /// - Master key is zeroized and removed
    /// - Persisted wrapped copies are unaffected
    pub fn lock(&mut self) {
        if let Some(key) = self.master_key.take() {
            // Zeroized on drop via ZeroizeOnDrop.
            drop(key);
        }
        self.state = SessionState::Locked;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Ensure the key is zeroized
        self.lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlocked_session(timeout: Option<Duration>) -> Session {
        Session::unlocked(
            ProfileId::new("alice").unwrap(),
            MasterKey::generate(),
            timeout,
        )
    }

    #[test]
    fn test_active_session_exposes_key() {
        let session = unlocked_session(None);
        assert!(session.is_active());
        assert!(session.master_key().is_ok());
    }

    #[test]
    fn test_lock_clears_key() {
        let mut session = unlocked_session(None);
        session.lock();

        assert!(!session.is_active());
        assert_eq!(session.state(), SessionState::Locked);
        let result = session.master_key();
        assert!(matches!(result, Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_idle_timeout_locks_session() {
        let mut session = unlocked_session(Some(Duration::ZERO));

        assert!(session.expire_if_idle());
        assert!(!session.is_active());
    }

    #[test]
    fn test_no_timeout_never_expires() {
        let mut session = unlocked_session(None);
        assert!(!session.expire_if_idle());
        assert!(session.is_active());
    }

    #[test]
    fn test_touch_defers_expiry() {
        let mut session = unlocked_session(Some(Duration::from_secs(3600)));
        session.touch();
        assert!(!session.expire_if_idle());
        assert!(session.is_active());
    }
}
