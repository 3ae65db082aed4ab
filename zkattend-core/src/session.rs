//! Session bookkeeping
//!
//! A session tracks the id the terminal assigned on `CMD_CONNECT`, the reply
//! counter stamped on every request, and whether CommKey auth was needed.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected
    Disconnected,

    /// Connected, terminal did not ask for a password
    Connected,

    /// Connected after a successful `CMD_AUTH`
    Authenticated,
}

/// Session handle, cheap to clone (shared state)
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    session_id: AtomicU16,
    reply_counter: AtomicU16,
    state: RwLock<SessionState>,
}

impl Session {
    /// First reply id handed out after connect
    pub const INITIAL_REPLY_ID: u16 = 65534;

    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                session_id: AtomicU16::new(0),
                reply_counter: AtomicU16::new(Self::INITIAL_REPLY_ID),
                state: RwLock::new(SessionState::Disconnected),
            }),
        }
    }

    /// Session id assigned by the terminal (0 when disconnected)
    pub fn session_id(&self) -> u16 {
        self.inner.session_id.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() != SessionState::Disconnected
    }

    /// Open the session with the terminal-assigned id
    pub fn initialize(&self, session_id: u16, authenticated: bool) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "cannot initialize from {:?}",
                *state
            )));
        }

        self.inner.session_id.store(session_id, Ordering::Release);
        self.inner
            .reply_counter
            .store(Self::INITIAL_REPLY_ID, Ordering::Release);
        *state = if authenticated {
            SessionState::Authenticated
        } else {
            SessionState::Connected
        };

        Ok(())
    }

    /// Close session
    pub fn close(&self) {
        let mut state = self.inner.state.write();
        self.inner.session_id.store(0, Ordering::Release);
        self.inner
            .reply_counter
            .store(Self::INITIAL_REPLY_ID, Ordering::Release);
        *state = SessionState::Disconnected;
    }

    /// Next reply id, wrapping at `u16::MAX`
    pub fn next_reply_id(&self) -> u16 {
        self.inner.reply_counter.fetch_add(1, Ordering::AcqRel)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let session = Session::new();
        assert!(!session.is_connected());

        session.initialize(1234, false).unwrap();
        assert_eq!(session.session_id(), 1234);
        assert_eq!(session.state(), SessionState::Connected);

        session.close();
        assert_eq!(session.session_id(), 0);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_session_authenticated() {
        let session = Session::new();
        session.initialize(7, true).unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
        assert!(session.is_connected());
    }

    #[test]
    fn test_cannot_initialize_twice() {
        let session = Session::new();
        session.initialize(100, false).unwrap();
        assert!(session.initialize(200, false).is_err());
    }

    #[test]
    fn test_reply_id_wraps() {
        let session = Session::new();
        session.initialize(100, false).unwrap();

        assert_eq!(session.next_reply_id(), 65534);
        assert_eq!(session.next_reply_id(), 65535);
        assert_eq!(session.next_reply_id(), 0);
    }

    #[test]
    fn test_close_resets_reply_counter() {
        let session = Session::new();
        session.initialize(1, false).unwrap();
        session.next_reply_id();
        session.close();
        session.initialize(2, false).unwrap();
        assert_eq!(session.next_reply_id(), Session::INITIAL_REPLY_ID);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Session::new();
        let b = a.clone();
        a.initialize(42, false).unwrap();
        assert_eq!(b.session_id(), 42);
    }
}
