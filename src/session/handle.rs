use super::lock;
use crate::models::{ScanSessionState, SessionStats};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Identifier of one session opened on a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    /// Raw sequence number, starting at 1 per controller
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State and counters of one session, shared with its handles
#[derive(Debug)]
pub(crate) struct SessionRecord {
    pub(crate) state: ScanSessionState,
    pub(crate) stats: SessionStats,
}

impl SessionRecord {
    pub(crate) fn new() -> Self {
        Self {
            state: ScanSessionState::Initializing,
            stats: SessionStats::default(),
        }
    }
}

/// Controller side of a handle: cancels a session by id
pub(crate) trait SessionControl: Send + Sync {
    fn cancel_session(&self, id: SessionId);
}

/// Caller's grip on an open session
///
/// Cheap to clone and safe to move to other threads. Cancelling a session
/// that already finished, was superseded, or whose controller was dropped
/// does nothing.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    record: Arc<Mutex<SessionRecord>>,
    cancel_requested: Arc<AtomicBool>,
    control: Weak<dyn SessionControl>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        record: Arc<Mutex<SessionRecord>>,
        cancel_requested: Arc<AtomicBool>,
        control: Weak<dyn SessionControl>,
    ) -> Self {
        Self {
            id,
            record,
            cancel_requested,
            control,
        }
    }

    /// Which session this handle refers to
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Close the session
    ///
    /// Takes effect at once: no frame or decode applied after this call can
    /// change the outcome, even one already in flight on another thread.
    /// The camera is released before returning, unless a frame request is
    /// in flight; then it is released as soon as that request returns.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        match self.control.upgrade() {
            Some(control) => control.cancel_session(self.id),
            None => log::trace!("session {} cancel ignored: controller dropped", self.id),
        }
    }

    /// Snapshot of the session state
    pub fn state(&self) -> ScanSessionState {
        lock(&self.record).state.clone()
    }

    /// Snapshot of the session counters
    pub fn stats(&self) -> SessionStats {
        lock(&self.record).stats
    }

    /// True once the session has succeeded, failed or been cancelled
    pub fn is_terminal(&self) -> bool {
        lock(&self.record).state.is_terminal()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
