//! Client-side spawn state for one console session.
//!
//! [`SharedSpawnState`] is the single owner of the session's [`SpawnState`].
//! It is constructed once and handed by clone to the health prober, the
//! spawn coordinator and the dashboard; there is no global.
//!
//! Entering `Owned` or `Observing` only succeeds from `Idle`. A successful
//! transition returns a [`SpawnAttempt`] guard, and only that guard can put
//! the state back to `Idle`. Each attempt is numbered, so a late settle from
//! a finished attempt cannot clobber a newer one.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::error::TransitionError;
use crate::event::{ConsoleEvent, EventSender, emit};

/// Who is driving the current spawn, if anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMode {
    /// No spawn known to this session.
    Idle,
    /// This session submitted the spawn and enforces its timeout.
    Owned,
    /// Another client (or a previous run) started it; we only watch health.
    Observing,
}

impl fmt::Display for SpawnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnMode::Idle => write!(f, "idle"),
            SpawnMode::Owned => write!(f, "owned"),
            SpawnMode::Observing => write!(f, "observing"),
        }
    }
}

/// Snapshot of the session's spawn state.
///
/// `active` is true exactly when `mode` is not `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnState {
    active: bool,
    mode: SpawnMode,
    agent_id: Option<String>,
    start_time: Option<Instant>,
    attempt: u64,
}

impl SpawnState {
    fn idle(attempt: u64) -> Self {
        Self {
            active: false,
            mode: SpawnMode::Idle,
            agent_id: None,
            start_time: None,
            attempt,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn mode(&self) -> SpawnMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == SpawnMode::Idle
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    /// Number of the most recent attempt (0 before the first).
    pub fn attempt(&self) -> u64 {
        self.attempt
    }
}

impl Default for SpawnState {
    fn default() -> Self {
        Self::idle(0)
    }
}

/// Shared handle to the session's spawn state.
#[derive(Debug, Clone)]
pub struct SharedSpawnState {
    inner: Arc<Mutex<SpawnState>>,
    events: Option<EventSender>,
}

impl SharedSpawnState {
    pub fn new(events: Option<EventSender>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SpawnState::default())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SpawnState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SpawnState {
        self.lock().clone()
    }

    pub fn mode(&self) -> SpawnMode {
        self.lock().mode
    }

    pub fn is_idle(&self) -> bool {
        self.lock().is_idle()
    }

    /// Enter `Owned` for a freshly submitted spawn.
    pub fn begin_owned(&self, agent_id: &str) -> Result<SpawnAttempt, TransitionError> {
        self.begin(SpawnMode::Owned, agent_id)
    }

    /// Enter `Observing` for a spawn discovered in flight on the bridge.
    pub fn begin_observing(&self, agent_id: &str) -> Result<SpawnAttempt, TransitionError> {
        self.begin(SpawnMode::Observing, agent_id)
    }

    fn begin(&self, mode: SpawnMode, agent_id: &str) -> Result<SpawnAttempt, TransitionError> {
        let (snapshot, attempt, started_at) = {
            let mut state = self.lock();
            if !state.is_idle() {
                return Err(TransitionError::NotIdle {
                    mode: state.mode,
                    agent_id: state.agent_id.clone().unwrap_or_default(),
                });
            }
            let started_at = Instant::now();
            let attempt = state.attempt + 1;
            *state = SpawnState {
                active: true,
                mode,
                agent_id: Some(agent_id.to_string()),
                start_time: Some(started_at),
                attempt,
            };
            (state.clone(), attempt, started_at)
        };

        tracing::debug!(%mode, agent_id, attempt, "Spawn state entered");
        emit(self.events.as_ref(), ConsoleEvent::SpawnState(snapshot));

        Ok(SpawnAttempt {
            state: self.clone(),
            attempt,
            mode,
            agent_id: agent_id.to_string(),
            started_at,
            settled: false,
        })
    }

    /// Return to `Idle` if `attempt` is still the current one.
    fn settle(&self, attempt: u64) -> bool {
        let snapshot = {
            let mut state = self.lock();
            if state.is_idle() || state.attempt != attempt {
                return false;
            }
            *state = SpawnState::idle(attempt);
            state.clone()
        };

        tracing::debug!(attempt, "Spawn state returned to idle");
        emit(self.events.as_ref(), ConsoleEvent::SpawnState(snapshot));
        true
    }
}

impl Default for SharedSpawnState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Proof of a successful transition out of `Idle`.
///
/// [`SpawnAttempt::settle`] returns the session to `Idle`. Dropping an
/// unsettled attempt settles it too, so an aborted task can never leave the
/// session stuck in a spawning mode.
#[derive(Debug)]
pub struct SpawnAttempt {
    state: SharedSpawnState,
    attempt: u64,
    mode: SpawnMode,
    agent_id: String,
    started_at: Instant,
    settled: bool,
}

impl SpawnAttempt {
    pub fn number(&self) -> u64 {
        self.attempt
    }

    pub fn mode(&self) -> SpawnMode {
        self.mode
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Return to `Idle`. Returns whether this call performed the transition.
    pub fn settle(mut self) -> bool {
        self.settled = true;
        self.state.settle(self.attempt)
    }
}

impl Drop for SpawnAttempt {
    fn drop(&mut self) {
        if !self.settled && self.state.settle(self.attempt) {
            tracing::warn!(
                attempt = self.attempt,
                agent_id = %self.agent_id,
                "Spawn attempt dropped without settling; state reset to idle"
            );
        }
    }
}
