//! Session orchestrator: bridges user intents to the clock engine and the
//! session store.
//!
//! Owns the at-most-one "current session" reference. Every session record
//! mutation goes through the store's update path; the engine never touches
//! the log. Completion finalization always lands in the log before a
//! subsequent start can create a new current session.

use chrono::Utc;

use crate::events::Event;
use crate::session::{Session, SessionStatus, SessionUpdate, Tag, TimerState};
use crate::stats::StatsAggregator;
use crate::storage::SessionStore;
use crate::timer::ClockEngine;

/// Fire-and-forget completion side effect (sound, favicon, desktop toast).
/// Implementations must swallow their own failures; `notify` is invoked at
/// most once per completed timer.
pub trait CompletionNotifier {
    fn notify(&self, session: &Session);
}

/// Default notifier that does nothing.
pub struct NoopNotifier;

impl CompletionNotifier for NoopNotifier {
    fn notify(&self, _session: &Session) {}
}

pub struct Orchestrator {
    engine: ClockEngine,
    store: SessionStore,
    current_session_id: Option<String>,
    notifier: Box<dyn CompletionNotifier>,
}

impl Orchestrator {
    /// Fresh orchestrator with an idle engine of the given nominal duration.
    pub fn new(store: SessionStore, duration_secs: u32) -> Self {
        Self {
            engine: ClockEngine::new(duration_secs),
            store,
            current_session_id: None,
            notifier: Box::new(NoopNotifier),
        }
    }

    /// Rebuild from persisted engine state (CLI invocations). A current
    /// session id that no longer resolves to a live session is dropped and
    /// the engine reset, so a stale reference cannot resurrect a timer.
    pub fn restore(
        store: SessionStore,
        engine: ClockEngine,
        current_session_id: Option<String>,
    ) -> Self {
        let mut orchestrator = Self {
            engine,
            store,
            current_session_id,
            notifier: Box::new(NoopNotifier),
        };
        let live = orchestrator
            .current_session_id
            .as_deref()
            .and_then(|id| orchestrator.store.get(id))
            .map(|s| !s.status.is_terminal())
            .unwrap_or(false);
        if !live {
            orchestrator.current_session_id = None;
            if orchestrator.engine.is_active() {
                orchestrator.engine.reset();
            }
        }
        orchestrator
    }

    pub fn with_notifier(mut self, notifier: Box<dyn CompletionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    // ── Timer intents ────────────────────────────────────────────────

    /// Start a new tagged session.
    ///
    /// Any completion that is already due is finalized first, and a
    /// surviving current session is auto-cancelled, so at most one session
    /// is ever running or paused.
    pub fn start_timer(&mut self, tag: Tag) -> Session {
        self.tick();
        if let Some(id) = self.current_session_id.take() {
            self.store
                .update_session(&id, &SessionUpdate::cancelled_at(Utc::now()));
        }

        let session = Session::new(tag, self.engine.duration_secs());
        self.current_session_id = Some(session.id.clone());
        self.store.add_session(session.clone());
        self.engine.start();
        session
    }

    /// Pause the running session. No-op unless running.
    pub fn pause_timer(&mut self) -> Option<Event> {
        let event = self.engine.pause()?;
        if let Some(id) = self.current_session_id.clone() {
            self.store
                .update_session(&id, &SessionUpdate::status(SessionStatus::Paused));
        }
        Some(event)
    }

    /// Resume the paused session. No-op unless paused.
    pub fn resume_timer(&mut self) -> Option<Event> {
        let event = self.engine.resume()?;
        if let Some(id) = self.current_session_id.clone() {
            self.store
                .update_session(&id, &SessionUpdate::status(SessionStatus::Running));
        }
        Some(event)
    }

    /// Cancel the current session (terminal) and return the engine to idle.
    pub fn reset_timer(&mut self) -> Event {
        if let Some(id) = self.current_session_id.take() {
            self.store
                .update_session(&id, &SessionUpdate::cancelled_at(Utc::now()));
        }
        self.engine.reset()
    }

    /// Complete the current session early, recording the actually elapsed
    /// seconds (floored at 1) instead of the nominal duration.
    pub fn complete_timer(&mut self) -> Option<Session> {
        self.current_session_id.as_ref()?;
        let remaining = self.engine.remaining_secs();
        self.engine.reset();
        self.finalize_completion(remaining)
    }

    /// Drive the countdown. Call periodically (nominally once per second).
    /// Returns the completed session when the countdown reaches zero.
    pub fn tick(&mut self) -> Option<Session> {
        let completed = match self.engine.tick() {
            Some(Event::TimerCompleted { .. }) => self.finalize_completion(0),
            _ => None,
        };
        self.store.maybe_flush();
        completed
    }

    fn finalize_completion(&mut self, remaining_secs: u32) -> Option<Session> {
        let id = self.current_session_id.take()?;
        let elapsed = self.engine.duration_secs().saturating_sub(remaining_secs);
        let update = SessionUpdate {
            status: Some(SessionStatus::Completed),
            end_time: Some(Utc::now()),
            duration: Some(elapsed.max(1)),
            ..SessionUpdate::default()
        };
        self.store.update_session(&id, &update);
        let session = self.store.get(&id).cloned()?;
        self.notifier.notify(&session);
        Some(session)
    }

    // ── Query surface ────────────────────────────────────────────────

    pub fn timer_state(&self) -> TimerState {
        TimerState {
            is_active: self.engine.is_active(),
            is_paused: self.engine.is_paused(),
            time_remaining: self.engine.remaining_secs(),
            current_session: self.current_session().cloned(),
        }
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current_session_id
            .as_deref()
            .and_then(|id| self.store.get(id))
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub fn sessions(&self) -> &[Session] {
        self.store.sessions()
    }

    pub fn stats(&self) -> StatsAggregator<'_> {
        StatsAggregator::new(self.store.sessions())
    }

    pub fn engine(&self) -> &ClockEngine {
        &self.engine
    }

    // ── Session CRUD passthrough ─────────────────────────────────────

    pub fn delete_session(&mut self, id: &str) -> bool {
        if self.current_session_id.as_deref() == Some(id) {
            self.current_session_id = None;
            self.engine.reset();
        }
        self.store.delete_session(id)
    }

    pub fn update_session(&mut self, id: &str, update: &SessionUpdate) -> bool {
        self.store.update_session(id, update)
    }

    /// Write any pending log mutation immediately. Call on shutdown.
    ///
    /// # Errors
    /// Returns an error if the write fails; the in-memory log is unaffected.
    pub fn flush(&mut self) -> Result<(), crate::error::StorageError> {
        self.store.flush()
    }
}
