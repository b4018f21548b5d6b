//! Versioned JSON session log with debounced, atomic-replace persistence.
//!
//! The persisted record is a single envelope `{version, sessions}`. Reads
//! never fail the caller: a missing, corrupt or structurally invalid file
//! degrades to the default empty envelope and is reported through the
//! diagnostic log. Writes are best-effort and coalesced: a burst of
//! mutations inside the debounce window produces one physical write of the
//! latest state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::StorageError;
use crate::session::{Session, SessionUpdate};

/// Current version of the persisted envelope.
pub const STORAGE_VERSION: u32 = 1;

/// Quiet window after a mutation before the envelope is written out.
pub const DEBOUNCE_WINDOW_MS: u64 = 500;

const STORE_FILE: &str = "sessions.json";

/// The persisted container: version stamp plus the full session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION,
            sessions: Vec::new(),
        }
    }
}

/// Migrate an envelope of unknown/older version to the current version.
///
/// Version 0 (absent) is stamped with the current version, data untouched.
/// Future migrations compose additively below. Idempotent.
pub fn migrate(mut envelope: Envelope) -> Envelope {
    if envelope.version == 0 {
        envelope.version = STORAGE_VERSION;
        tracing::debug!("migrated session log to version {STORAGE_VERSION}");
    }
    envelope
}

/// Session log store backed by a single JSON file.
pub struct SessionStore {
    path: PathBuf,
    envelope: Envelope,
    debounce_ms: u64,
    /// Epoch ms after which a pending mutation should be written.
    write_deadline_ms: Option<u64>,
}

impl SessionStore {
    /// Open the store at `~/.config/pomotrack/sessions.json`.
    ///
    /// # Errors
    /// Returns an error only if the data directory cannot be prepared; an
    /// unreadable or invalid file degrades to the default empty envelope.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self::open_at(data_dir()?.join(STORE_FILE)))
    }

    /// Open the store at an explicit path (tests, tooling).
    pub fn open_at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let envelope = load_envelope(&path);
        Self {
            path,
            envelope,
            debounce_ms: DEBOUNCE_WINDOW_MS,
            write_deadline_ms: None,
        }
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn sessions(&self) -> &[Session] {
        &self.envelope.sessions
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.envelope.sessions.iter().find(|s| s.id == id)
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a session to the log.
    pub fn add_session(&mut self, session: Session) {
        self.envelope.sessions.push(session);
        self.mark_dirty();
    }

    /// Apply a partial update. Unknown id is a no-op, returns false.
    pub fn update_session(&mut self, id: &str, update: &SessionUpdate) -> bool {
        match self.envelope.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                update.apply_to(session);
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    /// Remove a session. Unknown id is a no-op, returns false.
    pub fn delete_session(&mut self, id: &str) -> bool {
        let before = self.envelope.sessions.len();
        self.envelope.sessions.retain(|s| s.id != id);
        if self.envelope.sessions.len() < before {
            self.mark_dirty();
            true
        } else {
            false
        }
    }

    /// Wipe the log, keeping the current version stamp.
    pub fn clear(&mut self) {
        self.envelope.sessions.clear();
        self.mark_dirty();
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn mark_dirty(&mut self) {
        self.mark_dirty_at(now_ms());
    }

    pub(crate) fn mark_dirty_at(&mut self, now_ms: u64) {
        self.write_deadline_ms = Some(now_ms + self.debounce_ms);
    }

    /// Write the envelope out if the debounce window has elapsed. Call
    /// alongside the timer tick. Failures are logged and the state stays
    /// dirty, so a later call retries.
    pub fn maybe_flush(&mut self) {
        self.maybe_flush_at(now_ms());
    }

    pub(crate) fn maybe_flush_at(&mut self, now_ms: u64) {
        if matches!(self.write_deadline_ms, Some(deadline) if now_ms >= deadline) {
            if let Err(e) = self.save() {
                tracing::warn!("session log write failed: {e}");
            } else {
                self.write_deadline_ms = None;
            }
        }
    }

    /// Write any pending mutation immediately. Call on shutdown.
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails; the
    /// in-memory log is unaffected either way.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if self.write_deadline_ms.is_some() {
            self.save()?;
            self.write_deadline_ms = None;
        }
        Ok(())
    }

    fn save(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.envelope)?;
        // Atomic replace: readers never observe a torn write.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| StorageError::WriteFailed {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StorageError::WriteFailed {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    // ── Import / export ──────────────────────────────────────────────

    /// Serialize the current envelope as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(&self.envelope)?)
    }

    /// Replace the persisted record wholesale from a JSON payload.
    ///
    /// The payload is validated (object with a `sessions` array) before
    /// anything is touched; on rejection the store is unchanged.
    ///
    /// # Errors
    /// Returns `InvalidImport` for malformed payloads, or a write error if
    /// the accepted envelope cannot be persisted.
    pub fn import_json(&mut self, payload: &str) -> Result<(), StorageError> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| StorageError::InvalidImport(e.to_string()))?;
        if !value.is_object() {
            return Err(StorageError::InvalidImport("not a JSON object".into()));
        }
        if !value.get("sessions").map(|s| s.is_array()).unwrap_or(false) {
            return Err(StorageError::InvalidImport(
                "missing 'sessions' array".into(),
            ));
        }
        let envelope: Envelope = serde_json::from_value(value)
            .map_err(|e| StorageError::InvalidImport(e.to_string()))?;

        self.envelope = migrate(envelope);
        self.write_deadline_ms = None;
        self.save()
    }
}

/// Load an envelope from disk, degrading to the default on any problem.
fn load_envelope(path: &Path) -> Envelope {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no session log at {}, starting empty", path.display());
            return Envelope::default();
        }
        Err(e) => {
            tracing::warn!("failed to read session log at {}: {e}", path.display());
            return Envelope::default();
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("corrupt session log at {}: {e}", path.display());
            return Envelope::default();
        }
    };
    if !value.is_object() || !value.get("sessions").map(|s| s.is_array()).unwrap_or(false) {
        tracing::warn!("invalid session log structure at {}", path.display());
        return Envelope::default();
    }

    match serde_json::from_value::<Envelope>(value) {
        Ok(envelope) => migrate(envelope),
        Err(e) => {
            tracing::warn!("invalid session log at {}: {e}", path.display());
            Envelope::default()
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionStatus, Tag};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::open_at(dir.path().join("sessions.json"))
    }

    fn session(tag: Tag) -> Session {
        Session::new(tag, 1500)
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.envelope().version, STORAGE_VERSION);
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SessionStore::open_at(&path);
        assert_eq!(store.envelope(), &Envelope::default());
    }

    #[test]
    fn invalid_shape_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, r#"{"version": 1, "sessions": "nope"}"#).unwrap();
        let store = SessionStore::open_at(&path);
        assert!(store.sessions().is_empty());

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let store = SessionStore::open_at(&path);
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn crud_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let s = session(Tag::Work);
        let id = s.id.clone();
        store.add_session(s);
        store.update_session(&id, &SessionUpdate::status(SessionStatus::Completed));
        store.flush().unwrap();

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.sessions().len(), 1);
        assert_eq!(reloaded.get(&id).unwrap().status, SessionStatus::Completed);
        assert_eq!(reloaded.envelope(), store.envelope());
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_session(session(Tag::Work));
        let before = store.sessions().to_vec();
        assert!(!store.update_session("missing", &SessionUpdate::status(SessionStatus::Paused)));
        assert_eq!(store.sessions(), &before[..]);
    }

    #[test]
    fn delete_unknown_id_leaves_log_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        for tag in Tag::ALL {
            store.add_session(session(tag));
        }
        let before = store.sessions().to_vec();
        assert!(!store.delete_session("no-such-id"));
        assert_eq!(store.sessions().len(), 3);
        assert_eq!(store.sessions(), &before[..]);
    }

    #[test]
    fn missing_version_is_stamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, r#"{"sessions": []}"#).unwrap();
        let store = SessionStore::open_at(&path);
        assert_eq!(store.envelope().version, STORAGE_VERSION);
    }

    #[test]
    fn debounce_coalesces_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        let mut store = SessionStore::open_at(&path);

        let t = 1_000_000;
        store.add_session(session(Tag::Work));
        store.mark_dirty_at(t);
        store.maybe_flush_at(t + 100);
        assert!(!path.exists(), "write inside the quiet window");

        store.add_session(session(Tag::Learn));
        store.mark_dirty_at(t + 200);
        store.maybe_flush_at(t + 400);
        assert!(!path.exists(), "window restarted by second mutation");

        store.maybe_flush_at(t + 200 + DEBOUNCE_WINDOW_MS);
        assert!(path.exists());
        // The single physical write holds the final state of the burst.
        let reloaded = SessionStore::open_at(&path);
        assert_eq!(reloaded.sessions().len(), 2);
    }

    #[test]
    fn import_rejects_malformed_payload_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_session(session(Tag::Rest));
        let before = store.envelope().clone();

        assert!(store.import_json("not json at all").is_err());
        assert!(store.import_json(r#"[1, 2]"#).is_err());
        assert!(store.import_json(r#"{"version": 1}"#).is_err());
        assert!(store.import_json(r#"{"sessions": 42}"#).is_err());
        assert_eq!(store.envelope(), &before);
    }

    #[test]
    fn export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_session(session(Tag::Work));
        store.add_session(session(Tag::Learn));
        let exported = store.export_json().unwrap();

        let other_dir = tempfile::tempdir().unwrap();
        let mut other = store_in(&other_dir);
        other.import_json(&exported).unwrap();
        assert_eq!(other.envelope(), store.envelope());
    }

    fn arb_session() -> impl Strategy<Value = Session> {
        (
            "[a-f0-9-]{8,36}",
            0usize..3,
            0i64..2_000_000_000,
            proptest::option::of(0i64..2_000_000_000),
            1u32..100_000,
            0usize..4,
        )
            .prop_map(|(id, tag, start, end, duration, status)| Session {
                id,
                tag: Tag::ALL[tag],
                start_time: Utc.timestamp_opt(start, 0).unwrap(),
                end_time: end.map(|e| Utc.timestamp_opt(e, 0).unwrap()),
                duration,
                status: [
                    SessionStatus::Running,
                    SessionStatus::Paused,
                    SessionStatus::Completed,
                    SessionStatus::Cancelled,
                ][status],
            })
    }

    proptest! {
        #[test]
        fn envelope_serde_round_trip(sessions in proptest::collection::vec(arb_session(), 0..20)) {
            let envelope = Envelope { version: STORAGE_VERSION, sessions };
            let json = serde_json::to_string(&envelope).unwrap();
            let back: Envelope = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, envelope);
        }

        #[test]
        fn migration_is_idempotent(version in 0u32..4, sessions in proptest::collection::vec(arb_session(), 0..8)) {
            let envelope = Envelope { version, sessions };
            let once = migrate(envelope.clone());
            let twice = migrate(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
