//! Session types: the unit of tracked time and its lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category label applied to a session. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Work,
    Learn,
    Rest,
}

impl Tag {
    pub const ALL: [Tag; 3] = [Tag::Work, Tag::Learn, Tag::Rest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Work => "work",
            Tag::Learn => "learn",
            Tag::Rest => "rest",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Tag::Work),
            "learn" => Ok(Tag::Learn),
            "rest" => Ok(Tag::Rest),
            other => Err(format!("unknown tag '{other}' (expected work, learn or rest)")),
        }
    }
}

/// Session lifecycle status.
///
/// `Running` and `Paused` are transient; `Completed` and `Cancelled` are
/// terminal. Transitions follow the orchestrator's state machine only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

/// One tracked time-boxed unit of work/rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique id, stable for the session's lifetime.
    pub id: String,
    pub tag: Tag,
    pub start_time: DateTime<Utc>,
    /// Set when the session reaches a terminal state; never cleared afterwards.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Planned duration in seconds at creation; overwritten with the actual
    /// elapsed seconds on completion.
    pub duration: u32,
    pub status: SessionStatus,
}

impl Session {
    /// Create a new running session starting now.
    pub fn new(tag: Tag, duration_secs: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tag,
            start_time: Utc::now(),
            end_time: None,
            duration: duration_secs,
            status: SessionStatus::Running,
        }
    }
}

/// Partial update applied to a stored session. `None` fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(default)]
    pub tag: Option<Tag>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<u32>,
}

impl SessionUpdate {
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Terminal cancellation stamped with the given end time.
    pub fn cancelled_at(end_time: DateTime<Utc>) -> Self {
        Self {
            status: Some(SessionStatus::Cancelled),
            end_time: Some(end_time),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, session: &mut Session) {
        if let Some(tag) = self.tag {
            session.tag = tag;
        }
        if let Some(status) = self.status {
            session.status = status;
        }
        if let Some(end_time) = self.end_time {
            session.end_time = Some(end_time);
        }
        if let Some(duration) = self.duration {
            session.duration = duration;
        }
    }
}

/// Snapshot of the timer surface consumed by presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_active: bool,
    pub is_paused: bool,
    /// Whole seconds remaining on the countdown.
    pub time_remaining: u32,
    #[serde(default)]
    pub current_session: Option<Session>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_through_str() {
        for tag in Tag::ALL {
            assert_eq!(tag.as_str().parse::<Tag>().unwrap(), tag);
        }
        assert!("coffee".parse::<Tag>().is_err());
    }

    #[test]
    fn update_leaves_unset_fields_alone() {
        let mut session = Session::new(Tag::Work, 1500);
        let original_start = session.start_time;
        SessionUpdate::status(SessionStatus::Paused).apply_to(&mut session);
        assert_eq!(session.status, SessionStatus::Paused);
        assert_eq!(session.start_time, original_start);
        assert_eq!(session.duration, 1500);
        assert!(session.end_time.is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
        assert!(!SessionStatus::Paused.is_terminal());
    }
}
