//! Read-side statistics over the session log.
//!
//! Everything here is a pure projection: the log is never mutated, and the
//! same log always yields the same numbers. Only `completed` sessions count
//! toward durations, tag tallies and the streak; cancelled and in-flight
//! sessions are excluded. Calendar bucketing uses the local timezone day.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionStatus, Tag};

/// Per-day rollup. `total_sessions` counts every session started that day,
/// terminal or not; the remaining fields cover the completed subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub total_duration_secs: u64,
    pub by_tag: BTreeMap<Tag, u32>,
}

/// Rollup over a date range (week, month, arbitrary). Completed sessions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub total_duration_secs: u64,
    pub by_tag: BTreeMap<Tag, u32>,
}

/// Statistics projections over a session log.
pub struct StatsAggregator<'a> {
    sessions: &'a [Session],
}

impl<'a> StatsAggregator<'a> {
    pub fn new(sessions: &'a [Session]) -> Self {
        Self { sessions }
    }

    /// Rollup for one calendar day.
    pub fn day_stats(&self, date: NaiveDate) -> DayStats {
        let day_sessions: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| local_day(s.start_time) == date)
            .collect();
        let rollup = aggregate(day_sessions.iter().copied());
        DayStats {
            date,
            total_sessions: day_sessions.len() as u32,
            completed_sessions: rollup.completed_sessions,
            total_duration_secs: rollup.total_duration_secs,
            by_tag: rollup.by_tag,
        }
    }

    /// Completed sessions from the start of the current week (Sunday)
    /// through today, inclusive.
    pub fn week_stats(&self) -> AggregateStats {
        self.week_stats_on(today())
    }

    pub fn week_stats_on(&self, today: NaiveDate) -> AggregateStats {
        self.stats_by_range(start_of_week(today), today)
    }

    /// Completed sessions from the start of the current month through today.
    pub fn month_stats(&self) -> AggregateStats {
        self.month_stats_on(today())
    }

    pub fn month_stats_on(&self, today: NaiveDate) -> AggregateStats {
        self.stats_by_range(start_of_month(today), today)
    }

    /// Completed sessions whose start day falls in `[start, end]` inclusive.
    pub fn stats_by_range(&self, start: NaiveDate, end: NaiveDate) -> AggregateStats {
        aggregate(self.sessions.iter().filter(|s| {
            let day = local_day(s.start_time);
            day >= start && day <= end
        }))
    }

    /// Consecutive calendar days with at least one completed session, ending
    /// today -- or ending yesterday when today has none yet, so an unbroken
    /// streak is not zeroed out mid-day.
    pub fn current_streak(&self) -> u32 {
        self.current_streak_on(today())
    }

    pub fn current_streak_on(&self, today: NaiveDate) -> u32 {
        let completed_days: HashSet<NaiveDate> = self
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .map(|s| local_day(s.start_time))
            .collect();

        let mut day = today;
        if !completed_days.contains(&day) {
            day -= Duration::days(1);
        }

        let mut streak = 0;
        while completed_days.contains(&day) {
            streak += 1;
            day -= Duration::days(1);
        }
        streak
    }

    /// Sum of all completed durations across the entire log, in whole
    /// minutes (rounded).
    pub fn total_minutes(&self) -> u64 {
        let secs: u64 = self
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .map(|s| u64::from(s.duration))
            .sum();
        (secs + 30) / 60
    }
}

fn aggregate<'a>(sessions: impl Iterator<Item = &'a Session>) -> AggregateStats {
    let mut by_tag: BTreeMap<Tag, u32> = Tag::ALL.iter().map(|t| (*t, 0)).collect();
    let mut completed = 0u32;
    let mut total_duration_secs = 0u64;
    for session in sessions.filter(|s| s.status == SessionStatus::Completed) {
        completed += 1;
        total_duration_secs += u64::from(session.duration);
        *by_tag.entry(session.tag).or_insert(0) += 1;
    }
    AggregateStats {
        total_sessions: completed,
        completed_sessions: completed,
        total_duration_secs,
        by_tag,
    }
}

/// Local calendar day a timestamp falls on.
pub fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
