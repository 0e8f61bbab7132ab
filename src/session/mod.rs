//! Per-feed watch session: elapsed watch time plus the break schedule it drives.

pub mod breaks;
pub mod tracker;

pub use breaks::BreakSchedule;
pub use tracker::WatchTimeTracker;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A break the session wants inserted now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DueBreak {
    pub slot: usize,
    pub interval_minutes: f64,
    pub watch_time_minutes: f64,
}

#[derive(Debug)]
pub struct WatchSession {
    tracker: WatchTimeTracker,
    schedule: BreakSchedule,
}

impl WatchSession {
    pub fn new(break_intervals_minutes: &[f64]) -> Self {
        Self {
            tracker: WatchTimeTracker::new(),
            schedule: BreakSchedule::new(break_intervals_minutes),
        }
    }

    pub fn tracker(&self) -> &WatchTimeTracker {
        &self.tracker
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut WatchTimeTracker {
        &mut self.tracker
    }

    pub fn total_watch_time_minutes(&mut self) -> f64 {
        self.tracker.total_watch_time_minutes()
    }

    /// The next break whose interval has been reached, without consuming it.
    pub fn due_break(&mut self) -> Option<DueBreak> {
        let watch_time_minutes = self.tracker.total_watch_time_minutes();
        let slot = self.schedule.next_due(watch_time_minutes)?;
        Some(DueBreak {
            slot,
            interval_minutes: self.schedule.intervals()[slot],
            watch_time_minutes,
        })
    }

    pub fn consume(&mut self, due: &DueBreak) -> bool {
        self.schedule.consume(due.slot).is_some()
    }

    pub fn snapshot(&self) -> WatchSessionSnapshot {
        WatchSessionSnapshot {
            started_at: self.tracker.started_at(),
            total_watch_time_minutes: self.tracker.last_total_minutes(),
            break_intervals_minutes: self.schedule.intervals().to_vec(),
            inserted_break_times: self.schedule.inserted_break_times(),
            last_break_time_minutes: self.schedule.last_break_minutes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSessionSnapshot {
    pub started_at: DateTime<Utc>,
    pub total_watch_time_minutes: f64,
    pub break_intervals_minutes: Vec<f64>,
    pub inserted_break_times: Vec<f64>,
    pub last_break_time_minutes: f64,
}
