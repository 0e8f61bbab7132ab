use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc::UnboundedSender, time::Instant};

use crate::feed::events::FeedEvent;
use crate::utils::tasks::{spawn_every, TaskSlot};

/// Wall-clock watch time since the session began. Pausing or navigating does not stop it.
#[derive(Debug)]
pub struct WatchTimeTracker {
    session_start: Instant,
    started_at: DateTime<Utc>,
    last_total_minutes: f64,
    heartbeats: u64,
    heartbeat: TaskSlot,
}

impl Default for WatchTimeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchTimeTracker {
    pub fn new() -> Self {
        Self {
            session_start: Instant::now(),
            started_at: Utc::now(),
            last_total_minutes: 0.0,
            heartbeats: 0,
            heartbeat: TaskSlot::new(),
        }
    }

    /// Restart the session clock, e.g. when the feed actually goes live.
    pub fn reset(&mut self) {
        self.session_start = Instant::now();
        self.started_at = Utc::now();
        self.last_total_minutes = 0.0;
        self.heartbeats = 0;
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Minutes elapsed since the session started. Never decreases.
    pub fn total_watch_time_minutes(&mut self) -> f64 {
        let elapsed = Instant::now().saturating_duration_since(self.session_start);
        let minutes = elapsed.as_secs_f64() / 60.0;
        self.last_total_minutes = self.last_total_minutes.max(minutes);
        self.last_total_minutes
    }

    /// The last value handed out by [`total_watch_time_minutes`](Self::total_watch_time_minutes).
    pub fn last_total_minutes(&self) -> f64 {
        self.last_total_minutes
    }

    pub(crate) fn start_heartbeat(&mut self, period: Duration, events: UnboundedSender<FeedEvent>) {
        self.heartbeat
            .replace(spawn_every(period, events, || FeedEvent::Heartbeat));
    }

    pub(crate) fn stop_heartbeat(&mut self) {
        self.heartbeat.abort();
    }

    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_running()
    }

    /// Count one heartbeat; returns how many have been seen this session.
    pub(crate) fn record_heartbeat(&mut self) -> u64 {
        self.heartbeats += 1;
        self.heartbeats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn total_follows_elapsed_time() {
        let mut tracker = WatchTimeTracker::new();
        assert_eq!(tracker.total_watch_time_minutes(), 0.0);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(tracker.total_watch_time_minutes(), 0.5);

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(tracker.total_watch_time_minutes(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn total_never_decreases() {
        let mut tracker = WatchTimeTracker::new();
        let mut previous = 0.0;
        for _ in 0..20 {
            tokio::time::advance(Duration::from_millis(750)).await;
            let total = tracker.total_watch_time_minutes();
            assert!(total >= previous);
            previous = total;
        }
        assert_eq!(tracker.last_total_minutes(), previous);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_posts_events_until_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = WatchTimeTracker::new();
        tracker.start_heartbeat(Duration::from_secs(1), tx);

        for expected in 1..=3 {
            assert!(matches!(rx.recv().await, Some(FeedEvent::Heartbeat)));
            assert_eq!(tracker.record_heartbeat(), expected);
        }

        tracker.stop_heartbeat();
        assert!(!tracker.heartbeat_running());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
