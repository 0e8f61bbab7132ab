//! Messages flowing through the feed: internal timer/player events into the event loop,
//! and host-facing notifications out of it.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::player::adapter::InitOutcome;
use crate::player::PlayerSignal;
use crate::slides::{BreakAction, SlideId, VideoDescriptor};

/// Everything a background task can tell the feed. Timers and players never touch feed
/// state themselves; they post one of these and the event loop applies it.
#[derive(Debug)]
pub(crate) enum FeedEvent {
    Initialized { slide_id: SlideId, outcome: InitOutcome },
    Player { slide_id: SlideId, signal: PlayerSignal },
    ReadyTimeout { slide_id: SlideId },
    ProgressTick { slide_id: SlideId },
    AdvanceDue { slide_id: SlideId },
    RestTick { slide_id: SlideId },
    TransitionFinished { generation: u64 },
    BreakCheckDue,
    /// Posted right after a break is spliced in; releases the insertion guard.
    BreakInsertionSettled,
    BatchLoaded(Result<Vec<VideoDescriptor>>),
    Heartbeat,
}

/// User-visible actions the host may persist or report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedAction {
    Like {
        video: VideoDescriptor,
        liked: bool,
    },
    Dislike {
        video: VideoDescriptor,
        disliked: bool,
    },
    Share {
        video: VideoDescriptor,
    },
    #[serde(rename_all = "camelCase")]
    OpenExternally {
        video: VideoDescriptor,
        url: String,
    },
    /// The user chose to rest on a break slide.
    #[serde(rename_all = "camelCase")]
    BreakStarted {
        video: Option<VideoDescriptor>,
        watch_time_minutes: u32,
    },
    /// The feed moved past a break slide.
    BreakDismissed {
        video: Option<VideoDescriptor>,
        action: BreakAction,
    },
}

/// Notifications delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    Action(FeedAction),
    #[serde(rename_all = "camelCase")]
    SlideChanged { index: usize, slide_id: SlideId },
    #[serde(rename_all = "camelCase")]
    WatchTimeUpdated { total_minutes: f64 },
    #[serde(rename_all = "camelCase")]
    BreakInserted { index: usize, interval_minutes: f64 },
}

/// Receives everything the feed reports. Called with the feed lock held, so
/// implementations must not call back into the controller synchronously.
pub trait FeedHost: Send + Sync {
    fn emit(&self, event: HostEvent);
}

/// Host that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl FeedHost for NullHost {
    fn emit(&self, _event: HostEvent) {}
}

/// Source of more videos once the feed runs low.
#[async_trait]
pub trait VideoSupply: Send + Sync {
    async fn generate_next_batch(&self, count: usize) -> Result<Vec<VideoDescriptor>>;
}

/// Supply for fixed feeds that never grow.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySupply;

#[async_trait]
impl VideoSupply for EmptySupply {
    async fn generate_next_batch(&self, _count: usize) -> Result<Vec<VideoDescriptor>> {
        Ok(Vec::new())
    }
}
