//! Boundary to the embeddable video player.
//!
//! The engine never reaches for a global player API. A [`PlayerCapabilityLoader`] is
//! injected at construction; it may resolve to a [`PlayerCapability`] that creates one
//! [`PlayerHandle`] per slide, or to nothing at all, in which case slides run on the
//! synthetic clock.

pub mod adapter;
pub mod synthetic;

pub use adapter::{PlayerAdapter, ProgressSample};
pub use synthetic::SyntheticClock;

use std::{fmt, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::feed::events::FeedEvent;
use crate::slides::SlideId;

/// Why an embedded player refused to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackErrorKind {
    InvalidParameter,
    Html5Playback,
    NotFound,
    EmbedRestricted,
    Other(i32),
}

impl PlaybackErrorKind {
    /// Map an embed error code onto a kind.
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => PlaybackErrorKind::InvalidParameter,
            5 => PlaybackErrorKind::Html5Playback,
            100 => PlaybackErrorKind::NotFound,
            101 | 150 => PlaybackErrorKind::EmbedRestricted,
            other => PlaybackErrorKind::Other(other),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PlaybackErrorKind::InvalidParameter => "This video link looks broken.",
            PlaybackErrorKind::Html5Playback => "Your browser can't play this video here.",
            PlaybackErrorKind::NotFound => "This video was removed or made private.",
            PlaybackErrorKind::EmbedRestricted => "The creator doesn't allow playing this video here.",
            PlaybackErrorKind::Other(_) => "Something went wrong while playing this video.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum PlayerError {
    /// The player capability failed to load, or the player never became ready.
    Initialization(String),
    /// The player reported an error after it was ready.
    Playback(PlaybackErrorKind),
}

impl PlayerError {
    pub fn message(&self) -> &'static str {
        match self {
            PlayerError::Initialization(_) => "The video player could not be loaded.",
            PlayerError::Playback(kind) => kind.message(),
        }
    }
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerError::Initialization(reason) => write!(f, "player initialization failed: {reason}"),
            PlayerError::Playback(kind) => write!(f, "playback failed: {kind:?}"),
        }
    }
}

impl std::error::Error for PlayerError {}

/// Per-slide player lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "camelCase")]
pub enum PlayerState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Playing,
    Paused,
    Buffering,
    Ended,
    Error(PlayerError),
}

impl PlayerState {
    pub fn is_error(&self) -> bool {
        matches!(self, PlayerState::Error(_))
    }

    /// States in which the player is producing (or about to produce) frames.
    pub fn is_running(&self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Buffering)
    }

    /// States in which a created player can be told to play.
    pub fn is_playable(&self) -> bool {
        matches!(
            self,
            PlayerState::Ready | PlayerState::Paused | PlayerState::Ended | PlayerState::Playing | PlayerState::Buffering
        )
    }
}

/// Playback state change pushed by an embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSignal {
    Ready,
    Playing,
    Paused,
    Buffering,
    Ended,
    Error(i32),
}

/// Where an embedded player reports its state changes. Cloneable so the capability can
/// hand it to whatever callback machinery the embed uses.
#[derive(Clone)]
pub struct PlayerEventSink {
    slide_id: SlideId,
    tx: UnboundedSender<FeedEvent>,
}

impl PlayerEventSink {
    pub(crate) fn new(slide_id: SlideId, tx: UnboundedSender<FeedEvent>) -> Self {
        Self { slide_id, tx }
    }

    pub fn slide_id(&self) -> SlideId {
        self.slide_id
    }

    /// Returns false once the feed has shut down.
    pub fn emit(&self, signal: PlayerSignal) -> bool {
        self.tx
            .send(FeedEvent::Player {
                slide_id: self.slide_id,
                signal,
            })
            .is_ok()
    }
}

impl fmt::Debug for PlayerEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerEventSink")
            .field("slide_id", &self.slide_id)
            .finish()
    }
}

/// One live embedded player. Commands are fire-and-forget; timing queries return `None`
/// when the player cannot report them.
pub trait PlayerHandle: Send + Sync {
    fn play(&self);
    fn pause(&self);
    fn seek_to(&self, seconds: f64);
    fn current_time(&self) -> Option<f64>;
    fn duration(&self) -> Option<f64>;
    fn destroy(&self);
}

#[async_trait]
pub trait PlayerCapability: Send + Sync {
    /// Create a player for `video_id`. Readiness is reported later through `sink`.
    async fn create_player(&self, video_id: &str, sink: PlayerEventSink) -> Result<Box<dyn PlayerHandle>>;
}

#[async_trait]
pub trait PlayerCapabilityLoader: Send + Sync {
    /// Make sure the player API is available. `Ok(None)` means this environment has no
    /// embeddable player at all.
    async fn ensure_loaded(&self) -> Result<Option<Arc<dyn PlayerCapability>>>;
}

/// Loader for environments without any embeddable player.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlayerCapability;

#[async_trait]
impl PlayerCapabilityLoader for NoPlayerCapability {
    async fn ensure_loaded(&self) -> Result<Option<Arc<dyn PlayerCapability>>> {
        Ok(None)
    }
}
