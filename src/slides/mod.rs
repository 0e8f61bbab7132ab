pub mod break_slide;
pub mod thumbnail;
pub mod video;

pub use break_slide::{BreakAction, BreakPhase, BreakSlide, BreakSlideView, BreakTier};
pub use thumbnail::ThumbnailCandidates;
pub use video::{FallbackView, Progress, VideoSlide, VideoSlideView};

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::feed::events::{FeedAction, FeedEvent};
use crate::player::PlayerCapabilityLoader;
use crate::settings::FeedConfig;

/// Stable identity of a slide. Indices shift when breaks are spliced in; ids never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlideId(Uuid);

impl SlideId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlideId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A video as handed over by the video supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDescriptor {
    pub video_id: String,
    pub title: String,
    pub creator_label: String,
}

impl VideoDescriptor {
    pub fn new(video_id: impl Into<String>, title: impl Into<String>, creator_label: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            creator_label: creator_label.into(),
        }
    }

    /// Where "open externally" sends the user.
    pub fn external_url(&self) -> String {
        format!("https://www.youtube.com/shorts/{}", self.video_id)
    }
}

/// What a slide needs from the feed to start background work.
pub(crate) struct SlideContext<'a> {
    pub config: &'a FeedConfig,
    pub events: &'a UnboundedSender<FeedEvent>,
    pub loader: &'a Arc<dyn PlayerCapabilityLoader>,
}

/// Reports travelling from a slide up to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideEffect {
    /// Leave this slide for the next one (playback ended or the user skipped).
    RequestAdvance,
    Action(FeedAction),
    Break(BreakAction),
}

/// One entry of the feed.
#[derive(Debug)]
pub enum Slide {
    Video(VideoSlide),
    Break(BreakSlide),
}

impl Slide {
    pub fn id(&self) -> SlideId {
        match self {
            Slide::Video(video) => video.id(),
            Slide::Break(pause) => pause.id(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Slide::Video(video) => video.index(),
            Slide::Break(pause) => pause.index(),
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        match self {
            Slide::Video(video) => video.set_index(index),
            Slide::Break(pause) => pause.set_index(index),
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Slide::Break(_))
    }

    pub fn is_active(&self) -> bool {
        match self {
            Slide::Video(video) => video.is_active(),
            Slide::Break(pause) => pause.is_active(),
        }
    }

    pub fn as_video(&self) -> Option<&VideoSlide> {
        match self {
            Slide::Video(video) => Some(video),
            Slide::Break(_) => None,
        }
    }

    pub fn as_break(&self) -> Option<&BreakSlide> {
        match self {
            Slide::Break(pause) => Some(pause),
            Slide::Video(_) => None,
        }
    }

    pub(crate) fn set_active(&mut self, active: bool, ctx: &SlideContext<'_>) {
        match self {
            Slide::Video(video) => video.set_active(active, ctx),
            Slide::Break(pause) => pause.set_active(active),
        }
    }

    pub(crate) fn destroy(&mut self) {
        match self {
            Slide::Video(video) => video.destroy(),
            Slide::Break(pause) => pause.destroy(),
        }
    }

    pub(crate) fn timer_count(&self) -> usize {
        match self {
            Slide::Video(video) => video.timer_count(),
            Slide::Break(pause) => pause.timer_count(),
        }
    }

    pub fn view(&self) -> SlideView {
        match self {
            Slide::Video(video) => SlideView::Video(video.view()),
            Slide::Break(pause) => SlideView::Break(pause.view()),
        }
    }
}

/// Render-ready projection of a slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SlideView {
    Video(VideoSlideView),
    Break(BreakSlideView),
}
