//! A video entry of the feed and its player lifecycle.
//!
//! The slide owns its [`PlayerAdapter`] and every timer that serves it (initialization,
//! readiness watchdog, progress polling, delayed auto-advance). Timers never touch the
//! slide directly: they post [`FeedEvent`]s which the feed routes back here by slide id.

use serde::Serialize;
use tokio::time::Instant;

use crate::feed::events::{FeedAction, FeedEvent};
use crate::player::adapter::{spawn_initialization, InitOutcome};
use crate::player::{PlaybackErrorKind, PlayerAdapter, PlayerError, PlayerSignal, PlayerState};
use crate::settings::ReentryPolicy;
use crate::utils::tasks::{spawn_after, spawn_every, TaskSlot};

use super::{SlideContext, SlideEffect, SlideId, ThumbnailCandidates, VideoDescriptor};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub position_secs: f64,
    pub duration_secs: f64,
    pub synthetic: bool,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
pub struct VideoSlide {
    id: SlideId,
    index: usize,
    descriptor: VideoDescriptor,
    liked: bool,
    disliked: bool,
    player_state: PlayerState,
    active: bool,
    adapter: Option<PlayerAdapter>,
    progress: Progress,
    /// Set once this activation has asked the feed to move on.
    advance_requested: bool,
    /// Ready reported by the embed before its handle reached us.
    pending_ready: bool,
    last_toggle: Option<Instant>,
    thumbnails: ThumbnailCandidates,
    init_task: TaskSlot,
    ready_watchdog: TaskSlot,
    progress_ticker: TaskSlot,
    advance_timer: TaskSlot,
}

impl VideoSlide {
    pub fn new(index: usize, descriptor: VideoDescriptor) -> Self {
        let thumbnails = ThumbnailCandidates::for_video(&descriptor.video_id);
        Self {
            id: SlideId::new(),
            index,
            descriptor,
            liked: false,
            disliked: false,
            player_state: PlayerState::Uninitialized,
            active: false,
            adapter: None,
            progress: Progress::default(),
            advance_requested: false,
            pending_ready: false,
            last_toggle: None,
            thumbnails,
            init_task: TaskSlot::new(),
            ready_watchdog: TaskSlot::new(),
            progress_ticker: TaskSlot::new(),
            advance_timer: TaskSlot::new(),
        }
    }

    pub fn id(&self) -> SlideId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn descriptor(&self) -> &VideoDescriptor {
        &self.descriptor
    }

    pub fn player_state(&self) -> &PlayerState {
        &self.player_state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn liked(&self) -> bool {
        self.liked
    }

    pub fn disliked(&self) -> bool {
        self.disliked
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn has_player(&self) -> bool {
        self.adapter.is_some()
    }

    /// Like, dislike and share are unavailable while the slide shows its error fallback.
    pub fn controls_enabled(&self) -> bool {
        !self.player_state.is_error()
    }

    /// Start creating the player in the background. No-op unless still uninitialized.
    pub(crate) fn begin_initialization(&mut self, ctx: &SlideContext<'_>) -> bool {
        if self.player_state != PlayerState::Uninitialized {
            return false;
        }
        self.player_state = PlayerState::Initializing;
        self.init_task.replace(spawn_initialization(
            self.id,
            self.descriptor.video_id.clone(),
            ctx.loader.clone(),
            ctx.events.clone(),
            ctx.config.init_timeout(),
        ));
        log_debug!("initializing player for {} (slide {})", self.descriptor.video_id, self.index);
        true
    }

    pub(crate) fn set_active(&mut self, active: bool, ctx: &SlideContext<'_>) {
        if self.active == active {
            return;
        }
        self.active = active;
        if active {
            self.activate(ctx);
        } else {
            self.deactivate();
        }
    }

    fn activate(&mut self, ctx: &SlideContext<'_>) {
        self.advance_requested = false;
        self.advance_timer.abort();
        if ctx.config.reentry_policy == ReentryPolicy::Restart || self.player_state == PlayerState::Ended {
            self.rewind();
        }

        match self.player_state {
            PlayerState::Uninitialized => {
                self.begin_initialization(ctx);
            }
            // Playback starts from the ready signal, or never for a failed slide.
            PlayerState::Initializing | PlayerState::Error(_) => {}
            _ => self.start_playback(ctx),
        }
    }

    fn deactivate(&mut self) {
        self.stop_progress_polling();
        self.advance_timer.abort();
        if self.player_state.is_running() {
            if let Some(adapter) = &self.adapter {
                adapter.pause();
            }
            self.player_state = PlayerState::Paused;
        }
    }

    fn rewind(&mut self) {
        self.progress.position_secs = 0.0;
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.restart();
        }
    }

    fn start_playback(&mut self, ctx: &SlideContext<'_>) {
        let Some(adapter) = &self.adapter else {
            return;
        };
        adapter.play();
        self.player_state = PlayerState::Playing;
        self.start_progress_polling(ctx);
    }

    fn pause_playback(&mut self) {
        if let Some(adapter) = &self.adapter {
            adapter.pause();
        }
        self.player_state = PlayerState::Paused;
        self.stop_progress_polling();
    }

    fn start_progress_polling(&mut self, ctx: &SlideContext<'_>) {
        if self.progress_ticker.is_running() {
            return;
        }
        let slide_id = self.id;
        self.progress_ticker.replace(spawn_every(
            ctx.config.progress_poll(),
            ctx.events.clone(),
            move || FeedEvent::ProgressTick { slide_id },
        ));
    }

    fn stop_progress_polling(&mut self) {
        self.progress_ticker.abort();
    }

    pub(crate) fn on_initialized(&mut self, outcome: InitOutcome, ctx: &SlideContext<'_>) {
        if self.player_state != PlayerState::Initializing || self.adapter.is_some() {
            outcome.discard();
            return;
        }

        match outcome {
            InitOutcome::Embedded(handle) => {
                self.adapter = Some(PlayerAdapter::embedded(handle, ctx.config.fallback_duration()));
                if std::mem::take(&mut self.pending_ready) {
                    self.on_ready(ctx);
                    return;
                }
                let slide_id = self.id;
                self.ready_watchdog.replace(spawn_after(
                    ctx.config.init_timeout(),
                    ctx.events.clone(),
                    FeedEvent::ReadyTimeout { slide_id },
                ));
            }
            InitOutcome::Unavailable => {
                log_info!(
                    "no embeddable player for {}, using synthetic playback",
                    self.descriptor.video_id
                );
                self.adapter = Some(PlayerAdapter::synthetic(ctx.config.fallback_duration()));
                self.on_ready(ctx);
            }
            InitOutcome::Failed(reason) => self.fail(PlayerError::Initialization(reason)),
        }
    }

    fn on_ready(&mut self, ctx: &SlideContext<'_>) {
        self.ready_watchdog.abort();
        self.player_state = PlayerState::Ready;
        if self.active {
            self.rewind();
            self.start_playback(ctx);
        }
    }

    pub(crate) fn on_player_signal(&mut self, signal: PlayerSignal, ctx: &SlideContext<'_>) {
        if self.player_state.is_error() {
            return;
        }
        if self.adapter.is_none() {
            if signal == PlayerSignal::Ready && self.player_state == PlayerState::Initializing {
                self.pending_ready = true;
            }
            return;
        }

        match signal {
            PlayerSignal::Ready => {
                if self.player_state == PlayerState::Initializing {
                    self.on_ready(ctx);
                }
            }
            PlayerSignal::Playing => {
                if !self.player_state.is_playable() {
                    return;
                }
                if self.active {
                    self.player_state = PlayerState::Playing;
                    self.start_progress_polling(ctx);
                } else if let Some(adapter) = &self.adapter {
                    // Only the active slide may produce sound.
                    adapter.pause();
                }
            }
            PlayerSignal::Paused => {
                if self.player_state.is_running() {
                    self.player_state = PlayerState::Paused;
                    self.stop_progress_polling();
                }
            }
            PlayerSignal::Buffering => {
                if self.player_state == PlayerState::Playing {
                    self.player_state = PlayerState::Buffering;
                }
            }
            PlayerSignal::Ended => {
                if self.player_state.is_running() {
                    self.on_ended(ctx);
                }
            }
            PlayerSignal::Error(code) => {
                self.fail(PlayerError::Playback(PlaybackErrorKind::from_code(code)));
            }
        }
    }

    pub(crate) fn on_ready_timeout(&mut self) {
        if self.player_state == PlayerState::Initializing {
            self.fail(PlayerError::Initialization("player never became ready".into()));
        }
    }

    pub(crate) fn on_progress_tick(&mut self, ctx: &SlideContext<'_>) {
        if self.player_state != PlayerState::Playing {
            return;
        }
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };

        let sample = adapter.sample(ctx.config.progress_poll());
        self.progress = Progress {
            position_secs: sample.position_secs,
            duration_secs: sample.duration_secs,
            synthetic: sample.synthetic,
        };
        if sample.finished {
            self.on_ended(ctx);
        }
    }

    fn on_ended(&mut self, ctx: &SlideContext<'_>) {
        self.player_state = PlayerState::Ended;
        self.stop_progress_polling();
        self.progress.position_secs = self.progress.duration_secs;
        if self.active && !self.advance_requested {
            let slide_id = self.id;
            self.advance_timer.replace(spawn_after(
                ctx.config.advance_delay(),
                ctx.events.clone(),
                FeedEvent::AdvanceDue { slide_id },
            ));
        }
    }

    pub(crate) fn on_advance_due(&mut self) -> Option<SlideEffect> {
        if self.active && self.player_state == PlayerState::Ended {
            self.request_advance()
        } else {
            None
        }
    }

    fn request_advance(&mut self) -> Option<SlideEffect> {
        if std::mem::replace(&mut self.advance_requested, true) {
            return None;
        }
        self.advance_timer.abort();
        Some(SlideEffect::RequestAdvance)
    }

    fn fail(&mut self, error: PlayerError) {
        log_warn!("video {} entered fallback: {error}", self.descriptor.video_id);
        self.stop_progress_polling();
        self.ready_watchdog.abort();
        self.advance_timer.abort();
        if let Some(adapter) = &self.adapter {
            adapter.pause();
        }
        self.player_state = PlayerState::Error(error);
    }

    /// Manual play/pause. Repeated presses inside the debounce window are ignored.
    pub(crate) fn toggle_play(&mut self, ctx: &SlideContext<'_>, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        if let Some(last) = self.last_toggle {
            if now.saturating_duration_since(last) < ctx.config.toggle_debounce() {
                return false;
            }
        }

        let handled = match self.player_state {
            PlayerState::Playing | PlayerState::Buffering => {
                self.pause_playback();
                true
            }
            PlayerState::Paused | PlayerState::Ready => {
                self.start_playback(ctx);
                true
            }
            PlayerState::Ended => {
                self.advance_timer.abort();
                self.advance_requested = false;
                self.rewind();
                self.start_playback(ctx);
                true
            }
            PlayerState::Uninitialized | PlayerState::Initializing | PlayerState::Error(_) => false,
        };
        if handled {
            self.last_toggle = Some(now);
        }
        handled
    }

    pub(crate) fn like(&mut self) -> Option<SlideEffect> {
        if !self.controls_enabled() {
            return None;
        }
        self.liked = !self.liked;
        if self.liked {
            self.disliked = false;
        }
        Some(SlideEffect::Action(FeedAction::Like {
            video: self.descriptor.clone(),
            liked: self.liked,
        }))
    }

    pub(crate) fn dislike(&mut self) -> Option<SlideEffect> {
        if !self.controls_enabled() {
            return None;
        }
        self.disliked = !self.disliked;
        if self.disliked {
            self.liked = false;
        }
        Some(SlideEffect::Action(FeedAction::Dislike {
            video: self.descriptor.clone(),
            disliked: self.disliked,
        }))
    }

    pub(crate) fn share(&self) -> Option<SlideEffect> {
        if !self.controls_enabled() {
            return None;
        }
        Some(SlideEffect::Action(FeedAction::Share {
            video: self.descriptor.clone(),
        }))
    }

    /// Always available, including from the error fallback. Pauses local playback since
    /// the user is leaving for the external player.
    pub(crate) fn open_externally(&mut self) -> Option<SlideEffect> {
        if self.player_state.is_running() {
            self.pause_playback();
        }
        Some(SlideEffect::Action(FeedAction::OpenExternally {
            url: self.descriptor.external_url(),
            video: self.descriptor.clone(),
        }))
    }

    pub(crate) fn skip(&mut self) -> Option<SlideEffect> {
        self.request_advance()
    }

    pub(crate) fn thumbnail_failed(&mut self) -> Option<&str> {
        self.thumbnails.try_next()
    }

    /// Clear every timer and release the player. Nothing from this slide fires afterwards.
    pub(crate) fn destroy(&mut self) {
        self.init_task.abort();
        self.ready_watchdog.abort();
        self.progress_ticker.abort();
        self.advance_timer.abort();
        if let Some(mut adapter) = self.adapter.take() {
            adapter.destroy();
        }
        self.active = false;
    }

    pub(crate) fn timer_count(&self) -> usize {
        [
            &self.init_task,
            &self.ready_watchdog,
            &self.progress_ticker,
            &self.advance_timer,
        ]
        .into_iter()
        .filter(|slot| slot.is_running())
        .count()
    }

    pub fn view(&self) -> VideoSlideView {
        let fallback = match &self.player_state {
            PlayerState::Error(error) => Some(FallbackView {
                message: error.message().to_string(),
                thumbnail_url: self.thumbnails.current().map(str::to_string),
                external_url: self.descriptor.external_url(),
            }),
            _ => None,
        };

        VideoSlideView {
            slide_id: self.id,
            index: self.index,
            video: self.descriptor.clone(),
            active: self.active,
            player_state: self.player_state.clone(),
            is_playing: self.player_state.is_running(),
            progress: self.progress.fraction(),
            synthetic_progress: self.progress.synthetic,
            liked: self.liked,
            disliked: self.disliked,
            controls_enabled: self.controls_enabled(),
            fallback,
        }
    }
}

/// Render-ready projection of a video slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSlideView {
    pub slide_id: SlideId,
    pub index: usize,
    pub video: VideoDescriptor,
    pub active: bool,
    pub player_state: PlayerState,
    pub is_playing: bool,
    /// 0.0 ..= 1.0
    pub progress: f64,
    pub synthetic_progress: bool,
    pub liked: bool,
    pub disliked: bool,
    pub controls_enabled: bool,
    pub fallback: Option<FallbackView>,
}

/// What the error fallback shows instead of the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackView {
    pub message: String,
    pub thumbnail_url: Option<String>,
    pub external_url: String,
}
