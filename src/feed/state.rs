//! The feed's single owner of mutable state. Everything here is synchronous; the
//! controller holds it behind one lock and the event loop feeds it timer/player events.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::{
    sync::{mpsc::UnboundedSender, watch},
    time::Instant,
};

use crate::gesture::{
    classify_swipe, resistance_factor, Direction, DragState, GestureInput, InputEvent, Intent, Resistance,
    SwipeOutcome, SwipeThresholds,
};
use crate::player::PlayerCapabilityLoader;
use crate::session::{WatchSession, WatchSessionSnapshot};
use crate::settings::FeedConfig;
use crate::slides::{
    BreakAction, BreakSlide, Slide, SlideContext, SlideEffect, SlideId, SlideView, VideoDescriptor, VideoSlide,
};
use crate::utils::{
    logging,
    tasks::{spawn_after, TaskSlot},
};

use super::animation::{offset_for_index, OffsetMotion, OffsetTween};
use super::events::{FeedAction, FeedEvent, FeedHost, HostEvent, VideoSupply};
use super::preload::Preloader;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// What slides need from the feed; kept apart from the slide list so both can be
/// borrowed at once.
struct FeedEnv {
    config: FeedConfig,
    events: UnboundedSender<FeedEvent>,
    loader: Arc<dyn PlayerCapabilityLoader>,
}

impl FeedEnv {
    fn slide_ctx(&self) -> SlideContext<'_> {
        SlideContext {
            config: &self.config,
            events: &self.events,
            loader: &self.loader,
        }
    }
}

/// Render-ready projection of the whole feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub current_index: usize,
    pub offset: f32,
    pub animating: bool,
    pub dragging: bool,
    pub loading_batch: bool,
    pub session: WatchSessionSnapshot,
    pub slides: Vec<SlideView>,
}

pub(crate) struct FeedState {
    env: FeedEnv,
    supply: Arc<dyn VideoSupply>,
    host: Arc<dyn FeedHost>,
    slides: Vec<Slide>,
    current: usize,
    started: bool,
    destroyed: bool,
    gestures: GestureInput,
    drag: Option<DragState>,
    motion: OffsetMotion,
    transition_generation: u64,
    transition_timer: TaskSlot,
    transitions: watch::Sender<bool>,
    session: WatchSession,
    preloader: Preloader,
    loading_batch: bool,
    batch_task: TaskSlot,
    /// Auto-advance hit the tail; move on once the pending batch lands.
    advance_after_load: bool,
    /// Auto-advance arrived mid-animation; move on once it finishes.
    advance_after_transition: bool,
    /// Started without any slides; activate the first one once a batch lands.
    activate_after_load: bool,
    inserting_break: bool,
    break_check_timer: TaskSlot,
}

impl FeedState {
    pub(crate) fn new(
        config: FeedConfig,
        initial: Vec<VideoDescriptor>,
        events: UnboundedSender<FeedEvent>,
        loader: Arc<dyn PlayerCapabilityLoader>,
        supply: Arc<dyn VideoSupply>,
        host: Arc<dyn FeedHost>,
        transitions: watch::Sender<bool>,
    ) -> Self {
        let slides = initial
            .into_iter()
            .enumerate()
            .map(|(index, video)| Slide::Video(VideoSlide::new(index, video)))
            .collect();

        Self {
            gestures: GestureInput::new(config.wheel_threshold),
            session: WatchSession::new(&config.break_intervals_minutes),
            preloader: Preloader::new(config.preload_window),
            env: FeedEnv { config, events, loader },
            supply,
            host,
            slides,
            current: 0,
            started: false,
            destroyed: false,
            drag: None,
            motion: OffsetMotion::default(),
            transition_generation: 0,
            transition_timer: TaskSlot::new(),
            transitions,
            loading_batch: false,
            batch_task: TaskSlot::new(),
            advance_after_load: false,
            advance_after_transition: false,
            activate_after_load: false,
            inserting_break: false,
            break_check_timer: TaskSlot::new(),
        }
    }

    pub(crate) fn config(&self) -> &FeedConfig {
        &self.env.config
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn current_index(&self) -> usize {
        self.current
    }

    pub(crate) fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub(crate) fn session(&self) -> &WatchSession {
        &self.session
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.motion.is_animating()
    }

    pub(crate) fn is_loading_batch(&self) -> bool {
        self.loading_batch
    }

    pub(crate) fn is_inserting_break(&self) -> bool {
        self.inserting_break
    }

    fn current_is_break(&self) -> bool {
        self.slides.get(self.current).is_some_and(Slide::is_break)
    }

    fn is_current(&self, slide_id: SlideId) -> bool {
        self.slides
            .get(self.current)
            .is_some_and(|slide| slide.id() == slide_id)
    }

    /// Descriptor of the current video, or of the last video before the current break.
    fn nearest_video(&self) -> Option<VideoDescriptor> {
        self.slides
            .get(..=self.current)?
            .iter()
            .rev()
            .find_map(|slide| slide.as_video())
            .map(|video| video.descriptor().clone())
    }

    pub(crate) fn start(&mut self) -> Result<()> {
        if self.destroyed {
            anyhow::bail!("feed has been destroyed");
        }
        if std::mem::replace(&mut self.started, true) {
            return Ok(());
        }

        let tracker = self.session.tracker_mut();
        tracker.reset();
        tracker.start_heartbeat(self.env.config.heartbeat(), self.env.events.clone());
        log_info!("feed started with {} slides", self.slides.len());

        if self.slides.is_empty() {
            self.activate_after_load = true;
            self.request_batch();
        } else {
            self.activate_current();
        }
        Ok(())
    }

    fn activate_current(&mut self) {
        let ctx = self.env.slide_ctx();
        let Some(slide) = self.slides.get_mut(self.current) else {
            return;
        };
        slide.set_active(true, &ctx);
        self.motion = OffsetMotion::Resting {
            offset: offset_for_index(self.current, self.env.config.viewport_height),
        };
        self.announce_current();
        self.after_move();
    }

    fn announce_current(&self) {
        if let Some(slide) = self.slides.get(self.current) {
            self.host.emit(HostEvent::SlideChanged {
                index: self.current,
                slide_id: slide.id(),
            });
        }
    }

    /// Navigate to `target`. Returns false (and changes nothing) when the target is out of
    /// range, already current, or an animation is in flight.
    pub(crate) fn move_to_index(&mut self, target: usize, animated: bool, now: Instant) -> bool {
        if !self.started || self.destroyed {
            return false;
        }
        if target >= self.slides.len() || target == self.current || self.motion.is_animating() {
            return false;
        }

        let from_offset = self.motion.offset_at(now);
        let ctx = self.env.slide_ctx();
        // The old slide goes quiet before the new one may start.
        if let Some(previous) = self.slides.get_mut(self.current) {
            previous.set_active(false, &ctx);
        }
        self.current = target;
        self.slides[target].set_active(true, &ctx);
        self.drag = None;

        let to_offset = offset_for_index(target, self.env.config.viewport_height);
        if animated {
            self.start_transition(from_offset, to_offset, now);
        } else {
            self.motion = OffsetMotion::Resting { offset: to_offset };
        }

        log_debug!("moved to slide {target}");
        self.announce_current();
        self.after_move();
        true
    }

    fn after_move(&mut self) {
        self.preload();
        self.check_infinite_scroll();
        if !self.current_is_break() && !self.inserting_break {
            self.break_check_timer.replace(spawn_after(
                self.env.config.settle_delay(),
                self.env.events.clone(),
                FeedEvent::BreakCheckDue,
            ));
        }
    }

    fn start_transition(&mut self, from: f32, to: f32, now: Instant) {
        self.transition_generation += 1;
        let duration = self.env.config.animation();
        self.motion = OffsetMotion::Animating(OffsetTween::new(from, to, now, duration));
        self.transitions.send_replace(true);
        self.transition_timer.replace(spawn_after(
            duration,
            self.env.events.clone(),
            FeedEvent::TransitionFinished {
                generation: self.transition_generation,
            },
        ));
    }

    fn finish_transition(&mut self, generation: u64, now: Instant) {
        if generation != self.transition_generation {
            return;
        }
        if let OffsetMotion::Animating(tween) = self.motion {
            self.motion = OffsetMotion::Resting {
                offset: tween.target(),
            };
        }
        self.transition_timer.abort();
        self.transitions.send_replace(false);
        if std::mem::take(&mut self.advance_after_transition) {
            self.handle_auto_advance(now);
        }
    }

    fn preload(&mut self) {
        let ctx = self.env.slide_ctx();
        for index in self.preloader.targets(self.current, self.slides.len()) {
            if let Slide::Video(video) = &mut self.slides[index] {
                video.begin_initialization(&ctx);
            }
        }
    }

    /// Move to the next slide. Returns true when the feed moved, or will once the
    /// running animation or the pending batch settles.
    pub(crate) fn handle_auto_advance(&mut self, now: Instant) -> bool {
        if !self.started || self.destroyed {
            return false;
        }
        let next = self.current + 1;
        if next >= self.slides.len() {
            // At the tail: grow first, move once the batch arrives.
            self.advance_after_load = true;
            self.request_batch();
            return true;
        }
        if self.motion.is_animating() {
            self.advance_after_transition = true;
            return true;
        }
        self.move_to_index(next, true, now)
    }

    /// Request more videos when few remain after the current one. Returns whether a new
    /// request was issued.
    pub(crate) fn check_infinite_scroll(&mut self) -> bool {
        let remaining = self.slides.len().saturating_sub(self.current + 1);
        if remaining > self.env.config.load_threshold {
            return false;
        }
        self.request_batch()
    }

    fn request_batch(&mut self) -> bool {
        if self.loading_batch || self.destroyed {
            return false;
        }
        self.loading_batch = true;

        let supply = self.supply.clone();
        let events = self.env.events.clone();
        let count = self.env.config.batch_size;
        log_debug!("requesting {count} more videos");
        self.batch_task.replace(tokio::spawn(async move {
            let result = supply
                .generate_next_batch(count)
                .await
                .context("video supply failed to produce a batch");
            let _ = events.send(FeedEvent::BatchLoaded(result));
        }));
        true
    }

    fn on_batch_loaded(&mut self, result: Result<Vec<VideoDescriptor>>, now: Instant) {
        self.loading_batch = false;
        match result {
            Ok(videos) if videos.is_empty() => log_info!("video supply returned an empty batch"),
            Ok(videos) => {
                let added = videos.len();
                for video in videos {
                    let index = self.slides.len();
                    self.slides.push(Slide::Video(VideoSlide::new(index, video)));
                }
                log_debug!("appended {added} slides, feed now holds {}", self.slides.len());
            }
            Err(err) => log_warn!("{err:#}"),
        }

        if self.activate_after_load {
            if !self.slides.is_empty() {
                self.activate_after_load = false;
                self.activate_current();
            }
            return;
        }
        let next = self.current + 1;
        if std::mem::take(&mut self.advance_after_load) && next < self.slides.len() && self.handle_auto_advance(now) {
            return;
        }
        self.preload();
    }

    /// Splice a break after the current slide if one is due. Returns the break's index.
    pub(crate) fn check_for_break_slide(&mut self) -> Option<usize> {
        if !self.started || self.destroyed || self.slides.is_empty() {
            return None;
        }
        if self.inserting_break || self.current_is_break() {
            return None;
        }

        let due = self.session.due_break()?;
        if !self.session.consume(&due) {
            return None;
        }

        self.inserting_break = true;
        let index = self.current + 1;
        self.slides.insert(
            index,
            Slide::Break(BreakSlide::new(index, due.interval_minutes, due.watch_time_minutes)),
        );
        self.renumber();
        log_info!(
            "inserted break for the {} minute mark at slide {index}",
            due.interval_minutes
        );
        self.host.emit(HostEvent::BreakInserted {
            index,
            interval_minutes: due.interval_minutes,
        });
        // The guard stays up until the event loop has taken another turn.
        let _ = self.env.events.send(FeedEvent::BreakInsertionSettled);
        Some(index)
    }

    fn renumber(&mut self) {
        for (index, slide) in self.slides.iter_mut().enumerate() {
            slide.set_index(index);
        }
    }

    /// Apply a break action to the current break slide.
    pub(crate) fn handle_break_action(&mut self, action: BreakAction, now: Instant) -> bool {
        if !self.started || self.destroyed {
            return false;
        }
        let ctx = self.env.slide_ctx();
        let Some(Slide::Break(pause)) = self.slides.get_mut(self.current) else {
            return false;
        };
        let effect = match action {
            BreakAction::Rest => pause.rest(&ctx),
            BreakAction::Continue => pause.continue_watching(),
            BreakAction::RestSkip => pause.skip_rest(),
            BreakAction::RestComplete => pause.complete_rest(),
        };
        let slide_id = pause.id();
        self.apply_effect(slide_id, effect, now)
    }

    fn on_break_action(&mut self, slide_id: SlideId, action: BreakAction, now: Instant) {
        let video = self.nearest_video();
        if action.leaves_break() {
            if self.handle_auto_advance(now) {
                self.host.emit(HostEvent::Action(FeedAction::BreakDismissed { video, action }));
            }
            return;
        }

        let watch_time_minutes = self
            .slides
            .iter()
            .find(|slide| slide.id() == slide_id)
            .and_then(Slide::as_break)
            .map(BreakSlide::watch_time_minutes_at_insertion)
            .unwrap_or_default();
        self.host.emit(HostEvent::Action(FeedAction::BreakStarted {
            video,
            watch_time_minutes,
        }));
    }

    fn apply_effect(&mut self, slide_id: SlideId, effect: Option<SlideEffect>, now: Instant) -> bool {
        let Some(effect) = effect else {
            return false;
        };
        match effect {
            SlideEffect::RequestAdvance => {
                if self.is_current(slide_id) {
                    self.handle_auto_advance(now);
                }
            }
            SlideEffect::Action(action) => self.host.emit(HostEvent::Action(action)),
            SlideEffect::Break(action) => {
                // Countdowns of breaks the user already left are ignored.
                if !self.is_current(slide_id) {
                    return false;
                }
                self.on_break_action(slide_id, action, now);
            }
        }
        true
    }

    pub(crate) fn handle_input(&mut self, event: InputEvent, now: Instant) -> bool {
        if !self.started || self.destroyed {
            return false;
        }
        match self.gestures.translate(event) {
            Some(intent) => self.dispatch(intent, now),
            None => false,
        }
    }

    pub(crate) fn dispatch(&mut self, intent: Intent, now: Instant) -> bool {
        if !self.started || self.destroyed {
            return false;
        }
        match intent {
            Intent::DragStart { y } => self.drag_start(y, now),
            Intent::DragMove { y } => self.drag_move(y, now),
            Intent::DragEnd => self.drag_end(now),
            Intent::DragCancel => self.drag_cancel(now),
            Intent::Step(direction) => self.step(direction, now),
            Intent::TogglePlay => {
                let ctx = self.env.slide_ctx();
                match self.slides.get_mut(self.current) {
                    Some(Slide::Video(video)) => video.toggle_play(&ctx, now),
                    _ => false,
                }
            }
            Intent::Like => self.with_current_video(now, VideoSlide::like),
            Intent::Dislike => self.with_current_video(now, VideoSlide::dislike),
            Intent::Share => self.with_current_video(now, |video| video.share()),
            Intent::OpenExternally => self.with_current_video(now, VideoSlide::open_externally),
            Intent::Skip => self.with_current_video(now, VideoSlide::skip),
            Intent::ThumbnailFailed => match self.slides.get_mut(self.current) {
                Some(Slide::Video(video)) => video.thumbnail_failed().is_some(),
                _ => false,
            },
            Intent::BreakRest => self.handle_break_action(BreakAction::Rest, now),
            Intent::BreakContinue => self.handle_break_action(BreakAction::Continue, now),
            Intent::BreakSkipRest => self.handle_break_action(BreakAction::RestSkip, now),
        }
    }

    fn with_current_video<F>(&mut self, now: Instant, action: F) -> bool
    where
        F: FnOnce(&mut VideoSlide) -> Option<SlideEffect>,
    {
        let Some(Slide::Video(video)) = self.slides.get_mut(self.current) else {
            return false;
        };
        let slide_id = video.id();
        let effect = action(video);
        self.apply_effect(slide_id, effect, now)
    }

    fn drag_start(&mut self, y: f32, now: Instant) -> bool {
        if self.motion.is_animating() || self.slides.is_empty() {
            return false;
        }
        self.drag = Some(DragState::begin(y, now));
        self.motion = OffsetMotion::Dragging {
            base: offset_for_index(self.current, self.env.config.viewport_height),
            delta: 0.0,
        };
        true
    }

    fn drag_move(&mut self, y: f32, now: Instant) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        drag.update(y, now);
        let distance = drag.distance();
        let resistance = Resistance {
            min: self.env.config.min_resistance,
            falloff: self.env.config.resistance_falloff,
        };
        let factor = resistance_factor(
            distance,
            self.current == 0,
            self.current + 1 >= self.slides.len(),
            &resistance,
        );
        self.motion = OffsetMotion::Dragging {
            base: offset_for_index(self.current, self.env.config.viewport_height),
            delta: distance * factor,
        };
        true
    }

    fn drag_end(&mut self, now: Instant) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let thresholds = SwipeThresholds {
            distance: self.env.config.swipe_distance_threshold,
            velocity: self.env.config.swipe_velocity_threshold,
            duration_cap: self.env.config.swipe_duration_cap(),
        };
        let outcome = classify_swipe(drag.distance(), drag.velocity, drag.duration(now), &thresholds);
        log_debug!(
            "drag released after {:.0}px at {:.2}px/ms: {outcome:?}",
            drag.distance(),
            drag.velocity
        );

        if let SwipeOutcome::Navigate(direction) = outcome {
            if let Some(target) = direction.step(self.current, self.slides.len()) {
                if self.move_to_index(target, true, now) {
                    return true;
                }
            }
        }
        self.snap_back(now);
        true
    }

    fn drag_cancel(&mut self, now: Instant) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        self.snap_back(now);
        true
    }

    fn snap_back(&mut self, now: Instant) {
        let from = self.motion.offset_at(now);
        let to = offset_for_index(self.current, self.env.config.viewport_height);
        if from == to {
            self.motion = OffsetMotion::Resting { offset: to };
        } else {
            self.start_transition(from, to, now);
        }
    }

    /// One-slide move from wheel or keyboard; ignored mid-drag or mid-animation.
    fn step(&mut self, direction: Direction, now: Instant) -> bool {
        if self.drag.is_some() || self.motion.is_animating() {
            return false;
        }
        match direction.step(self.current, self.slides.len()) {
            Some(target) => self.move_to_index(target, true, now),
            None => false,
        }
    }

    pub(crate) fn handle_event(&mut self, event: FeedEvent, now: Instant) {
        if self.destroyed {
            if let FeedEvent::Initialized { outcome, .. } = event {
                outcome.discard();
            }
            return;
        }

        let ctx = self.env.slide_ctx();
        match event {
            FeedEvent::Initialized { slide_id, outcome } => match find_video(&mut self.slides, slide_id) {
                Some(video) => video.on_initialized(outcome, &ctx),
                None => outcome.discard(),
            },
            FeedEvent::Player { slide_id, signal } => {
                if let Some(video) = find_video(&mut self.slides, slide_id) {
                    video.on_player_signal(signal, &ctx);
                }
            }
            FeedEvent::ReadyTimeout { slide_id } => {
                if let Some(video) = find_video(&mut self.slides, slide_id) {
                    video.on_ready_timeout();
                }
            }
            FeedEvent::ProgressTick { slide_id } => {
                if let Some(video) = find_video(&mut self.slides, slide_id) {
                    video.on_progress_tick(&ctx);
                }
            }
            FeedEvent::AdvanceDue { slide_id } => {
                let effect = find_video(&mut self.slides, slide_id).and_then(VideoSlide::on_advance_due);
                self.apply_effect(slide_id, effect, now);
            }
            FeedEvent::RestTick { slide_id } => {
                let effect = find_break(&mut self.slides, slide_id).and_then(BreakSlide::on_rest_tick);
                self.apply_effect(slide_id, effect, now);
            }
            FeedEvent::TransitionFinished { generation } => self.finish_transition(generation, now),
            FeedEvent::BreakCheckDue => {
                self.check_for_break_slide();
            }
            FeedEvent::BreakInsertionSettled => self.inserting_break = false,
            FeedEvent::BatchLoaded(result) => self.on_batch_loaded(result, now),
            FeedEvent::Heartbeat => self.on_heartbeat(),
        }
    }

    fn on_heartbeat(&mut self) {
        let beats = self.session.tracker_mut().record_heartbeat();
        let total_minutes = self.session.total_watch_time_minutes();
        if logging::debug_mode() {
            log_debug!("heartbeat {beats}: {total_minutes:.3} minutes watched");
        }
        self.host.emit(HostEvent::WatchTimeUpdated { total_minutes });

        let every = u64::from(self.env.config.break_check_every_heartbeats.max(1));
        if beats % every == 0 {
            self.check_for_break_slide();
        }
    }

    /// Tear everything down. Returns false when already destroyed.
    pub(crate) fn destroy(&mut self) -> bool {
        if std::mem::replace(&mut self.destroyed, true) {
            return false;
        }
        // Torn-down slides stay listed so their timers remain countable.
        for slide in &mut self.slides {
            slide.destroy();
        }
        let lingering: usize = self.slides.iter().map(Slide::timer_count).sum();
        if lingering > 0 {
            log_warn!("{lingering} slide timers survived teardown");
        }
        self.transition_timer.abort();
        self.break_check_timer.abort();
        self.batch_task.abort();
        self.session.tracker_mut().stop_heartbeat();
        self.drag = None;
        self.motion = OffsetMotion::default();
        self.loading_batch = false;
        self.advance_after_load = false;
        self.advance_after_transition = false;
        self.transitions.send_replace(false);
        log_info!("feed destroyed, released {} slides", self.slides.len());
        true
    }

    /// Live background tasks owned by the feed and its slides.
    pub(crate) fn active_timer_count(&self) -> usize {
        let own = [
            &self.transition_timer,
            &self.break_check_timer,
            &self.batch_task,
        ]
        .into_iter()
        .filter(|slot| slot.is_running())
        .count();
        let heartbeat = usize::from(self.session.tracker().heartbeat_running());
        own + heartbeat + self.slides.iter().map(Slide::timer_count).sum::<usize>()
    }

    pub(crate) fn active_slide_count(&self) -> usize {
        self.slides.iter().filter(|slide| slide.is_active()).count()
    }

    pub(crate) fn snapshot(&self, now: Instant) -> FeedSnapshot {
        FeedSnapshot {
            current_index: self.current,
            offset: self.motion.offset_at(now),
            animating: self.motion.is_animating(),
            dragging: self.drag.is_some(),
            loading_batch: self.loading_batch,
            session: self.session.snapshot(),
            slides: self.slides.iter().map(Slide::view).collect(),
        }
    }
}

fn find_video(slides: &mut [Slide], slide_id: SlideId) -> Option<&mut VideoSlide> {
    slides.iter_mut().find_map(|slide| match slide {
        Slide::Video(video) if video.id() == slide_id => Some(video),
        _ => None,
    })
}

fn find_break(slides: &mut [Slide], slide_id: SlideId) -> Option<&mut BreakSlide> {
    slides.iter_mut().find_map(|slide| match slide {
        Slide::Break(pause) if pause.id() == slide_id => Some(pause),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use crate::feed::events::EmptySupply;
    use crate::player::{NoPlayerCapability, PlayerState};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<HostEvent>>);

    impl FeedHost for Recorder {
        fn emit(&self, event: HostEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn videos(count: usize) -> Vec<VideoDescriptor> {
        (0..count)
            .map(|i| VideoDescriptor::new(format!("vid{i}"), format!("Video {i}"), "@creator"))
            .collect()
    }

    fn feed(config: FeedConfig, count: usize) -> (FeedState, UnboundedReceiver<FeedEvent>, Arc<Recorder>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (transitions, _) = watch::channel(false);
        let host = Arc::new(Recorder::default());
        let state = FeedState::new(
            config,
            videos(count),
            tx,
            Arc::new(NoPlayerCapability),
            Arc::new(EmptySupply),
            host.clone(),
            transitions,
        );
        (state, rx, host)
    }

    #[tokio::test(start_paused = true)]
    async fn move_keeps_exactly_one_slide_active() {
        let (mut state, _rx, host) = feed(FeedConfig::default(), 6);
        state.start().unwrap();
        assert_eq!(state.active_slide_count(), 1);

        let now = Instant::now();
        assert!(state.move_to_index(2, false, now));
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.active_slide_count(), 1);
        assert!(state.slides()[2].is_active());

        assert!(!state.move_to_index(6, false, now));
        assert!(!state.move_to_index(2, false, now));
        assert_eq!(state.current_index(), 2);

        let changes = host
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, HostEvent::SlideChanged { .. }))
            .count();
        assert_eq!(changes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn animated_move_blocks_further_moves_until_finished() {
        let (mut state, mut rx, _host) = feed(FeedConfig::default(), 6);
        state.start().unwrap();

        assert!(state.move_to_index(1, true, Instant::now()));
        assert!(state.is_animating());
        assert!(!state.move_to_index(2, true, Instant::now()));

        loop {
            let event = rx.recv().await.expect("feed events");
            let finished = matches!(event, FeedEvent::TransitionFinished { .. });
            state.handle_event(event, Instant::now());
            if finished {
                break;
            }
        }
        assert!(!state.is_animating());
        assert!(state.move_to_index(2, true, Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn preloads_neighbours_without_activating_them() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 6);
        state.start().unwrap();

        let initializing: Vec<_> = state
            .slides()
            .iter()
            .filter_map(Slide::as_video)
            .map(|video| video.player_state().clone())
            .collect();
        assert_eq!(initializing[1], PlayerState::Initializing);
        assert_eq!(initializing[2], PlayerState::Initializing);
        assert_eq!(initializing[3], PlayerState::Uninitialized);
        assert_eq!(state.active_slide_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn break_is_spliced_after_current_and_guarded() {
        let config = FeedConfig {
            break_intervals_minutes: vec![0.5],
            ..FeedConfig::default()
        };
        let (mut state, mut rx, host) = feed(config, 3);
        state.start().unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(state.check_for_break_slide(), Some(1));
        assert!(state.is_inserting_break());
        assert!(state.slides()[1].is_break());
        assert_eq!(state.slides().len(), 4);
        assert!(state
            .slides()
            .iter()
            .enumerate()
            .all(|(index, slide)| slide.index() == index));
        assert_eq!(state.check_for_break_slide(), None);

        while let Ok(event) = rx.try_recv() {
            state.handle_event(event, Instant::now());
        }
        assert!(!state.is_inserting_break());
        assert_eq!(state.check_for_break_slide(), None);

        let inserted = host
            .0
            .lock()
            .unwrap()
            .iter()
            .any(|event| matches!(event, HostEvent::BreakInserted { index: 1, .. }));
        assert!(inserted);
    }

    #[tokio::test(start_paused = true)]
    async fn short_slow_drag_snaps_back() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 4);
        state.start().unwrap();
        let start = Instant::now();

        assert!(state.dispatch(Intent::DragStart { y: 400.0 }, start));
        state.dispatch(Intent::DragMove { y: 380.0 }, start + Duration::from_millis(200));
        state.dispatch(Intent::DragEnd, start + Duration::from_millis(400));
        assert_eq!(state.current_index(), 0);
        assert!(state.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn long_drag_navigates_to_the_next_slide() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 4);
        state.start().unwrap();
        let start = Instant::now();

        state.dispatch(Intent::DragStart { y: 400.0 }, start);
        state.dispatch(Intent::DragMove { y: 350.0 }, start + Duration::from_millis(300));
        state.dispatch(Intent::DragMove { y: 280.0 }, start + Duration::from_millis(600));
        assert!(state.dispatch(Intent::DragEnd, start + Duration::from_millis(700)));
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.active_slide_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_flick_navigates_only_within_the_duration_cap() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 4);
        state.start().unwrap();
        let start = Instant::now();

        state.dispatch(Intent::DragStart { y: 400.0 }, start);
        state.dispatch(Intent::DragMove { y: 380.0 }, start + Duration::from_millis(40));
        state.dispatch(Intent::DragEnd, start + Duration::from_millis(100));
        assert_eq!(state.current_index(), 1);

        let (mut state, _rx, _host) = feed(FeedConfig::default(), 4);
        state.start().unwrap();
        state.dispatch(Intent::DragStart { y: 400.0 }, start);
        state.dispatch(Intent::DragMove { y: 380.0 }, start + Duration::from_millis(40));
        state.dispatch(Intent::DragEnd, start + Duration::from_millis(400));
        assert_eq!(state.current_index(), 0);
        assert!(state.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn swipe_past_the_last_slide_snaps_back() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 3);
        state.start().unwrap();
        let start = Instant::now();
        assert!(state.move_to_index(2, false, start));

        state.dispatch(Intent::DragStart { y: 400.0 }, start);
        state.dispatch(Intent::DragMove { y: 100.0 }, start + Duration::from_millis(50));
        assert!(state.dispatch(Intent::DragEnd, start + Duration::from_millis(100)));
        assert_eq!(state.current_index(), 2);
        assert!(state.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn resistance_damps_drags_past_the_first_slide() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 4);
        state.start().unwrap();
        let start = Instant::now();

        state.dispatch(Intent::DragStart { y: 100.0 }, start);
        state.dispatch(Intent::DragMove { y: 300.0 }, start + Duration::from_millis(50));
        let snapshot = state.snapshot(start + Duration::from_millis(50));
        assert!(snapshot.dragging);
        assert!(snapshot.offset > 0.0 && snapshot.offset < 200.0);
    }

    #[tokio::test(start_paused = true)]
    async fn resistance_damps_forward_drags_past_the_last_slide() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 3);
        state.start().unwrap();
        let start = Instant::now();

        assert!(state.move_to_index(1, false, start));
        state.dispatch(Intent::DragStart { y: 400.0 }, start);
        state.dispatch(Intent::DragMove { y: 200.0 }, start + Duration::from_millis(50));
        // Away from the edges the drag is followed one to one.
        assert_eq!(state.snapshot(start).offset, -1000.0);

        let (mut state, _rx, _host) = feed(FeedConfig::default(), 3);
        state.start().unwrap();
        assert!(state.move_to_index(2, false, start));
        state.dispatch(Intent::DragStart { y: 400.0 }, start);
        state.dispatch(Intent::DragMove { y: 200.0 }, start + Duration::from_millis(50));
        let offset = state.snapshot(start).offset;
        assert!(offset < -1600.0 && offset > -1800.0, "offset {offset}");
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_releases_everything() {
        let (mut state, _rx, _host) = feed(FeedConfig::default(), 5);
        state.start().unwrap();
        let slide_timers: usize = state.slides().iter().map(Slide::timer_count).sum();
        assert!(slide_timers > 0);

        assert!(state.destroy());
        assert!(!state.destroy());
        assert_eq!(state.slides().len(), 5);
        assert!(state.slides().iter().all(|slide| slide.timer_count() == 0));
        assert_eq!(state.active_timer_count(), 0);
        assert_eq!(state.active_slide_count(), 0);
        assert!(!state.move_to_index(1, false, Instant::now()));
        assert!(!state.handle_break_action(BreakAction::Continue, Instant::now()));
        assert!(state.start().is_err());
    }

    fn quiet() -> FeedConfig {
        FeedConfig {
            fallback_duration_ms: 600_000,
            ..FeedConfig::default()
        }
    }

    fn player_state(state: &FeedState, index: usize) -> Option<PlayerState> {
        state.slides()[index]
            .as_video()
            .map(|video| video.player_state().clone())
    }

    /// Apply queued feed events until `done` holds, letting paused time run forward.
    async fn run_until(
        state: &mut FeedState,
        rx: &mut UnboundedReceiver<FeedEvent>,
        done: impl Fn(&FeedState) -> bool,
    ) {
        let settle = async {
            while !done(state) {
                let event = rx.recv().await.expect("feed events");
                state.handle_event(event, Instant::now());
            }
        };
        tokio::time::timeout(Duration::from_secs(10), settle)
            .await
            .expect("feed settles");
    }

    #[tokio::test(start_paused = true)]
    async fn skip_during_slide_in_advances_once_it_lands() {
        let (mut state, mut rx, _host) = feed(quiet(), 5);
        state.start().unwrap();

        assert!(state.dispatch(Intent::Step(Direction::Next), Instant::now()));
        assert!(state.is_animating());
        assert!(state.dispatch(Intent::Skip, Instant::now()));
        assert_eq!(state.current_index(), 1);

        run_until(&mut state, &mut rx, |state| {
            state.current_index() == 2 && !state.is_animating()
        })
        .await;
        assert_eq!(state.active_slide_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn video_ending_during_snap_back_still_advances() {
        let config = FeedConfig {
            fallback_duration_ms: 1_000,
            advance_delay_ms: 200,
            animation_ms: 1_000,
            ..FeedConfig::default()
        };
        let (mut state, mut rx, _host) = feed(config, 4);
        state.start().unwrap();
        run_until(&mut state, &mut rx, |state| {
            player_state(state, 0) == Some(PlayerState::Ended)
        })
        .await;

        // A short drag released right away snaps back across the advance delay.
        let now = Instant::now();
        state.dispatch(Intent::DragStart { y: 400.0 }, now);
        state.dispatch(Intent::DragMove { y: 390.0 }, now);
        state.dispatch(Intent::DragEnd, now);
        assert!(state.is_animating());
        assert_eq!(state.current_index(), 0);

        run_until(&mut state, &mut rx, |state| {
            state.current_index() == 1 && !state.is_animating()
        })
        .await;
        assert_eq!(state.active_slide_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn continue_during_slide_in_leaves_the_break() {
        let config = FeedConfig {
            break_intervals_minutes: vec![0.5],
            ..quiet()
        };
        let (mut state, mut rx, host) = feed(config, 4);
        state.start().unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(state.check_for_break_slide(), Some(1));

        assert!(state.dispatch(Intent::Step(Direction::Next), Instant::now()));
        assert!(state.is_animating());
        assert!(state.dispatch(Intent::BreakContinue, Instant::now()));
        assert_eq!(state.current_index(), 1);

        run_until(&mut state, &mut rx, |state| {
            state.current_index() == 2 && !state.is_animating()
        })
        .await;
        let dismissed = host
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, HostEvent::Action(FeedAction::BreakDismissed { .. })))
            .count();
        assert_eq!(dismissed, 1);
    }
}
