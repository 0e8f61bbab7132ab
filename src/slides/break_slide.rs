use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::feed::events::FeedEvent;
use crate::utils::tasks::{spawn_every, TaskSlot};

use super::{SlideContext, SlideEffect, SlideId};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Urgency of the rest prompt, escalating with accumulated watch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakTier {
    Gentle,
    Moderate,
    Strong,
    Urgent,
}

impl BreakTier {
    pub fn for_minutes(minutes: u32) -> Self {
        match minutes {
            0..=29 => BreakTier::Gentle,
            30..=59 => BreakTier::Moderate,
            60..=119 => BreakTier::Strong,
            _ => BreakTier::Urgent,
        }
    }

    fn copy(self) -> &'static [(&'static str, &'static str)] {
        match self {
            BreakTier::Gentle => &[
                ("Quick stretch?", "You've been scrolling for a bit. A short pause keeps it fun."),
                ("Blink break", "Look at something far away for a minute, your eyes will thank you."),
            ],
            BreakTier::Moderate => &[
                ("Half an hour in", "Stand up, grab some water and come back refreshed."),
                ("Time for a breather", "A minute away from the screen resets your focus."),
            ],
            BreakTier::Strong => &[
                ("An hour of videos", "That's a long stretch. Step away for a moment."),
                ("Your feed will wait", "Take a real break. Nothing here is going anywhere."),
            ],
            BreakTier::Urgent => &[
                ("Two hours and counting", "Seriously, it's time to rest. Put the phone down for a while."),
                ("Long session alert", "You've been watching for hours. Go do something offline."),
            ],
        }
    }
}

/// What the user (or the countdown) decided on a break slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakAction {
    Rest,
    Continue,
    RestComplete,
    RestSkip,
}

impl BreakAction {
    /// Every action except `Rest` moves the feed past the break.
    pub fn leaves_break(self) -> bool {
        !matches!(self, BreakAction::Rest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakPhase {
    Prompt,
    Resting { remaining: Duration },
    Finished,
}

/// Rest interstitial spliced into the feed. Holds no player.
#[derive(Debug)]
pub struct BreakSlide {
    id: SlideId,
    index: usize,
    interval_minutes: f64,
    watch_time_minutes_at_insertion: u32,
    tier: BreakTier,
    title: &'static str,
    message: &'static str,
    phase: BreakPhase,
    active: bool,
    countdown: TaskSlot,
}

impl BreakSlide {
    /// `interval_minutes` is the consumed schedule entry, `watch_time_minutes` the
    /// session total at insertion. The slide is tagged with the floor of the latter.
    pub fn new(index: usize, interval_minutes: f64, watch_time_minutes: f64) -> Self {
        let minutes = watch_time_minutes.max(0.0).floor() as u32;
        let tier = BreakTier::for_minutes(minutes);
        let variants = tier.copy();
        let (title, message) = variants[rand::thread_rng().gen_range(0..variants.len())];

        Self {
            id: SlideId::new(),
            index,
            interval_minutes,
            watch_time_minutes_at_insertion: minutes,
            tier,
            title,
            message,
            phase: BreakPhase::Prompt,
            active: false,
            countdown: TaskSlot::new(),
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

    pub fn watch_time_minutes_at_insertion(&self) -> u32 {
        self.watch_time_minutes_at_insertion
    }

    pub fn interval_minutes(&self) -> f64 {
        self.interval_minutes
    }

    pub fn tier(&self) -> BreakTier {
        self.tier
    }

    pub fn phase(&self) -> BreakPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Only records the flag; a break has no playback to start or stop.
    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn rest(&mut self, ctx: &SlideContext<'_>) -> Option<SlideEffect> {
        if self.phase != BreakPhase::Prompt {
            return None;
        }
        self.phase = BreakPhase::Resting {
            remaining: ctx.config.rest_duration(),
        };
        let slide_id = self.id;
        self.countdown.replace(spawn_every(COUNTDOWN_TICK, ctx.events.clone(), move || {
            FeedEvent::RestTick { slide_id }
        }));
        Some(SlideEffect::Break(BreakAction::Rest))
    }

    pub(crate) fn continue_watching(&mut self) -> Option<SlideEffect> {
        if self.phase == BreakPhase::Finished {
            return None;
        }
        self.finish();
        Some(SlideEffect::Break(BreakAction::Continue))
    }

    pub(crate) fn skip_rest(&mut self) -> Option<SlideEffect> {
        if !matches!(self.phase, BreakPhase::Resting { .. }) {
            return None;
        }
        self.finish();
        Some(SlideEffect::Break(BreakAction::RestSkip))
    }

    pub(crate) fn on_rest_tick(&mut self) -> Option<SlideEffect> {
        let BreakPhase::Resting { remaining } = &mut self.phase else {
            return None;
        };
        *remaining = remaining.saturating_sub(COUNTDOWN_TICK);
        if !remaining.is_zero() {
            return None;
        }
        self.complete_rest()
    }

    /// End the rest early as if the countdown had run out.
    pub(crate) fn complete_rest(&mut self) -> Option<SlideEffect> {
        if !matches!(self.phase, BreakPhase::Resting { .. }) {
            return None;
        }
        self.finish();
        Some(SlideEffect::Break(BreakAction::RestComplete))
    }

    fn finish(&mut self) {
        self.phase = BreakPhase::Finished;
        self.countdown.abort();
    }

    pub(crate) fn destroy(&mut self) {
        self.countdown.abort();
        self.active = false;
    }

    pub(crate) fn timer_count(&self) -> usize {
        usize::from(self.countdown.is_running())
    }

    pub fn view(&self) -> BreakSlideView {
        let (resting, rest_remaining_secs) = match self.phase {
            BreakPhase::Resting { remaining } => (true, Some(remaining.as_secs())),
            _ => (false, None),
        };
        BreakSlideView {
            slide_id: self.id,
            index: self.index,
            active: self.active,
            tier: self.tier,
            title: self.title.to_string(),
            message: self.message.to_string(),
            watch_time_minutes: self.watch_time_minutes_at_insertion,
            resting,
            rest_remaining_secs,
            finished: self.phase == BreakPhase::Finished,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakSlideView {
    pub slide_id: SlideId,
    pub index: usize,
    pub active: bool,
    pub tier: BreakTier,
    pub title: String,
    pub message: String,
    pub watch_time_minutes: u32,
    pub resting: bool,
    pub rest_remaining_secs: Option<u64>,
    pub finished: bool,
}
