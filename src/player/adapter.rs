use std::{fmt, sync::Arc, time::Duration};

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time};

use crate::feed::events::FeedEvent;
use crate::slides::SlideId;

use super::{PlayerCapabilityLoader, PlayerEventSink, PlayerHandle, SyntheticClock};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Result of the background initialization started for a slide.
pub(crate) enum InitOutcome {
    Embedded(Box<dyn PlayerHandle>),
    /// No embeddable player exists; the slide runs on the synthetic clock.
    Unavailable,
    Failed(String),
}

impl fmt::Debug for InitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitOutcome::Embedded(_) => f.write_str("Embedded(..)"),
            InitOutcome::Unavailable => f.write_str("Unavailable"),
            InitOutcome::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

impl InitOutcome {
    /// Release whatever the outcome holds when nobody is left to own it.
    pub(crate) fn discard(self) {
        if let InitOutcome::Embedded(handle) = self {
            handle.destroy();
        }
    }
}

/// Load the player capability and create a player, reporting back through the feed's
/// event channel. Bounded by `timeout` so a capability that never answers still resolves.
pub(crate) fn spawn_initialization(
    slide_id: SlideId,
    video_id: String,
    loader: Arc<dyn PlayerCapabilityLoader>,
    events: UnboundedSender<FeedEvent>,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let sink = PlayerEventSink::new(slide_id, events.clone());
        let attempt = async {
            let outcome = match loader.ensure_loaded().await? {
                Some(capability) => InitOutcome::Embedded(capability.create_player(&video_id, sink).await?),
                None => InitOutcome::Unavailable,
            };
            Ok::<_, anyhow::Error>(outcome)
        };

        let outcome = match time::timeout(timeout, attempt).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => InitOutcome::Failed(format!("{err:#}")),
            Err(_) => InitOutcome::Failed(format!(
                "player for {video_id} not created within {}ms",
                timeout.as_millis()
            )),
        };
        log_debug!("player init for {video_id} finished: {outcome:?}");

        if let Err(returned) = events.send(FeedEvent::Initialized { slide_id, outcome }) {
            if let FeedEvent::Initialized { outcome, .. } = returned.0 {
                outcome.discard();
            }
        }
    })
}

/// One timing sample taken while playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub position_secs: f64,
    pub duration_secs: f64,
    /// True when the sample came from the synthetic clock.
    pub synthetic: bool,
    /// Only the synthetic clock finishes playback itself; embedded players signal `Ended`.
    pub finished: bool,
}

enum Backend {
    Embedded(Box<dyn PlayerHandle>),
    Synthetic,
}

/// Uniform lifecycle over an embedded player, with the synthetic clock as fallback
/// whenever timing is unavailable.
pub struct PlayerAdapter {
    backend: Backend,
    clock: SyntheticClock,
    timing_lost: bool,
    destroyed: bool,
}

impl fmt::Debug for PlayerAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerAdapter")
            .field("embedded", &matches!(self.backend, Backend::Embedded(_)))
            .field("synthetic_timing", &self.uses_synthetic_timing())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl PlayerAdapter {
    pub fn embedded(handle: Box<dyn PlayerHandle>, nominal: Duration) -> Self {
        Self {
            backend: Backend::Embedded(handle),
            clock: SyntheticClock::new(nominal),
            timing_lost: false,
            destroyed: false,
        }
    }

    pub fn synthetic(nominal: Duration) -> Self {
        Self {
            backend: Backend::Synthetic,
            clock: SyntheticClock::new(nominal),
            timing_lost: false,
            destroyed: false,
        }
    }

    pub fn uses_synthetic_timing(&self) -> bool {
        matches!(self.backend, Backend::Synthetic) || self.timing_lost
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn play(&self) {
        if let (Backend::Embedded(handle), false) = (&self.backend, self.destroyed) {
            handle.play();
        }
    }

    pub fn pause(&self) {
        if let (Backend::Embedded(handle), false) = (&self.backend, self.destroyed) {
            handle.pause();
        }
    }

    /// Rewind to the beginning.
    pub fn restart(&mut self) {
        self.clock.reset();
        if let (Backend::Embedded(handle), false) = (&self.backend, self.destroyed) {
            handle.seek_to(0.0);
        }
    }

    /// Query the player for progress, falling back to the synthetic clock (advanced by
    /// `step`) once the player stops reporting usable timing.
    pub fn sample(&mut self, step: Duration) -> ProgressSample {
        if let (Backend::Embedded(handle), false) = (&self.backend, self.timing_lost) {
            match (handle.current_time(), handle.duration()) {
                (Some(position), Some(duration)) if duration > 0.0 => {
                    return ProgressSample {
                        position_secs: position.clamp(0.0, duration),
                        duration_secs: duration,
                        synthetic: false,
                        finished: false,
                    };
                }
                _ => {
                    log_info!("player timing unavailable, switching to synthetic progress");
                    self.timing_lost = true;
                }
            }
        }

        let finished = self.clock.advance(step);
        ProgressSample {
            position_secs: self.clock.position_secs(),
            duration_secs: self.clock.duration_secs(),
            synthetic: true,
            finished,
        }
    }

    pub fn destroy(&mut self) {
        if std::mem::replace(&mut self.destroyed, true) {
            return;
        }
        if let Backend::Embedded(handle) = &self.backend {
            handle.pause();
            handle.destroy();
        }
    }
}

impl Drop for PlayerAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}
