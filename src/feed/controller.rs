use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver},
        watch, Mutex,
    },
    task::JoinHandle,
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use crate::gesture::{InputEvent, Intent};
use crate::player::{NoPlayerCapability, PlayerCapabilityLoader, PlayerState};
use crate::session::WatchSessionSnapshot;
use crate::settings::FeedConfig;
use crate::slides::{BreakAction, Slide, VideoDescriptor};

use super::events::{EmptySupply, FeedEvent, FeedHost, NullHost, VideoSupply};
use super::pump::{drain, event_loop};
use super::state::{FeedSnapshot, FeedState};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Collaborators injected into the feed.
#[derive(Clone)]
pub struct FeedDeps {
    pub loader: Arc<dyn PlayerCapabilityLoader>,
    pub supply: Arc<dyn VideoSupply>,
    pub host: Arc<dyn FeedHost>,
}

impl Default for FeedDeps {
    fn default() -> Self {
        Self {
            loader: Arc::new(NoPlayerCapability),
            supply: Arc::new(EmptySupply),
            host: Arc::new(NullHost),
        }
    }
}

/// Owns the slide list and drives navigation, infinite scroll and break insertion.
///
/// Cheap to clone; every clone talks to the same feed.
#[derive(Clone)]
pub struct SwiperController {
    state: Arc<Mutex<FeedState>>,
    receiver: Arc<Mutex<Option<UnboundedReceiver<FeedEvent>>>>,
    pump: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel_token: CancellationToken,
    transitions: watch::Receiver<bool>,
}

impl SwiperController {
    pub fn new(mut config: FeedConfig, initial: Vec<VideoDescriptor>, deps: FeedDeps) -> Result<Self> {
        config.validate().context("invalid feed configuration")?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (transitions_tx, transitions_rx) = watch::channel(false);
        let state = FeedState::new(
            config,
            initial,
            events_tx,
            deps.loader,
            deps.supply,
            deps.host,
            transitions_tx,
        );

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            receiver: Arc::new(Mutex::new(Some(events_rx))),
            pump: Arc::new(Mutex::new(None)),
            cancel_token: CancellationToken::new(),
            transitions: transitions_rx,
        })
    }

    /// Start the event loop and the watch-time heartbeat, then activate the first slide.
    pub async fn start(&self) -> Result<()> {
        let receiver = self.receiver.lock().await.take();
        self.state.lock().await.start()?;

        if let Some(receiver) = receiver {
            let handle = tokio::spawn(event_loop(self.state.clone(), receiver, self.cancel_token.clone()));
            *self.pump.lock().await = Some(handle);
        }
        Ok(())
    }

    pub async fn move_to_index(&self, target: usize, animated: bool) -> bool {
        self.state
            .lock()
            .await
            .move_to_index(target, animated, Instant::now())
    }

    /// Move on to the next slide; deferred while an animation runs or the tail is loading.
    pub async fn handle_auto_advance(&self) -> bool {
        self.state.lock().await.handle_auto_advance(Instant::now())
    }

    pub async fn check_infinite_scroll(&self) -> bool {
        self.state.lock().await.check_infinite_scroll()
    }

    /// Insert a break after the current slide if one is due; returns its index.
    pub async fn check_for_break_slide(&self) -> Option<usize> {
        self.state.lock().await.check_for_break_slide()
    }

    pub async fn handle_break_action(&self, action: BreakAction) -> bool {
        self.state
            .lock()
            .await
            .handle_break_action(action, Instant::now())
    }

    /// Feed a raw pointer, wheel or key event through gesture recognition.
    pub async fn handle_input(&self, event: InputEvent) -> bool {
        self.state.lock().await.handle_input(event, Instant::now())
    }

    pub async fn dispatch(&self, intent: Intent) -> bool {
        self.state.lock().await.dispatch(intent, Instant::now())
    }

    /// Resolves once no slide animation is in flight.
    pub async fn transition_complete(&self) {
        let mut transitions = self.transitions.clone();
        // Only fails if the feed state was dropped, in which case nothing is animating.
        let _ = transitions.wait_for(|animating| !*animating).await;
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.state.lock().await.snapshot(Instant::now())
    }

    pub async fn current_index(&self) -> usize {
        self.state.lock().await.current_index()
    }

    pub async fn slide_count(&self) -> usize {
        self.state.lock().await.slides().len()
    }

    pub async fn is_break_at(&self, index: usize) -> bool {
        self.state
            .lock()
            .await
            .slides()
            .get(index)
            .is_some_and(Slide::is_break)
    }

    pub async fn break_tag_at(&self, index: usize) -> Option<u32> {
        self.state
            .lock()
            .await
            .slides()
            .get(index)
            .and_then(Slide::as_break)
            .map(|pause| pause.watch_time_minutes_at_insertion())
    }

    pub async fn player_state(&self, index: usize) -> Option<PlayerState> {
        self.state
            .lock()
            .await
            .slides()
            .get(index)
            .and_then(Slide::as_video)
            .map(|video| video.player_state().clone())
    }

    pub async fn is_animating(&self) -> bool {
        self.state.lock().await.is_animating()
    }

    pub async fn is_loading_batch(&self) -> bool {
        self.state.lock().await.is_loading_batch()
    }

    pub async fn is_inserting_break(&self) -> bool {
        self.state.lock().await.is_inserting_break()
    }

    pub async fn is_started(&self) -> bool {
        self.state.lock().await.is_started()
    }

    pub async fn is_destroyed(&self) -> bool {
        self.state.lock().await.is_destroyed()
    }

    pub async fn config(&self) -> FeedConfig {
        self.state.lock().await.config().clone()
    }

    pub async fn session(&self) -> WatchSessionSnapshot {
        self.state.lock().await.session().snapshot()
    }

    /// Background tasks still alive across the feed and all of its slides.
    pub async fn active_timer_count(&self) -> usize {
        self.state.lock().await.active_timer_count()
    }

    pub async fn active_slide_count(&self) -> usize {
        self.state.lock().await.active_slide_count()
    }

    /// Release every slide, player and timer, then stop the event loop. Nothing fires
    /// afterwards; later calls are no-ops.
    pub async fn destroy(&self) -> Result<()> {
        let released = self.state.lock().await.destroy();
        self.cancel_token.cancel();

        if let Some(mut receiver) = self.receiver.lock().await.take() {
            drain(&mut receiver);
        }

        if let Some(handle) = self.pump.lock().await.take() {
            handle.await.context("feed event loop failed to join")?;
        }
        if released {
            log_info!("swiper controller destroyed");
        }
        Ok(())
    }
}
