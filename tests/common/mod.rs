#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use reelfeed_lib::{
    FeedConfig, FeedDeps, FeedHost, HostEvent, PlayerCapability, PlayerCapabilityLoader, PlayerEventSink,
    PlayerHandle, PlayerSignal, SlideId, SwiperController, VideoDescriptor, VideoSupply,
};

pub fn videos(count: usize) -> Vec<VideoDescriptor> {
    (0..count)
        .map(|i| VideoDescriptor::new(format!("seed{i}"), format!("Seed video {i}"), "@seed"))
        .collect()
}

/// Config with a long nominal video length so nothing auto-advances unless a test wants it.
pub fn quiet_config() -> FeedConfig {
    FeedConfig {
        fallback_duration_ms: 600_000,
        ..FeedConfig::default()
    }
}

#[derive(Debug, Default)]
pub struct PlayerStats {
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub plays: AtomicUsize,
    pub pauses: AtomicUsize,
}

impl PlayerStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

struct MockHandle {
    stats: Arc<PlayerStats>,
    timing: Option<(f64, f64)>,
}

impl PlayerHandle for MockHandle {
    fn play(&self) {
        self.stats.plays.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.stats.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn seek_to(&self, _seconds: f64) {}

    fn current_time(&self) -> Option<f64> {
        self.timing.map(|(position, _)| position)
    }

    fn duration(&self) -> Option<f64> {
        self.timing.map(|(_, duration)| duration)
    }

    fn destroy(&self) {
        self.stats.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Player capability that records every player it creates.
pub struct MockCapability {
    pub stats: Arc<PlayerStats>,
    auto_ready: bool,
    timing: Option<(f64, f64)>,
    sinks: Mutex<Vec<PlayerEventSink>>,
}

impl MockCapability {
    /// Players report ready immediately and expose no timing.
    pub fn new() -> Arc<Self> {
        Self::with(true, None)
    }

    pub fn with(auto_ready: bool, timing: Option<(f64, f64)>) -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(PlayerStats::default()),
            auto_ready,
            timing,
            sinks: Mutex::new(Vec::new()),
        })
    }

    pub fn sink_for(&self, slide_id: SlideId) -> Option<PlayerEventSink> {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .find(|sink| sink.slide_id() == slide_id)
            .cloned()
    }
}

#[async_trait]
impl PlayerCapability for MockCapability {
    async fn create_player(&self, _video_id: &str, sink: PlayerEventSink) -> Result<Box<dyn PlayerHandle>> {
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        if self.auto_ready {
            sink.emit(PlayerSignal::Ready);
        }
        self.sinks.lock().unwrap().push(sink);
        Ok(Box::new(MockHandle {
            stats: self.stats.clone(),
            timing: self.timing,
        }))
    }
}

pub enum MockLoader {
    Loaded(Arc<MockCapability>),
    Failing,
}

#[async_trait]
impl PlayerCapabilityLoader for MockLoader {
    async fn ensure_loaded(&self) -> Result<Option<Arc<dyn PlayerCapability>>> {
        match self {
            MockLoader::Loaded(capability) => Ok(Some(capability.clone() as Arc<dyn PlayerCapability>)),
            MockLoader::Failing => bail!("player script failed to load"),
        }
    }
}

/// Supply producing numbered videos after an optional delay.
#[derive(Default)]
pub struct MockSupply {
    pub calls: AtomicUsize,
    delay: Duration,
    produced: AtomicUsize,
}

impl MockSupply {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSupply for MockSupply {
    async fn generate_next_batch(&self, count: usize) -> Result<Vec<VideoDescriptor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let first = self.produced.fetch_add(count, Ordering::SeqCst);
        Ok((first..first + count)
            .map(|i| VideoDescriptor::new(format!("more{i}"), format!("More video {i}"), "@supply"))
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&HostEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|event| predicate(event)).count()
    }

    pub fn slide_changes(&self) -> usize {
        self.count(|event| matches!(event, HostEvent::SlideChanged { .. }))
    }
}

impl FeedHost for RecordingHost {
    fn emit(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub controller: SwiperController,
    pub host: Arc<RecordingHost>,
}

pub fn harness(config: FeedConfig, initial: Vec<VideoDescriptor>, deps: FeedDeps) -> Harness {
    let host = Arc::new(RecordingHost::default());
    let deps = FeedDeps {
        host: host.clone(),
        ..deps
    };
    let controller = SwiperController::new(config, initial, deps).expect("valid feed config");
    Harness { controller, host }
}
