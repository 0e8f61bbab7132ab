pub mod feed;
pub mod gesture;
pub mod player;
pub mod session;
pub mod settings;
pub mod slides;
pub mod utils;

pub use feed::{FeedAction, FeedDeps, FeedHost, FeedSnapshot, HostEvent, SwiperController, VideoSupply};
pub use gesture::{Direction, InputEvent, Intent, Key};
pub use player::{
    PlaybackErrorKind, PlayerCapability, PlayerCapabilityLoader, PlayerError, PlayerEventSink, PlayerHandle,
    PlayerSignal, PlayerState,
};
pub use settings::{FeedConfig, ReentryPolicy, SettingsStore};
pub use slides::{BreakAction, SlideId, VideoDescriptor};

/// Install the `env_logger` backend. Hosts call this once at startup.
pub fn init_logging() {
    utils::logging::init();
}
