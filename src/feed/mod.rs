//! The swiper: slide list ownership, navigation, infinite scroll and break insertion.

pub mod animation;
pub mod controller;
pub mod events;
pub mod preload;
mod pump;
mod state;

pub use animation::{offset_for_index, OffsetMotion, OffsetTween};
pub use controller::{FeedDeps, SwiperController};
pub use events::{EmptySupply, FeedAction, FeedHost, HostEvent, NullHost, VideoSupply};
pub use preload::Preloader;
pub use state::FeedSnapshot;
