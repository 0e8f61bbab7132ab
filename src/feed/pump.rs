use std::sync::Arc;

use tokio::{
    sync::{mpsc::UnboundedReceiver, Mutex},
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use super::events::FeedEvent;
use super::state::FeedState;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Apply every event posted by timers and players to the feed, one at a time, until
/// cancelled.
pub(crate) async fn event_loop(
    state: Arc<Mutex<FeedState>>,
    mut events: UnboundedReceiver<FeedEvent>,
    cancel_token: CancellationToken,
) {
    log_debug!("feed event loop running");

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("feed event loop shutting down");
                break;
            }
            maybe_event = events.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                let mut guard = state.lock().await;
                guard.handle_event(event, Instant::now());
            }
        }
    }

    drain(&mut events);
}

/// Close the channel and release anything still in flight, such as players created
/// after teardown began.
pub(crate) fn drain(events: &mut UnboundedReceiver<FeedEvent>) {
    events.close();
    let mut dropped = 0usize;
    while let Ok(event) = events.try_recv() {
        if let FeedEvent::Initialized { outcome, .. } = event {
            outcome.discard();
        }
        dropped += 1;
    }
    if dropped > 0 {
        log_debug!("discarded {dropped} pending feed events");
    }
}
