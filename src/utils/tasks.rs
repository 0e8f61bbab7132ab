use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// Owns at most one background task; replacing or dropping the slot aborts it.
#[derive(Debug, Default)]
pub struct TaskSlot {
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.handle.replace(handle) {
            previous.abort();
        }
    }

    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Deliver `message` once after `delay`.
pub fn spawn_after<T>(delay: Duration, tx: UnboundedSender<T>, message: T) -> JoinHandle<()>
where
    T: Send + 'static,
{
    tokio::spawn(async move {
        time::sleep(delay).await;
        let _ = tx.send(message);
    })
}

/// Deliver a fresh message every `period`, starting one period from now.
///
/// Stops on its own once the receiving side is gone.
pub fn spawn_every<T, F>(period: Duration, tx: UnboundedSender<T>, mut make: F) -> JoinHandle<()>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.send(make()).is_err() {
                break;
            }
        }
    })
}
