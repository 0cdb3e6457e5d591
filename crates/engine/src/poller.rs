use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::controller::ListController;

/// Periodic `refresh()` for screens that watch server-side progress.
///
/// One poller per screen; dropping it stops the timer. The timer also ends on
/// its own once the controller is closed.
#[derive(Debug)]
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn start<T: Send + Sync + 'static>(
        controller: ListController<T>,
        every: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the screen already loaded.
            interval.tick().await;
            loop {
                interval.tick().await;
                if controller.refresh().is_err() {
                    tracing::debug!("list controller closed, stopping poller");
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
