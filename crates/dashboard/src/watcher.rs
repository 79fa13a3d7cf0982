//! Session watcher
//!
//! Periodically checks the current session for idle timeout and disconnects
//! it once the timeout has passed.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::service::SupplyChainService;

/// Handle to the background idle check; the task stops when this is dropped
pub struct SessionWatcher {
    handle: JoinHandle<()>,
}

impl SessionWatcher {
    /// Start checking every `period`
    pub fn spawn(service: Arc<SupplyChainService>, period: Duration) -> Self {
        info!("Starting session watcher (checking every {:?})", period);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if let Err(e) = service.expire_idle_session().await {
                    error!("Error checking session activity: {:#}", e);
                    // Keep watching; the next tick retries
                }
            }
        });

        Self { handle }
    }

    /// Stop the watcher
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
