use crate::state::messages::LoadRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Re-reads every source on a fixed interval.
pub struct PeriodicRefresher {
    load_requests: mpsc::Sender<LoadRequest>,
    every: Duration,
}

impl PeriodicRefresher {
    pub fn new(load_requests: mpsc::Sender<LoadRequest>, every: Duration) -> Self {
        Self { load_requests, every }
    }

    pub async fn run(self) {
        let mut reload_interval = interval(self.every);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        reload_interval.tick().await;

        loop {
            reload_interval.tick().await;
            if self.load_requests.send(LoadRequest::Reload).await.is_err() {
                break;
            }
        }
    }
}
