//! Screenshot Cache for the step recorder.
//!
//! Keeps the most recent visible-tab capture so that a click can be annotated
//! without waiting on the browser's rate-limited capture call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::services::messaging::{BackgroundClient, BackgroundPort};

#[derive(Default)]
struct CacheSlot {
    latest: Option<String>,
    /// Bumped on every start/stop so a capture that resolves late is dropped.
    generation: u64,
}

pub struct ScreenshotCache<P: BackgroundPort> {
    client: BackgroundClient<P>,
    period: Duration,
    slot: Arc<Mutex<CacheSlot>>,
    task: Option<JoinHandle<()>>,
}

impl<P: BackgroundPort> ScreenshotCache<P> {
    pub fn new(client: BackgroundClient<P>, period: Duration) -> Self {
        Self {
            client,
            period,
            slot: Arc::new(Mutex::new(CacheSlot::default())),
            task: None,
        }
    }

    /// Starts the capture timer. The first capture happens one period from now.
    /// Restarting drops the previous timer and cached value.
    pub fn start(&mut self) {
        self.stop();
        let generation = match self.slot.lock() {
            Ok(slot) => slot.generation,
            Err(_) => return,
        };

        let client = self.client.clone();
        let slot = Arc::clone(&self.slot);
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match client.capture_screenshot().await {
                    Ok(Some(shot)) => {
                        if let Ok(mut slot) = slot.lock() {
                            if slot.generation != generation {
                                return;
                            }
                            slot.latest = Some(shot);
                        }
                    }
                    Ok(None) => debug!("periodic capture returned nothing"),
                    Err(e) => warn!(error = %e, "periodic capture failed"),
                }
            }
        }));
        debug!(period_ms = period.as_millis() as u64, "screenshot cache started");
    }

    /// Clears the timer and drops the cached capture.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("screenshot cache stopped");
        }
        if let Ok(mut slot) = self.slot.lock() {
            slot.generation = slot.generation.wrapping_add(1);
            slot.latest = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// The cached capture, without a round trip.
    pub fn latest(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.latest.clone())
    }

    /// Cached capture, or an on-demand capture when the cache is still empty.
    pub async fn latest_or_capture(&self) -> Option<String> {
        match self.latest() {
            Some(shot) => Some(shot),
            None => self.capture_now().await,
        }
    }

    /// Capture fresh from the background, bypassing the cache.
    pub async fn capture_now(&self) -> Option<String> {
        match self.client.capture_screenshot().await {
            Ok(shot) => shot,
            Err(e) => {
                warn!(error = %e, "on-demand capture failed");
                None
            }
        }
    }
}

impl<P: BackgroundPort> Drop for ScreenshotCache<P> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
