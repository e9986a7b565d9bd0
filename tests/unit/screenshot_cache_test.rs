//! Unit tests for the periodic screenshot cache, on a paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use steprecorder::services::messaging::{BackgroundClient, BackgroundPort};
use steprecorder::services::screenshot_cache::ScreenshotCache;
use steprecorder::types::errors::TransportError;
use steprecorder::types::message::{Ack, BackgroundRequest, BackgroundResponse};

/// Answers every capture with a numbered fake image.
#[derive(Default)]
struct CountingPort {
    captures: AtomicUsize,
}

impl CountingPort {
    fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackgroundPort for CountingPort {
    async fn send(&self, request: BackgroundRequest) -> Result<BackgroundResponse, TransportError> {
        match request {
            BackgroundRequest::CaptureScreenshot => {
                let n = self.captures.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(BackgroundResponse::Screenshot(Some(format!("shot-{}", n))))
            }
            _ => Ok(BackgroundResponse::Ack(Ack::ok())),
        }
    }
}

const PERIOD: Duration = Duration::from_millis(550);

fn cache() -> (ScreenshotCache<CountingPort>, Arc<CountingPort>) {
    let port = Arc::new(CountingPort::default());
    let client = BackgroundClient::new(Arc::clone(&port), Duration::from_secs(10));
    (ScreenshotCache::new(client, PERIOD), port)
}

#[tokio::test(start_paused = true)]
async fn test_first_capture_lands_one_period_after_start() {
    let (mut cache, port) = cache();
    cache.start();
    assert!(cache.is_running());

    sleep(Duration::from_millis(500)).await;
    assert_eq!(port.captures(), 0);
    assert_eq!(cache.latest(), None);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(port.captures(), 1);
    assert_eq!(cache.latest().as_deref(), Some("shot-1"));

    sleep(PERIOD).await;
    assert_eq!(port.captures(), 2);
    assert_eq!(cache.latest().as_deref(), Some("shot-2"));
}

#[tokio::test(start_paused = true)]
async fn test_stop_clears_value_and_halts_captures() {
    let (mut cache, port) = cache();
    cache.start();
    sleep(Duration::from_millis(600)).await;
    assert!(cache.latest().is_some());

    cache.stop();
    assert!(!cache.is_running());
    assert_eq!(cache.latest(), None);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(port.captures(), 1);
    assert_eq!(cache.latest(), None);
}

#[tokio::test(start_paused = true)]
async fn test_restart_drops_previous_value() {
    let (mut cache, port) = cache();
    cache.start();
    sleep(Duration::from_millis(600)).await;

    cache.start();
    assert_eq!(cache.latest(), None);

    sleep(Duration::from_millis(600)).await;
    assert_eq!(port.captures(), 2);
    assert_eq!(cache.latest().as_deref(), Some("shot-2"));
}

#[tokio::test(start_paused = true)]
async fn test_latest_or_capture_falls_back_to_on_demand() {
    let (mut cache, port) = cache();

    assert_eq!(cache.latest_or_capture().await.as_deref(), Some("shot-1"));
    assert_eq!(cache.latest(), None, "on-demand captures are not cached");

    cache.start();
    sleep(Duration::from_millis(600)).await;
    assert_eq!(cache.latest_or_capture().await.as_deref(), Some("shot-2"));
    assert_eq!(port.captures(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_cache_stops_timer() {
    let (mut cache, port) = cache();
    cache.start();
    drop(cache);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(port.captures(), 0);
}
