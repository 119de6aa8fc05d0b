//! A single bucket's request queue and refresh bookkeeping.

use super::GlobalLockPair;
use crate::{
    headers::RatelimitHeaders,
    request::Path,
    ticket::TicketNotifier,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::{
    sync::{mpsc, Mutex},
    time::{sleep, timeout},
};

/// Sentinel value for [`Bucket::limit`] meaning the limit is not yet known.
const LIMIT_UNKNOWN: u64 = u64::MAX;

/// How long the bucket's background task waits for a response's headers
/// before treating the request as abandoned.
const RESPONSE_WAIT: Duration = Duration::from_secs(10);

/// Result of checking how much longer a bucket has before it refreshes.
#[derive(Clone, Copy, Debug)]
enum TimeRemaining {
    /// The reset window has already elapsed.
    Finished,
    /// The bucket hasn't started a reset window yet.
    NotStarted,
    /// The bucket will refresh after this much more time.
    Some(Duration),
}

/// Per-route ratelimit bucket: a FIFO of waiting tickets plus the counters
/// learned from the Service's ratelimit headers.
#[derive(Debug)]
pub(super) struct Bucket {
    limit: AtomicU64,
    queue: BucketQueue,
    remaining: AtomicU64,
    reset_after: AtomicU64,
    started_at: Mutex<Option<Instant>>,
}

impl Bucket {
    /// Create a fresh bucket.
    ///
    /// `remaining` starts at 1 so the first request through this bucket may
    /// proceed before any headers have been observed.
    pub fn new() -> Self {
        Self {
            limit: AtomicU64::new(LIMIT_UNKNOWN),
            queue: BucketQueue::default(),
            remaining: AtomicU64::new(1),
            reset_after: AtomicU64::new(0),
            started_at: Mutex::new(None),
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn reset_after(&self) -> u64 {
        self.reset_after.load(Ordering::Relaxed)
    }

    pub async fn started_at(&self) -> Option<Instant> {
        *self.started_at.lock().await
    }

    pub fn push(&self, notifier: TicketNotifier) {
        self.queue.push(notifier);
    }

    /// How much longer until the bucket's reset window elapses.
    async fn time_remaining(&self) -> TimeRemaining {
        let reset_after = self.reset_after();
        let started_at = match *self.started_at.lock().await {
            Some(instant) => instant,
            None => return TimeRemaining::NotStarted,
        };
        let elapsed = started_at.elapsed();

        if elapsed > Duration::from_millis(reset_after) {
            return TimeRemaining::Finished;
        }

        TimeRemaining::Some(Duration::from_millis(reset_after) - elapsed)
    }

    /// If the reset window has elapsed, restore `remaining` to `limit` and
    /// clear the refresh timer.
    async fn try_reset(&self) -> bool {
        if self.started_at.lock().await.is_none() {
            return false;
        }

        if let TimeRemaining::Finished = self.time_remaining().await {
            self.remaining.store(self.limit(), Ordering::Relaxed);
            *self.started_at.lock().await = None;

            true
        } else {
            false
        }
    }

    /// Apply the ratelimit counters learned from a response, or speculatively
    /// decrement `remaining` if no headers were available.
    async fn update(&self, counters: Option<(u64, u64, u64)>) {
        {
            let mut started_at = self.started_at.lock().await;

            if started_at.is_none() {
                started_at.replace(Instant::now());
            }
        }

        if let Some((limit, remaining, reset_after)) = counters {
            self.limit.store(limit, Ordering::SeqCst);
            self.reset_after.store(reset_after, Ordering::SeqCst);
            self.remaining.store(remaining, Ordering::Relaxed);
        } else {
            self.remaining.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

/// FIFO of tickets waiting for this bucket to grant them.
#[derive(Debug)]
struct BucketQueue {
    rx: Mutex<mpsc::UnboundedReceiver<TicketNotifier>>,
    tx: mpsc::UnboundedSender<TicketNotifier>,
}

impl BucketQueue {
    fn push(&self, notifier: TicketNotifier) {
        let _ = self.tx.send(notifier);
    }

    async fn pop(&self, wait: Duration) -> Option<TicketNotifier> {
        let mut rx = self.rx.lock().await;

        timeout(wait, rx.recv()).await.ok().flatten()
    }
}

impl Default for BucketQueue {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            rx: Mutex::new(rx),
            tx,
        }
    }
}

/// Background task that drains one bucket's queue in order, pausing for the
/// global lock and the bucket's own reset window as needed.
pub(super) struct BucketQueueTask {
    bucket: Arc<Bucket>,
    buckets: Arc<std::sync::Mutex<HashMap<Path, Arc<Bucket>>>>,
    global: Arc<GlobalLockPair>,
    path: Path,
}

impl BucketQueueTask {
    pub fn new(
        bucket: Arc<Bucket>,
        buckets: Arc<std::sync::Mutex<HashMap<Path, Arc<Bucket>>>>,
        global: Arc<GlobalLockPair>,
        path: Path,
    ) -> Self {
        Self {
            bucket,
            buckets,
            global,
            path,
        }
    }

    pub async fn run(self) {
        while let Some(notifier) = self.next().await {
            let Some(ticket_headers) = notifier.available() else {
                continue;
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(path = ?self.path, "waiting for response headers");

            match timeout(RESPONSE_WAIT, ticket_headers).await {
                Ok(Ok(Some(headers))) => self.handle_headers(&headers).await,
                Ok(Ok(None)) | Ok(Err(_)) | Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(path = ?self.path, "request never sent back headers");
                }
            }
        }

        self.buckets.lock().expect("buckets poisoned").remove(&self.path);
    }

    async fn handle_headers(&self, headers: &RatelimitHeaders) {
        let counters = match headers {
            RatelimitHeaders::GlobalLimited(global) => {
                self.lock_global(global.retry_after()).await;

                None
            }
            RatelimitHeaders::None => return,
            RatelimitHeaders::Present(present) => {
                Some((present.limit(), present.remaining(), present.reset_after()))
            }
        };

        self.bucket.update(counters).await;
    }

    async fn lock_global(&self, retry_after_secs: u64) {
        self.global.lock();
        let guard = self.global.0.lock().await;
        sleep(Duration::from_secs(retry_after_secs)).await;
        self.global.unlock();

        drop(guard);
    }

    async fn next(&self) -> Option<TicketNotifier> {
        self.wait_if_needed().await;

        let notifier = self.bucket.queue.pop(RESPONSE_WAIT).await?;

        if self.global.is_locked() {
            let _ = self.global.0.lock().await;
        }

        Some(notifier)
    }

    async fn wait_if_needed(&self) {
        if self.bucket.remaining() > 0 {
            return;
        }

        match self.bucket.time_remaining().await {
            TimeRemaining::Finished => {
                self.bucket.try_reset().await;
            }
            TimeRemaining::NotStarted => {}
            TimeRemaining::Some(wait) => {
                sleep(wait).await;
                self.bucket.try_reset().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bucket, LIMIT_UNKNOWN};

    #[tokio::test]
    async fn fresh_bucket_allows_one_request_before_any_headers() {
        let bucket = Bucket::new();

        assert_eq!(1, bucket.remaining());
        assert_eq!(LIMIT_UNKNOWN, bucket.limit());
    }

    #[tokio::test]
    async fn update_prefers_header_values_over_speculative_decrement() {
        let bucket = Bucket::new();

        bucket.update(Some((5, 3, 1_000))).await;
        assert_eq!(5, bucket.limit());
        assert_eq!(3, bucket.remaining());

        bucket.update(None).await;
        assert_eq!(2, bucket.remaining());
    }
}
