//! A [`Ratelimiter`] that keeps all bucket state in process memory.

mod bucket;

use self::bucket::{Bucket, BucketQueueTask};
use super::{
    ticket::{self, TicketNotifier},
    Bucket as InfoBucket, Ratelimiter,
};
use crate::{
    request::Path, GetBucketFuture, GetTicketFuture, HasBucketFuture, IsGloballyLockedFuture,
};
use futures_util::future;
use std::{
    collections::hash_map::{Entry, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::Mutex as AsyncMutex;

/// Global lock. We use a pair to avoid actually locking the mutex every
/// check: futures only wait on the global lock when a global ratelimit is
/// in place, by waiting for a guard and then immediately dropping it.
#[derive(Debug, Default)]
struct GlobalLockPair(AsyncMutex<()>, AtomicBool);

impl GlobalLockPair {
    fn lock(&self) {
        self.1.store(true, Ordering::Release);
    }

    fn unlock(&self) {
        self.1.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.1.load(Ordering::Relaxed)
    }
}

/// Ratelimiter backed by an in-process map of route keys to buckets.
///
/// Each bucket is drained by its own background task, started the first
/// time a ticket is requested for its route and torn down once its queue
/// runs dry.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRatelimiter {
    buckets: Arc<Mutex<HashMap<Path, Arc<Bucket>>>>,
    global: Arc<GlobalLockPair>,
}

impl InMemoryRatelimiter {
    /// Create a new in-memory ratelimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, path: Path, notifier: TicketNotifier) -> (Arc<Bucket>, bool) {
        let mut buckets = self.buckets.lock().expect("buckets poisoned");

        match buckets.entry(path.clone()) {
            Entry::Occupied(entry) => {
                let bucket = entry.into_mut();
                bucket.push(notifier);

                (Arc::clone(bucket), false)
            }
            Entry::Vacant(entry) => {
                let bucket = Bucket::new();
                bucket.push(notifier);

                let bucket = Arc::new(bucket);
                entry.insert(Arc::clone(&bucket));

                (bucket, true)
            }
        }
    }
}

impl Ratelimiter for InMemoryRatelimiter {
    fn bucket(&self, path: &Path) -> GetBucketFuture {
        let bucket = self.buckets.lock().expect("buckets poisoned").get(path).cloned();

        Box::pin(async move {
            let Some(bucket) = bucket else {
                return Ok(None);
            };

            Ok(Some(InfoBucket {
                limit: bucket.limit(),
                remaining: bucket.remaining(),
                reset_after: std::time::Duration::from_millis(bucket.reset_after()),
                started_at: bucket.started_at().await,
            }))
        })
    }

    fn globally_locked(&self) -> IsGloballyLockedFuture {
        Box::pin(future::ok(self.global.is_locked()))
    }

    fn has(&self, path: &Path) -> HasBucketFuture {
        let has = self
            .buckets
            .lock()
            .expect("buckets poisoned")
            .contains_key(path);

        Box::pin(future::ok(has))
    }

    fn ticket(&self, path: Path) -> GetTicketFuture {
        let (notifier, receiver) = ticket::channel();
        let (bucket, fresh) = self.entry(path.clone(), notifier);

        if fresh {
            tokio::spawn(
                BucketQueueTask::new(bucket, Arc::clone(&self.buckets), Arc::clone(&self.global), path)
                    .run(),
            );
        }

        Box::pin(future::ok(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryRatelimiter;
    use crate::{Ratelimiter, request::{Method, Path}};
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(InMemoryRatelimiter: Clone, Debug, Ratelimiter, Send, Sync);

    #[tokio::test]
    async fn fresh_ratelimiter_has_no_buckets() {
        let ratelimiter = InMemoryRatelimiter::new();
        let path = Path::new(Method::Get, "/gateway");

        assert!(!ratelimiter.has(&path).await.unwrap());
        assert!(ratelimiter.bucket(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn requesting_a_ticket_creates_a_bucket_for_its_route() {
        let ratelimiter = InMemoryRatelimiter::new();
        let path = Path::new(Method::Get, "/channels/123456789012345678/messages");

        let receiver = ratelimiter.ticket(path.clone()).await.unwrap();
        let sender = receiver.await.unwrap();
        sender.headers(None).unwrap();

        assert!(ratelimiter.has(&path).await.unwrap());
    }
}
