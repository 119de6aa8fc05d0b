use halcyon_http_ratelimiting::{
    headers::RatelimitHeaders,
    request::{Method, Path},
    InMemoryRatelimiter, Ratelimiter,
};
use std::time::Duration;
use tokio::time::{self, Instant};

fn present(limit: u64, remaining: u64, reset_after_ms: u64) -> RatelimitHeaders {
    RatelimitHeaders::from_pairs(
        [
            ("x-ratelimit-limit", limit.to_string()),
            ("x-ratelimit-remaining", remaining.to_string()),
            (
                "x-ratelimit-reset-after",
                format!("{:.3}", reset_after_ms as f64 / 1000.0),
            ),
            ("x-ratelimit-reset", "0.0".to_owned()),
            ("x-ratelimit-bucket", "shared".to_owned()),
        ]
        .iter()
        .map(|(k, v)| (*k, v.as_bytes())),
    )
    .unwrap()
}

// mirrors scenario 1 of the acceptance suite: five requests against the
// same bucket must all complete without hitting a 429, serialized in order.
#[tokio::test(start_paused = true)]
async fn saturated_bucket_serializes_requests_in_order() {
    let ratelimiter = InMemoryRatelimiter::new();
    let path = Path::new(Method::Get, "/channels/123456789012345678/messages");

    let start = Instant::now();

    for i in 0..5u64 {
        let sender = ratelimiter.wait_for_ticket(path.clone()).await.unwrap();

        sender
            .headers(Some(present(5, 4 - i.min(4), 1_000)))
            .unwrap();
    }

    // All five tickets were granted without ever blocking on a reset, since
    // `remaining` only reached 0 on the last of them.
    assert!(start.elapsed() < Duration::from_millis(1_200));
}

#[tokio::test(start_paused = true)]
async fn bucket_merging_routes_future_requests_through_the_canonical_bucket() {
    let ratelimiter = InMemoryRatelimiter::new();
    let first = Path::new(Method::Get, "/channels/123456789012345678/messages");
    let second = Path::new(Method::Get, "/channels/987654321098765432/messages");

    // Both paths normalize to the same route key before any bucket exists.
    assert_eq!(first, second);

    let sender = ratelimiter.wait_for_ticket(first).await.unwrap();
    sender.headers(Some(present(1, 0, 50))).unwrap();

    // The route is now known and has a live bucket with no tickets left;
    // the next request against the (identically-keyed) second path must
    // wait for that same bucket's reset instead of being issued immediately.
    let before = Instant::now();
    let _sender = ratelimiter.wait_for_ticket(second).await.unwrap();
    assert!(before.elapsed() >= Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn global_ratelimit_headers_lock_the_ratelimiter_immediately() {
    let ratelimiter = InMemoryRatelimiter::new();
    let path = Path::new(Method::Get, "/channels/123456789012345678/messages");

    let sender = ratelimiter.wait_for_ticket(path).await.unwrap();
    let headers = RatelimitHeaders::from_pairs(
        [("retry-after", "2"), ("x-ratelimit-global", "true")]
            .into_iter()
            .map(|(k, v)| (k, v.as_bytes())),
    )
    .unwrap();
    assert!(headers.is_global());
    sender.headers(Some(headers)).unwrap();

    // give the bucket's background task a chance to run and take the lock.
    tokio::task::yield_now().await;
    time::advance(Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    assert!(ratelimiter.globally_locked().await.unwrap());

    time::advance(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;
    assert!(!ratelimiter.globally_locked().await.unwrap());
}
