//! Maps a response status code to one of the four outcomes a caller of the
//! REST engine can observe.

use hyper::StatusCode;

/// Outcome of classifying a response by its status code.
///
/// Rate-limit metadata itself (`limit`, `remaining`, `reset`, `bucket`,
/// `global`, `scope`) is extracted separately, from the response headers,
/// via [`halcyon_http_ratelimiting::headers::RatelimitHeaders`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Classification {
    /// 2xx. The body may be empty (204).
    Success,
    /// 429. The caller should not see this as a failure: the bucket installs
    /// a pause and the engine retries once it expires.
    RateLimited,
    /// 4xx other than 429. Permanent; not retried.
    Permanent,
    /// 5xx. Retried with exponential backoff up to the configured retry
    /// count.
    Retryable,
}

#[must_use]
pub fn classify(status: StatusCode) -> Classification {
    if status.is_success() {
        Classification::Success
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Classification::RateLimited
    } else if status.is_client_error() {
        Classification::Permanent
    } else {
        Classification::Retryable
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, Classification};
    use hyper::StatusCode;

    #[test]
    fn classifies_the_response_table() {
        assert_eq!(classify(StatusCode::OK), Classification::Success);
        assert_eq!(classify(StatusCode::NO_CONTENT), Classification::Success);
        assert_eq!(classify(StatusCode::TOO_MANY_REQUESTS), Classification::RateLimited);
        assert_eq!(classify(StatusCode::FORBIDDEN), Classification::Permanent);
        assert_eq!(classify(StatusCode::BAD_REQUEST), Classification::Permanent);
        assert_eq!(classify(StatusCode::INTERNAL_SERVER_ERROR), Classification::Retryable);
        assert_eq!(classify(StatusCode::SERVICE_UNAVAILABLE), Classification::Retryable);
    }
}
