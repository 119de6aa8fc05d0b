//! A not-yet-sent REST request.

use halcyon_http_ratelimiting::request::{Method, Path};
use hyper::header::{HeaderName, HeaderValue};
use std::time::{Duration, Instant};

/// Default per-request deadline if the caller doesn't supply one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Where a request falls in line relative to others waiting on the same
/// bucket. Default is [`Priority::Normal`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum Priority {
    /// Yields to normal- and high-priority requests issued after it.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Jumps ahead of normal- and low-priority requests issued after it.
    High,
}

/// `{ method, path, body, query, headers, files, reason, timeout, priority }`
/// as described by the request record in the data model: a fully-formed
/// request, ready to be hashed into a bucket and enqueued.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) files: Vec<(String, Vec<u8>)>,
    pub(crate) reason: Option<String>,
    pub(crate) deadline: Instant,
    pub(crate) priority: Priority,
}

impl Request {
    /// Start building a request against `path`, which must not include the
    /// leading `/api/vN` version prefix or a query string.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            headers: Vec::new(),
            files: Vec::new(),
            reason: None,
            deadline: Instant::now() + DEFAULT_TIMEOUT,
            priority: Priority::default(),
        }
    }

    /// Attach a JSON-encodable body.
    #[must_use]
    pub fn json(mut self, value: &impl serde::Serialize) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }

    /// Attach a raw body, sent as-is.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a file to be sent as a multipart part.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, content: Vec<u8>) -> Self {
        self.files.push((name.into(), content));
        self
    }

    /// Set the audit-log reason echoed by the Service.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach an additional header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Append a query string parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set this request's priority relative to others waiting on the same
    /// bucket; the default is [`Priority::Normal`].
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Override the per-request deadline; the default is 15 seconds from
    /// now.
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = deadline;
        self
    }

    /// Route key this request is bucketed under.
    #[must_use]
    pub fn bucket_path(&self) -> Path {
        Path::new(self.method, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Request};
    use halcyon_http_ratelimiting::request::Method;

    #[test]
    fn bucket_path_normalizes_ids() {
        let request = Request::new(Method::Get, "/channels/123456789012345678/messages");
        assert_eq!(request.bucket_path().route(), "/channels/{id}/messages");
    }

    #[test]
    fn deadline_defaults_to_fifteen_seconds_out() {
        let request = Request::new(Method::Get, "/gateway");
        assert!(request.deadline > std::time::Instant::now() + std::time::Duration::from_secs(14));
    }

    #[test]
    fn query_params_accumulate_in_order() {
        let request = Request::new(Method::Get, "/channels/123/messages")
            .query("limit", "50")
            .query("before", "456");

        assert_eq!(
            vec![
                ("limit".to_owned(), "50".to_owned()),
                ("before".to_owned(), "456".to_owned()),
            ],
            request.query,
        );
    }

    #[test]
    fn priority_defaults_to_normal() {
        let request = Request::new(Method::Get, "/gateway");
        assert_eq!(Priority::Normal, request.priority);

        let request = request.priority(Priority::High);
        assert_eq!(Priority::High, request.priority);
    }
}
