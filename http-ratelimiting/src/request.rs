//! Identification of a request for ratelimit bucketing purposes.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// HTTP method used for a REST request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Method {
    /// DELETE.
    Delete,
    /// GET.
    Get,
    /// PATCH.
    Patch,
    /// POST.
    Post,
    /// PUT.
    Put,
}

impl Method {
    /// Name of the HTTP method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// A route, identified by its method and path, that a request is made
/// against.
///
/// Two [`Path`]s derived from paths that differ only in identifier-shaped
/// segments hash and compare equal: they are normalized to the same route
/// key so they can share a [`Bucket`](super::Bucket) before the Service has
/// told us otherwise.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Path {
    method: Method,
    /// Normalized route key, e.g. `/channels/{id}/messages`.
    route: String,
}

impl Path {
    /// Derive the route key for a method and a request path.
    ///
    /// `path` should not include a leading `/api/vN` version prefix or a
    /// query string.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            route: normalize_route(path),
        }
    }

    /// HTTP method of the route.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Normalized route key, with identifier-shaped segments replaced by
    /// placeholders.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.method, self.route)
    }
}

/// Whether a path segment looks like a Service-issued snowflake identifier.
fn is_snowflake(segment: &str) -> bool {
    (17..=19).contains(&segment.len()) && segment.bytes().all(|byte| byte.is_ascii_digit())
}

/// Replace identifier-like segments of a path with placeholders so that
/// routes differing only in those segments collapse to the same key.
///
/// - A 17-19 digit segment becomes `{id}`.
/// - The segment following `reactions` becomes `{emoji}`.
/// - The token segment of a webhook path becomes `{token}`.
fn normalize_route(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        let replacement = if is_snowflake(segment) {
            "{id}"
        } else if index > 0 && segments[index - 1] == "reactions" {
            "{emoji}"
        } else if index > 1 && segments[index - 2] == "webhooks" && is_snowflake(segments[index - 1]) {
            "{token}"
        } else {
            segment
        };

        normalized.push(replacement);
    }

    normalized.join("/")
}

#[cfg(test)]
mod tests {
    use super::{normalize_route, Method, Path};
    use static_assertions::assert_impl_all;
    use std::{fmt::Debug, hash::Hash};

    assert_impl_all!(Path: Clone, Debug, Eq, Hash, PartialEq, Send, Sync);
    assert_impl_all!(Method: Clone, Copy, Debug, Eq, Hash, PartialEq, Send, Sync);

    #[test]
    fn snowflake_segments_collapse_to_the_same_route() {
        let a = Path::new(Method::Get, "/channels/123456789012345678/messages");
        let b = Path::new(Method::Get, "/channels/987654321098765432/messages");

        assert_eq!(a, b);
        assert_eq!(a.route(), "/channels/{id}/messages");
    }

    #[test]
    fn reaction_emoji_segment_is_collapsed() {
        let route = normalize_route("/channels/123456789012345678/messages/876543210987654321/reactions/%F0%9F%91%8D/@me");
        assert_eq!(route, "/channels/{id}/messages/{id}/reactions/{emoji}/@me");
    }

    #[test]
    fn webhook_token_segment_is_collapsed() {
        let route = normalize_route("/webhooks/123456789012345678/some-secret-token");
        assert_eq!(route, "/webhooks/{id}/{token}");
    }

    #[test]
    fn short_numeric_segments_are_not_treated_as_ids() {
        let route = normalize_route("/guilds/123456789012345678/members/1");
        assert_eq!(route, "/guilds/{id}/members/1");
    }

    #[test]
    fn methods_are_distinct_routes() {
        let get = Path::new(Method::Get, "/gateway");
        let post = Path::new(Method::Post, "/gateway");

        assert_ne!(get, post);
    }
}
