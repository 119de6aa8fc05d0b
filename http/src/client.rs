use crate::{
    api_error::ApiError,
    classify::{classify, Classification},
    error::{self, ErrorType, Result},
    request::Request,
};
use bytes::{Buf, Bytes};
use halcyon_http_ratelimiting::{headers::RatelimitHeaders, InMemoryRatelimiter, Ratelimiter};
use hyper::{
    body::{self, Body},
    client::{Client as HyperClient, HttpConnector},
    header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT},
    Request as HyperRequest, Response, StatusCode,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[cfg(feature = "rustls-native-roots")]
type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;
#[cfg(not(feature = "rustls-native-roots"))]
type HttpsConnector = HttpConnector;

const API_VERSION: u8 = 10;
const USER_AGENT_VALUE: &str = concat!(
    "HalcyonBot (https://halcyon.rs/, ",
    env!("CARGO_PKG_VERSION"),
    ")",
);

/// Maximum number of attempts the REST engine makes for a single request,
/// not counting the original attempt.
const DEFAULT_RETRIES: u8 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Bind a request to its bucket, execute it through the bucket's queue,
/// learn the canonical bucket id from the response, and return a classified
/// result to the caller.
///
/// Two requests that resolve to the same bucket are serialized in
/// submission order ([`Ratelimiter`]/[`InMemoryRatelimiter`] hold that
/// invariant); this type adds retries on top: 429s are retried once the
/// bucket's pause expires, and transport failures or 5xx responses are
/// retried with exponential backoff, both bounded by `retries`.
#[derive(Debug)]
pub struct Client {
    http: HyperClient<HttpsConnector, Body>,
    ratelimiter: InMemoryRatelimiter,
    token: Option<Box<str>>,
    host: Box<str>,
    use_http: bool,
    retries: u8,
    timeout: Duration,
}

impl Client {
    /// Create a client authenticated with `token`.
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::builder(token).build()
    }

    /// Start building a client with non-default options.
    #[must_use]
    pub fn builder(token: String) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    /// Execute a request, chunking and deserializing the response body.
    pub async fn request<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let bytes = self.request_bytes(request).await?;

        serde_json::from_slice(&bytes).map_err(|source| {
            error::source(
                ErrorType::Parsing {
                    body: bytes.to_vec(),
                },
                source,
            )
        })
    }

    /// Execute a request, checking only that the response was a success.
    pub async fn verify(&self, request: Request) -> Result<()> {
        self.request_bytes(request).await.map(|_| ())
    }

    /// Execute a request, returning the raw response body on success.
    pub async fn request_bytes(&self, request: Request) -> Result<Bytes> {
        let bucket = request.bucket_path();
        let deadline = request.deadline;

        let mut attempt = 0u8;

        loop {
            let ticket = self
                .ratelimiter
                .wait_for_ticket(bucket.clone())
                .await
                .map_err(|source| error::Error::new(ErrorType::RequestCanceled, Some(source)))?;

            let remaining = deadline.saturating_duration_since(std::time::Instant::now());

            let resp = timeout(remaining.min(self.timeout), self.execute(&request))
                .await
                .map_err(|_| error::simple(ErrorType::RequestTimedOut))?;

            let resp = match resp {
                Ok(resp) => resp,
                Err(source) => {
                    let _ = ticket.headers(None);

                    if self.retry_or_fail(&mut attempt).await {
                        continue;
                    }

                    return Err(source);
                }
            };

            let status = resp.status();
            let headers = ratelimit_headers(&resp);
            let _ = ticket.headers(headers);

            if status == StatusCode::UNAUTHORIZED {
                return Err(error::simple(ErrorType::Unauthorized));
            }

            match classify(status) {
                Classification::Success => {
                    return body_bytes(resp).await;
                }
                Classification::RateLimited => {
                    if self.retry_or_fail_status(&mut attempt, status).await? {
                        continue;
                    }
                    return Err(error::simple(ErrorType::RetriesExhausted { status }));
                }
                Classification::Retryable => {
                    if status == StatusCode::SERVICE_UNAVAILABLE {
                        tracing_warn_unavailable();
                    }
                    if self.retry_or_fail_status(&mut attempt, status).await? {
                        continue;
                    }
                    return Err(error::simple(ErrorType::RetriesExhausted { status }));
                }
                Classification::Permanent => {
                    let body = body_bytes(resp).await?;
                    let api_error: ApiError = serde_json::from_slice(&body).map_err(|source| {
                        error::source(
                            ErrorType::Parsing {
                                body: body.to_vec(),
                            },
                            source,
                        )
                    })?;

                    return Err(error::simple(ErrorType::Response {
                        error: api_error,
                        status,
                    }));
                }
            }
        }
    }

    /// Issue a batch of requests concurrently; ordering of the returned
    /// results matches the order `requests` was given in.
    pub async fn batch<T: DeserializeOwned>(&self, requests: Vec<Request>) -> Vec<Result<T>> {
        let futures = requests.into_iter().map(|request| self.request(request));

        futures_util::future::join_all(futures).await
    }

    async fn execute(&self, request: &Request) -> Result<Response<Body>> {
        let protocol = if self.use_http { "http" } else { "https" };
        let mut url = format!(
            "{protocol}://{}/api/v{API_VERSION}{}",
            self.host, request.path,
        );

        if !request.query.is_empty() {
            url.push('?');

            for (index, (name, value)) in request.query.iter().enumerate() {
                if index > 0 {
                    url.push('&');
                }

                url.push_str(&utf8_percent_encode(name, NON_ALPHANUMERIC).to_string());
                url.push('=');
                url.push_str(&utf8_percent_encode(value, NON_ALPHANUMERIC).to_string());
            }
        }

        let mut builder = HyperRequest::builder()
            .method(request.method.name())
            .uri(url);

        if let Some(headers) = builder.headers_mut() {
            if let Some(token) = &self.token {
                let value = HeaderValue::from_str(token).map_err(|source| {
                    error::source(
                        ErrorType::CreatingHeader {
                            name: AUTHORIZATION.to_string(),
                        },
                        source,
                    )
                })?;
                headers.insert(AUTHORIZATION, value);
            }

            headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

            if let Some(body) = &request.body {
                headers.insert(CONTENT_LENGTH, body.len().into());
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }

            if let Some(reason) = &request.reason {
                if let Ok(value) = HeaderValue::from_str(reason) {
                    headers.insert("x-audit-log-reason", value);
                }
            }

            for (name, value) in &request.headers {
                headers.insert(name, value.clone());
            }
        }

        let body = request
            .body
            .clone()
            .map_or_else(Body::empty, Body::from);

        let hyper_request = builder
            .body(body)
            .map_err(|source| error::source(ErrorType::BuildingRequest, source))?;

        self.http
            .request(hyper_request)
            .await
            .map_err(|source| error::source(ErrorType::RequestError, source))
    }

    /// Record a retry attempt for a transport failure, sleeping with
    /// exponential backoff before signalling the caller to retry.
    async fn retry_or_fail(&self, attempt: &mut u8) -> bool {
        if *attempt >= self.retries {
            return false;
        }

        backoff(*attempt).await;
        *attempt += 1;

        true
    }

    /// Record a retry attempt for a rate-limited or retryable response.
    ///
    /// Returns `true` if the caller should retry.
    async fn retry_or_fail_status(&self, attempt: &mut u8, status: StatusCode) -> Result<bool> {
        if *attempt >= self.retries {
            return Ok(false);
        }

        // A 429 is already paced by the bucket installing a cooldown; only
        // 5xx responses need an explicit backoff sleep here.
        if status.is_server_error() {
            backoff(*attempt).await;
        }

        *attempt += 1;

        Ok(true)
    }
}

async fn backoff(attempt: u8) {
    let delay = BACKOFF_BASE
        .saturating_mul(1u32.wrapping_shl(u32::from(attempt)))
        .min(BACKOFF_CAP);

    sleep(delay).await;
}

async fn body_bytes(resp: Response<Body>) -> Result<Bytes> {
    let mut buf = body::aggregate(resp.into_body())
        .await
        .map_err(|source| error::source(ErrorType::ChunkingResponse, source))?;

    Ok(buf.copy_to_bytes(buf.remaining()))
}

fn ratelimit_headers(resp: &Response<Body>) -> Option<RatelimitHeaders> {
    let pairs = resp
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_bytes()));

    match RatelimitHeaders::from_pairs(pairs) {
        Ok(headers) => Some(headers),
        Err(_) => None,
    }
}

fn tracing_warn_unavailable() {
    #[cfg(feature = "tracing")]
    tracing::warn!("service unavailable (503)");
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    token: String,
    proxy: Option<String>,
    use_http: bool,
    retries: u8,
    timeout: Duration,
}

impl ClientBuilder {
    fn new(mut token: String) -> Self {
        if !token.starts_with("Bot ") && !token.starts_with("Bearer ") {
            token.insert_str(0, "Bot ");
        }

        Self {
            token,
            proxy: None,
            use_http: false,
            retries: DEFAULT_RETRIES,
            timeout: Duration::from_secs(10),
        }
    }

    /// Route requests through a proxy host instead of the Service directly.
    #[must_use]
    pub fn proxy(mut self, host: String, use_http: bool) -> Self {
        self.proxy = Some(host);
        self.use_http = use_http;
        self
    }

    /// Maximum number of retries for a retryable or rate-limited response.
    #[must_use]
    pub const fn retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Per-request timeout, the default is 10 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the [`Client`].
    #[must_use]
    pub fn build(self) -> Client {
        #[cfg(feature = "rustls-native-roots")]
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        #[cfg(not(feature = "rustls-native-roots"))]
        let connector = HttpConnector::new();

        let http = HyperClient::builder().build(connector);

        Client {
            http,
            ratelimiter: InMemoryRatelimiter::new(),
            token: Some(self.token.into_boxed_str()),
            host: self
                .proxy
                .unwrap_or_else(|| "discord.com".to_owned())
                .into_boxed_str(),
            use_http: self.use_http,
            retries: self.retries,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Client;
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(Client: Debug, Send, Sync);

    #[test]
    fn builder_prefixes_bare_tokens_with_bot() {
        let client = Client::builder("abc123".to_owned()).build();
        assert_eq!(client.token.as_deref(), Some("Bot abc123"));
    }

    #[test]
    fn builder_leaves_bearer_tokens_untouched() {
        let client = Client::builder("Bearer abc123".to_owned()).build();
        assert_eq!(client.token.as_deref(), Some("Bearer abc123"));
    }
}
