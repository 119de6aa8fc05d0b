use crate::api_error::ApiError;
use hyper::StatusCode;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

pub type Result<T, E = Error> = StdResult<T, E>;

#[derive(Debug)]
pub struct Error {
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(crate) kind: ErrorType,
}

impl Error {
    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub fn kind(&self) -> &ErrorType {
        &self.kind
    }

    /// Consume the error, returning the source error if there is any.
    #[must_use = "consuming the error and retrieving the source has no effect if left unused"]
    pub fn into_source(self) -> Option<Box<dyn StdError + Send + Sync>> {
        self.source
    }

    /// Consume the error, returning the owned error type and the source error.
    #[must_use = "consuming the error into its parts has no effect if left unused"]
    pub fn into_parts(self) -> (ErrorType, Option<Box<dyn StdError + Send + Sync>>) {
        (self.kind, self.source)
    }

    pub(crate) fn new(kind: ErrorType, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind, source }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ErrorType::BuildingRequest => f.write_str("failed to build the request"),
            ErrorType::ChunkingResponse => f.write_str("chunking the response body failed"),
            ErrorType::CreatingHeader { name } => {
                write!(f, "parsing the value for header {name} failed")
            }
            ErrorType::Json => f.write_str("response body is not valid json"),
            ErrorType::Parsing { body } => {
                write!(f, "response body could not be deserialized: {body:?}")
            }
            ErrorType::RequestCanceled => {
                f.write_str("request was canceled before or while being sent")
            }
            ErrorType::RequestError => f.write_str("sending the request failed"),
            ErrorType::RequestTimedOut => f.write_str("request timed out"),
            ErrorType::Response { error, status } => {
                write!(f, "response error: status code {status}, error: {error}")
            }
            ErrorType::RetriesExhausted { status } => write!(
                f,
                "retryable response (status code {status}) failed after all retries",
            ),
            ErrorType::ServiceUnavailable => {
                f.write_str("service may be temporarily unavailable (received a 503)")
            }
            ErrorType::Unauthorized => {
                f.write_str("token in use is invalid, expired, or has been revoked")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

/// Type of [`Error`] that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorType {
    /// Building the outgoing request failed.
    BuildingRequest,
    /// Reading the response body failed.
    ChunkingResponse,
    /// A supplied header value could not be constructed.
    CreatingHeader {
        /// Name of the header.
        name: String,
    },
    /// The request or response body could not be serialized or deserialized
    /// as JSON.
    Json,
    /// Response body could not be deserialized into the expected type.
    Parsing {
        /// Raw response body.
        body: Vec<u8>,
    },
    /// The ticket was dropped before a response headers could be recorded.
    RequestCanceled,
    /// The underlying HTTP client failed to send the request.
    RequestError,
    /// The request exceeded its deadline.
    RequestTimedOut,
    /// The Service returned a structured, permanent failure.
    Response {
        /// Structured error body.
        error: ApiError,
        /// HTTP status code of the response.
        status: StatusCode,
    },
    /// A retryable response (429 or 5xx) kept failing until `retries` was
    /// exhausted.
    RetriesExhausted {
        /// HTTP status code of the final response.
        status: StatusCode,
    },
    /// Service may be temporarily unavailable (503).
    ServiceUnavailable,
    /// Token in use has become invalid; recreate the client with a new one.
    Unauthorized,
}

pub(crate) fn source<E>(kind: ErrorType, source: E) -> Error
where
    E: StdError + Send + Sync + 'static,
{
    Error::new(kind, Some(Box::new(source)))
}

pub(crate) fn simple(kind: ErrorType) -> Error {
    Error::new(kind, None)
}
