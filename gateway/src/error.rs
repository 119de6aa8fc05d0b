//! Error types returned by this crate's fallible operations.

use halcyon_model::CloseCode;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// A shard failed to establish its initial connection.
#[derive(Debug)]
pub struct ShardInitializeError {
    pub(crate) kind: ShardInitializeErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ShardInitializeError {
    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub const fn kind(&self) -> &ShardInitializeErrorType {
        &self.kind
    }

    pub(crate) fn new(
        kind: ShardInitializeErrorType,
        source: Option<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self { kind, source }
    }
}

impl Display for ShardInitializeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ShardInitializeErrorType::Establishing => {
                f.write_str("failed to establish a connection with the gateway")
            }
            ShardInitializeErrorType::UrlInvalid { url } => {
                write!(f, "gateway url is invalid: {url}")
            }
        }
    }
}

impl StdError for ShardInitializeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

/// Type of [`ShardInitializeError`] that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ShardInitializeErrorType {
    /// The TCP/TLS/Websocket handshake failed.
    Establishing,
    /// The gateway url could not be parsed.
    UrlInvalid {
        /// The invalid url.
        url: String,
    },
}

/// A command could not be sent to a shard.
#[derive(Debug)]
pub struct SendError {
    pub(crate) kind: SendErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl SendError {
    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub const fn kind(&self) -> &SendErrorType {
        &self.kind
    }

    pub(crate) fn new(kind: SendErrorType, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind, source }
    }
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            SendErrorType::Sending => f.write_str("message could not be sent over the websocket"),
            SendErrorType::Serializing => f.write_str("command failed to serialize"),
        }
    }
}

impl StdError for SendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

/// Type of [`SendError`] that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum SendErrorType {
    /// The message could not be sent over the websocket.
    Sending,
    /// The command failed to serialize to JSON.
    Serializing,
}

/// A frame could not be processed by the shard.
#[derive(Debug)]
pub struct ProcessError {
    pub(crate) kind: ProcessErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ProcessError {
    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub const fn kind(&self) -> &ProcessErrorType {
        &self.kind
    }

    pub(crate) fn new(kind: ProcessErrorType, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind, source }
    }
}

impl Display for ProcessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ProcessErrorType::Compression => f.write_str("frame could not be decompressed"),
            ProcessErrorType::Deserializing => f.write_str("frame is not valid json"),
            ProcessErrorType::ParsingPayload => f.write_str("frame envelope is malformed"),
            ProcessErrorType::SendingMessage => f.write_str("reply could not be sent"),
        }
    }
}

impl StdError for ProcessError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

/// Type of [`ProcessError`] that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ProcessErrorType {
    /// Decompressing an inbound frame failed.
    Compression,
    /// The inbound frame was not valid JSON.
    Deserializing,
    /// The inbound frame's envelope (`op`/`d`/`s`/`t`) was malformed.
    ParsingPayload,
    /// A reply triggered by processing the frame (e.g. a heartbeat ack)
    /// could not be sent.
    SendingMessage,
}

/// Receiving the next message from a shard's connection failed.
#[derive(Debug)]
pub struct ReceiveMessageError {
    pub(crate) kind: ReceiveMessageErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ReceiveMessageError {
    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub const fn kind(&self) -> &ReceiveMessageErrorType {
        &self.kind
    }

    pub(crate) fn new(
        kind: ReceiveMessageErrorType,
        source: Option<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self { kind, source }
    }

    /// Whether the error indicates the shard must not reconnect.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ReceiveMessageErrorType::FatallyClosed { .. }
        )
    }
}

impl Display for ReceiveMessageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ReceiveMessageErrorType::Client => f.write_str("websocket client error"),
            ReceiveMessageErrorType::Decompressing => f.write_str("frame could not be decompressed"),
            ReceiveMessageErrorType::Deserializing => f.write_str("frame is not valid json"),
            ReceiveMessageErrorType::FatallyClosed { close_code } => write!(
                f,
                "gateway closed the connection with a fatal close code: {close_code}",
            ),
            ReceiveMessageErrorType::Process => f.write_str("processing the frame failed"),
            ReceiveMessageErrorType::Reconnect => f.write_str("reconnect attempts were exhausted"),
            ReceiveMessageErrorType::SendingMessage => f.write_str("message could not be sent"),
        }
    }
}

impl StdError for ReceiveMessageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

/// Type of [`ReceiveMessageError`] that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ReceiveMessageErrorType {
    /// The underlying websocket client returned an error.
    Client,
    /// An inbound compressed frame could not be decompressed.
    Decompressing,
    /// An inbound frame was not valid JSON.
    Deserializing,
    /// The gateway closed the connection with a close code that indicates
    /// permanent misconfiguration; the shard will not reconnect.
    FatallyClosed {
        /// The close code the gateway sent.
        close_code: CloseCode,
    },
    /// Processing the frame through the state machine failed.
    Process,
    /// Reconnect attempts were exhausted.
    Reconnect,
    /// A message could not be sent over the websocket.
    SendingMessage,
}

/// An operation on the shard manager failed.
#[derive(Debug)]
pub struct ManagerError {
    pub(crate) kind: ManagerErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ManagerError {
    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub const fn kind(&self) -> &ManagerErrorType {
        &self.kind
    }

    pub(crate) fn new(kind: ManagerErrorType, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind, source }
    }
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ManagerErrorType::RetrievingGatewayInfo => {
                f.write_str("fetching gateway info from the Service failed")
            }
            ManagerErrorType::ShardNonexistent { id } => {
                write!(f, "no shard with id {id} is managed by this manager")
            }
            ManagerErrorType::ShardTimedOut { id } => {
                write!(f, "shard {id} did not become ready before its connect timeout")
            }
        }
    }
}

impl StdError for ManagerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

/// Type of [`ManagerError`] that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ManagerErrorType {
    /// Fetching `GET /gateway/bot` failed.
    RetrievingGatewayInfo,
    /// A command was addressed to a shard id the manager doesn't own.
    ShardNonexistent {
        /// The nonexistent shard's id.
        id: u64,
    },
    /// A shard did not become ready before its connect timeout elapsed.
    ShardTimedOut {
        /// The shard's id.
        id: u64,
    },
}
