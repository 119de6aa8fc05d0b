//! Gateway shard and shard-manager implementation for the Halcyon
//! ecosystem: maintains authenticated WebSocket sessions with the Service,
//! including handshake, heartbeat, session resumption, and close-code
//! sensitive reconnect, and fans dispatched events out to subscribers.
#![deny(
    clippy::all,
    clippy::missing_const_for_fn,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    unsafe_code,
    unused
)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
#[cfg(feature = "zlib")]
pub mod compression;
pub mod demux;
pub mod error;
pub mod heartbeat;
pub mod json;
pub mod latency;
pub mod manager;
pub mod message;
pub mod session;
pub mod shard;

pub use self::{
    client::Gateway,
    config::{Config, ConfigBuilder, ShardId},
    demux::{Event, EventCounts, EventTypeFlags, Listeners},
    error::{
        ManagerError, ManagerErrorType, ProcessError, ProcessErrorType, ReceiveMessageError,
        ReceiveMessageErrorType, SendError, SendErrorType, ShardInitializeError, ShardInitializeErrorType,
    },
    heartbeat::Heartbeater,
    latency::Latency,
    manager::ShardManager,
    message::{CloseFrame, Message},
    session::Session,
    shard::{Shard, ShardState},
};
