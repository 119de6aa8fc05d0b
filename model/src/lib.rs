//! Wire types shared between the REST and gateway halves of the Halcyon
//! ecosystem: intents, opcodes, close codes, and the payloads exchanged over
//! the gateway WebSocket.
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

pub mod close_code;
pub mod frame;
pub mod gateway_info;
pub mod id;
pub mod intents;
pub mod opcode;
pub mod payload;

pub use self::{
    close_code::CloseCode,
    frame::Frame,
    gateway_info::{GatewayInfo, SessionStartLimit},
    id::{ChannelId, GuildId, Id},
    intents::Intents,
    opcode::OpCode,
};
