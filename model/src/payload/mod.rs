//! Outgoing command payloads sent by a shard.

mod heartbeat;
mod identify;
mod presence_update;
mod request_guild_members;
mod resume;
mod voice_state_update;

pub use self::{
    heartbeat::Heartbeat,
    identify::{Identify, IdentifyInfo, IdentifyProperties},
    presence_update::{Activity, ActivityType, Status, UpdatePresence},
    request_guild_members::RequestGuildMembers,
    resume::Resume,
    voice_state_update::UpdateVoiceState,
};

use crate::opcode::OpCode;
use serde::Serialize;

/// A command that a shard may send over the gateway.
///
/// Implementors pair their payload with the [`OpCode`] the Service expects it
/// to be framed under; [`OutgoingFrame`] is constructed from that pairing.
pub trait Command: Serialize {
    /// Opcode the payload must be sent with.
    const OP: OpCode;
}

/// A fully framed outgoing command, ready to be serialized as `{ op, d }`.
#[derive(Serialize)]
pub struct OutgoingFrame<'a, T: Command> {
    op: u8,
    d: &'a T,
}

impl<'a, T: Command> OutgoingFrame<'a, T> {
    /// Wrap a command in its frame envelope.
    #[must_use]
    pub const fn new(command: &'a T) -> Self {
        Self {
            op: T::OP as u8,
            d: command,
        }
    }
}
