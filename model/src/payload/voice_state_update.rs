use super::Command;
use crate::{id::GuildId, opcode::OpCode};
use serde::Serialize;

/// Join, move, or leave a voice channel, per [`OpCode::VoiceStateUpdate`].
#[derive(Clone, Debug, Serialize)]
pub struct UpdateVoiceState {
    guild_id: GuildId,
    channel_id: Option<u64>,
    self_mute: bool,
    self_deaf: bool,
}

impl UpdateVoiceState {
    /// Build a voice state update. A `channel_id` of `None` leaves the
    /// current channel.
    #[must_use]
    pub const fn new(guild_id: GuildId, channel_id: Option<u64>, self_mute: bool, self_deaf: bool) -> Self {
        Self {
            guild_id,
            channel_id,
            self_mute,
            self_deaf,
        }
    }
}

impl Command for UpdateVoiceState {
    const OP: OpCode = OpCode::VoiceStateUpdate;
}
