//! Gateway opcodes.

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Opcode of a [`Frame`] exchanged with the gateway.
///
/// [`Frame`]: crate::Frame
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, PartialEq, Serialize_repr)]
#[repr(u8)]
#[non_exhaustive]
pub enum OpCode {
    /// An event was dispatched.
    Dispatch = 0,
    /// Used for ping checking, in either direction.
    Heartbeat = 1,
    /// Start a new session.
    Identify = 2,
    /// Update the client's presence.
    PresenceUpdate = 3,
    /// Join/move/leave voice channels.
    VoiceStateUpdate = 4,
    /// Resume a previous session that was disconnected.
    Resume = 6,
    /// You should attempt to reconnect and resume immediately.
    Reconnect = 7,
    /// Request information about offline guild members in a large guild.
    RequestGuildMembers = 8,
    /// The session has been invalidated, and a new one must be started.
    InvalidSession = 9,
    /// Sent immediately after connecting, contains the heartbeat interval.
    Hello = 10,
    /// Sent in response to receiving a heartbeat to acknowledge it was
    /// received.
    HeartbeatAck = 11,
}

impl OpCode {
    /// Convert a raw opcode into an [`OpCode`], if it's a known opcode.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::PresenceUpdate),
            4 => Some(Self::VoiceStateUpdate),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            8 => Some(Self::RequestGuildMembers),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OpCode;

    #[test]
    fn from_u8_rejects_unknown_opcodes() {
        assert!(OpCode::from_u8(5).is_none());
        assert!(OpCode::from_u8(12).is_none());
    }

    #[test]
    fn from_u8_round_trips_known_opcodes() {
        assert_eq!(Some(OpCode::Hello), OpCode::from_u8(10));
        assert_eq!(Some(OpCode::HeartbeatAck), OpCode::from_u8(11));
    }
}
