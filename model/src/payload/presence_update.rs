use super::Command;
use crate::opcode::OpCode;
use serde_repr::Serialize_repr;
use serde::Serialize;

/// Online status shown for the bot's presence.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Online,
    Dnd,
    Idle,
    Invisible,
    Offline,
}

/// Type of an [`Activity`].
#[derive(Clone, Copy, Debug, Serialize_repr)]
#[repr(u8)]
pub enum ActivityType {
    Playing = 0,
    Streaming = 1,
    Listening = 2,
    Watching = 3,
    Competing = 5,
}

/// A minimal activity shown in the bot's presence.
#[derive(Clone, Debug, Serialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Update the client's presence, per [`OpCode::PresenceUpdate`].
#[derive(Clone, Debug, Serialize)]
pub struct UpdatePresence {
    since: Option<u64>,
    activities: Vec<Activity>,
    status: Status,
    afk: bool,
}

impl UpdatePresence {
    /// Build a presence update.
    #[must_use]
    pub const fn new(activities: Vec<Activity>, afk: bool, since: Option<u64>, status: Status) -> Self {
        Self {
            since,
            activities,
            status,
            afk,
        }
    }
}

impl Command for UpdatePresence {
    const OP: OpCode = OpCode::PresenceUpdate;
}
