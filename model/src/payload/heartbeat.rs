use super::Command;
use crate::opcode::OpCode;
use serde::Serialize;

/// A heartbeat, per [`OpCode::Heartbeat`].
///
/// `d` is the last sequence number the shard received, or `null` if none has
/// been received yet.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct Heartbeat(Option<u64>);

impl Heartbeat {
    /// Build a heartbeat carrying the given last-seen sequence.
    #[must_use]
    pub const fn new(sequence: Option<u64>) -> Self {
        Self(sequence)
    }
}

impl Command for Heartbeat {
    const OP: OpCode = OpCode::Heartbeat;
}
