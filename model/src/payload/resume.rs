use super::Command;
use crate::opcode::OpCode;
use serde::Serialize;

/// Reattach to an existing session, per [`OpCode::Resume`].
#[derive(Clone, Debug, Serialize)]
pub struct Resume {
    token: String,
    session_id: String,
    seq: u64,
}

impl Resume {
    /// Build a resume payload from the session to reattach to.
    #[must_use]
    pub fn new(token: impl Into<String>, session_id: impl Into<String>, seq: u64) -> Self {
        Self {
            token: token.into(),
            session_id: session_id.into(),
            seq,
        }
    }
}

impl Command for Resume {
    const OP: OpCode = OpCode::Resume;
}
