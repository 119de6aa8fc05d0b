use super::Command;
use crate::{id::GuildId, opcode::OpCode};
use serde::Serialize;

/// Request offline guild members, per [`OpCode::RequestGuildMembers`].
#[derive(Clone, Debug, Serialize)]
pub struct RequestGuildMembers {
    guild_id: GuildId,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_ids: Option<Vec<u64>>,
}

impl RequestGuildMembers {
    /// Request members whose username starts with `query`, up to `limit`
    /// results (`limit = 0` means no cap).
    #[must_use]
    pub fn by_query(guild_id: GuildId, query: impl Into<String>, limit: u64) -> Self {
        Self {
            guild_id,
            query: Some(query.into()),
            limit: Some(limit),
            user_ids: None,
        }
    }

    /// Request specific members by id.
    #[must_use]
    pub const fn by_ids(guild_id: GuildId, user_ids: Vec<u64>) -> Self {
        Self {
            guild_id,
            query: None,
            limit: None,
            user_ids: Some(user_ids),
        }
    }
}

impl Command for RequestGuildMembers {
    const OP: OpCode = OpCode::RequestGuildMembers;
}
