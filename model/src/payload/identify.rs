use super::{presence_update::UpdatePresence, Command};
use crate::{intents::Intents, opcode::OpCode};
use serde::Serialize;

/// Properties identifying the client to the Service, shown in the
/// [Service's documentation] as part of the identify payload.
///
/// [Service's documentation]: https://discord.com/developers/docs/topics/gateway#identify-identify-connection-properties
#[derive(Clone, Debug, Serialize)]
pub struct IdentifyProperties {
    os: String,
    browser: String,
    device: String,
}

impl IdentifyProperties {
    /// Create new identify properties.
    #[must_use]
    pub fn new(os: impl Into<String>, browser: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            browser: browser.into(),
            device: device.into(),
        }
    }
}

/// Inputs to [`Identify::new`].
#[derive(Clone, Debug)]
pub struct IdentifyInfo {
    pub token: String,
    pub intents: Intents,
    pub shard: [u64; 2],
    pub large_threshold: u64,
    pub presence: Option<UpdatePresence>,
    pub properties: IdentifyProperties,
}

/// Start a new session, per [`OpCode::Identify`].
#[derive(Clone, Debug, Serialize)]
pub struct Identify {
    token: String,
    intents: Intents,
    shard: [u64; 2],
    large_threshold: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence: Option<UpdatePresence>,
    properties: IdentifyProperties,
}

impl Identify {
    /// Build an identify payload from its component fields.
    #[must_use]
    pub fn new(info: IdentifyInfo) -> Self {
        Self {
            token: info.token,
            intents: info.intents,
            shard: info.shard,
            large_threshold: info.large_threshold,
            presence: info.presence,
            properties: info.properties,
        }
    }
}

impl Command for Identify {
    const OP: OpCode = OpCode::Identify;
}

#[cfg(test)]
mod tests {
    use super::{Identify, IdentifyInfo, IdentifyProperties};
    use crate::intents::Intents;

    #[test]
    fn serializes_shard_as_a_pair() {
        let identify = Identify::new(IdentifyInfo {
            token: "Bot abc".into(),
            intents: Intents::GUILDS,
            shard: [1, 4],
            large_threshold: 50,
            presence: None,
            properties: IdentifyProperties::new("linux", "halcyon", "halcyon"),
        });

        let json = serde_json::to_value(&identify).unwrap();
        assert_eq!(json["shard"], serde_json::json!([1, 4]));
        assert!(json.get("presence").is_none());
    }
}
