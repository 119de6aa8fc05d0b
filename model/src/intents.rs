//! Bitfield telling the Service which event categories to dispatch.

use bitflags::bitflags;
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
};

bitflags! {
    /// Intents requested when identifying with the gateway.
    ///
    /// The Service will only dispatch events belonging to a category for
    /// which the corresponding intent bit was set at identify time.
    pub struct Intents: u64 {
        const GUILDS = 1;
        const GUILD_MEMBERS = 1 << 1;
        const GUILD_BANS = 1 << 2;
        const GUILD_EMOJIS_AND_STICKERS = 1 << 3;
        const GUILD_INTEGRATIONS = 1 << 4;
        const GUILD_WEBHOOKS = 1 << 5;
        const GUILD_INVITES = 1 << 6;
        const GUILD_VOICE_STATES = 1 << 7;
        const GUILD_PRESENCES = 1 << 8;
        const GUILD_MESSAGES = 1 << 9;
        const GUILD_MESSAGE_REACTIONS = 1 << 10;
        const GUILD_MESSAGE_TYPING = 1 << 11;
        const DIRECT_MESSAGES = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS = 1 << 13;
        const DIRECT_MESSAGE_TYPING = 1 << 14;
        const MESSAGE_CONTENT = 1 << 15;
        const GUILD_SCHEDULED_EVENTS = 1 << 16;

        /// Privileged intents that must be manually enabled in the Service's
        /// developer portal: [`GUILD_MEMBERS`], [`GUILD_PRESENCES`], and
        /// [`MESSAGE_CONTENT`].
        ///
        /// [`GUILD_MEMBERS`]: Self::GUILD_MEMBERS
        /// [`GUILD_PRESENCES`]: Self::GUILD_PRESENCES
        /// [`MESSAGE_CONTENT`]: Self::MESSAGE_CONTENT
        const PRIVILEGED = Self::GUILD_MEMBERS.bits | Self::GUILD_PRESENCES.bits | Self::MESSAGE_CONTENT.bits;
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bits_truncate(u64::deserialize(deserializer)?))
    }
}

impl Serialize for Intents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::Intents;

    #[test]
    fn privileged_combines_the_three_gated_intents() {
        let privileged = Intents::GUILD_MEMBERS | Intents::GUILD_PRESENCES | Intents::MESSAGE_CONTENT;

        assert_eq!(privileged, Intents::PRIVILEGED);
    }

    #[test]
    fn round_trips_through_json() {
        let intents = Intents::GUILDS | Intents::GUILD_MESSAGES;
        let json = serde_json::to_string(&intents).unwrap();
        let back: Intents = serde_json::from_str(&json).unwrap();

        assert_eq!(intents, back);
    }
}
