//! Façade combining the shard manager and event demultiplexer into the
//! single entry point collaborators use.

use crate::{
    config::Config,
    demux::{Event, EventTypeFlags},
    error::{ManagerError, SendError, SendErrorType},
    manager::ShardManager,
    message::Message,
};
use halcyon_http::Client as RestClient;
use halcyon_model::{
    id::GuildId,
    payload::{Command, OutgoingFrame, RequestGuildMembers, UpdatePresence, UpdateVoiceState},
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Entry point for running and interacting with a bot's gateway
/// connections.
///
/// Wraps a [`ShardManager`]; cheap to clone, since the manager itself is.
#[derive(Clone)]
pub struct Gateway {
    manager: ShardManager,
}

impl Gateway {
    /// Connect every shard needed for this bot, per [`ShardManager::connect`].
    ///
    /// # Errors
    ///
    /// Refer to [`ShardManager::connect`].
    pub async fn connect(http: &RestClient, config: Config, shard_count: Option<u64>) -> Result<Self, ManagerError> {
        let manager = ShardManager::connect(http, config, shard_count).await?;

        Ok(Self { manager })
    }

    /// Subscribe to dispatched events matching `events`.
    #[must_use]
    pub fn events(&self, events: EventTypeFlags) -> UnboundedReceiver<Event> {
        self.manager.subscribe(events)
    }

    /// Disconnect every shard, ending their receive tasks.
    pub async fn disconnect(&self) {
        self.manager.shutdown().await;
    }

    /// Send a raw payload to every ready shard, returning the number sent
    /// to.
    pub async fn broadcast(&self, message: Message) -> usize {
        self.manager.broadcast(message).await
    }

    /// Send a raw payload to a specific shard.
    ///
    /// # Errors
    ///
    /// Returns an error if no shard with `id` is managed.
    pub async fn send_to_shard(&self, id: u64, message: Message) -> Result<(), ManagerError> {
        self.manager.send_to_shard(id, message).await
    }

    /// Update the presence shown for every shard.
    ///
    /// # Errors
    ///
    /// Returns [`SendErrorType::Serializing`] if `presence` fails to
    /// serialize.
    pub async fn update_presence(&self, presence: UpdatePresence) -> Result<(), SendError> {
        let message = command_message(&presence)?;
        self.manager.broadcast(message).await;
        Ok(())
    }

    /// Join, move within, or leave a voice channel, sent to the shard that
    /// owns `guild_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SendErrorType::Serializing`] if the payload fails to
    /// serialize, or a manager error if the owning shard isn't managed.
    pub async fn update_voice_state(
        &self,
        total_shards: u64,
        update: UpdateVoiceState,
        guild_id: GuildId,
    ) -> Result<(), SendError> {
        let message = command_message(&update)?;
        let shard_id = shard_id_for_guild(guild_id, total_shards);

        self.manager
            .send_to_shard(shard_id, message)
            .await
            .map_err(|source| SendError::new(SendErrorType::Sending, Some(Box::new(source))))
    }

    /// Request offline guild members, sent to the shard that owns
    /// `guild_id`.
    ///
    /// # Errors
    ///
    /// Refer to [`Gateway::update_voice_state`].
    pub async fn request_guild_members(
        &self,
        total_shards: u64,
        request: RequestGuildMembers,
        guild_id: GuildId,
    ) -> Result<(), SendError> {
        let message = command_message(&request)?;
        let shard_id = shard_id_for_guild(guild_id, total_shards);

        self.manager
            .send_to_shard(shard_id, message)
            .await
            .map_err(|source| SendError::new(SendErrorType::Sending, Some(Box::new(source))))
    }
}

/// Shard owning a guild's voice/member-list traffic: `(guild_id >> 22) %
/// total_shards`, per the Service's sharding formula.
#[must_use]
fn shard_id_for_guild(guild_id: GuildId, total_shards: u64) -> u64 {
    (guild_id.get() >> 22) % total_shards.max(1)
}

fn command_message(command: &impl Command) -> Result<Message, SendError> {
    let frame = OutgoingFrame::new(command);
    let json = serde_json::to_vec(&frame)
        .map_err(|source| SendError::new(SendErrorType::Serializing, Some(Box::new(source))))?;

    Ok(Message::Binary(json))
}
