//! Shard identity and connection configuration.

use halcyon_gateway_queue::{LocalQueue, Queue};
use halcyon_model::{
    payload::{IdentifyProperties, UpdatePresence},
    Intents,
};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

/// Default large-guild member threshold.
pub const DEFAULT_LARGE_THRESHOLD: u64 = 50;
/// Default delay between successive shard spawns.
pub const DEFAULT_SPAWN_DELAY: Duration = Duration::from_secs(5);
/// Default per-shard deadline to reach `ready` after connecting.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default bound on reconnect attempts before a shard gives up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u8 = 5;

/// Identifier of one shard within a total shard count.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ShardId {
    current: u64,
    total: u64,
}

impl ShardId {
    /// The only shard, out of a total of one.
    pub const ONE: Self = Self { current: 0, total: 1 };

    /// Create a shard id, panicking if `current >= total` or `total == 0`.
    ///
    /// # Panics
    ///
    /// Panics per the above.
    #[must_use]
    pub const fn new(current: u64, total: u64) -> Self {
        assert!(total > 0, "total shard count must be non-zero");
        assert!(current < total, "current shard id must be less than the total");

        Self { current, total }
    }

    /// This shard's index.
    #[must_use]
    pub const fn current(self) -> u64 {
        self.current
    }

    /// Total number of shards this shard is one of.
    #[must_use]
    pub const fn total(self) -> u64 {
        self.total
    }

    /// The `[id, total]` pair as sent in the identify/resume payload and to
    /// the connection [`Queue`].
    #[must_use]
    pub const fn as_pair(self) -> [u64; 2] {
        [self.current, self.total]
    }
}

impl Display for ShardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "shard {}/{}", self.current, self.total)
    }
}

/// Configuration shared by every [`Shard`](crate::Shard) spawned from it.
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) token: String,
    pub(crate) intents: Intents,
    pub(crate) large_threshold: u64,
    pub(crate) presence: Option<UpdatePresence>,
    pub(crate) queue: Arc<dyn Queue>,
    pub(crate) spawn_delay: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) max_reconnect_attempts: u8,
}

impl Config {
    /// Start building a configuration with non-default options.
    #[must_use]
    pub fn builder(token: String, intents: Intents) -> ConfigBuilder {
        ConfigBuilder::new(token, intents)
    }

    /// Create a configuration with default options.
    #[must_use]
    pub fn new(token: String, intents: Intents) -> Self {
        Self::builder(token, intents).build()
    }

    /// Credential used to identify with the Service.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Intents requested when identifying.
    #[must_use]
    pub const fn intents(&self) -> Intents {
        self.intents
    }
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    fn new(mut token: String, intents: Intents) -> Self {
        if !token.starts_with("Bot ") {
            token.insert_str(0, "Bot ");
        }

        Self(Config {
            token,
            intents,
            large_threshold: DEFAULT_LARGE_THRESHOLD,
            presence: None,
            queue: Arc::new(LocalQueue::new()),
            spawn_delay: DEFAULT_SPAWN_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        })
    }

    /// Consume the builder, returning the completed [`Config`].
    #[must_use]
    pub fn build(self) -> Config {
        self.0
    }

    /// Number of members a guild must have before the Service stops sending
    /// full member lists in `GUILD_CREATE`. Must be in `50..=250`.
    ///
    /// # Panics
    ///
    /// Panics if `large_threshold` is outside `50..=250`.
    #[must_use]
    pub fn large_threshold(mut self, large_threshold: u64) -> Self {
        assert!(
            (50..=250).contains(&large_threshold),
            "large_threshold must be between 50 and 250",
        );

        self.0.large_threshold = large_threshold;
        self
    }

    /// Initial presence sent in the identify payload.
    #[must_use]
    pub fn presence(mut self, presence: UpdatePresence) -> Self {
        self.0.presence = Some(presence);
        self
    }

    /// Queue used to ratelimit session establishment across shards.
    #[must_use]
    pub fn queue(mut self, queue: Arc<dyn Queue>) -> Self {
        self.0.queue = queue;
        self
    }

    /// Delay the shard manager waits between successive shard spawns.
    #[must_use]
    pub const fn spawn_delay(mut self, spawn_delay: Duration) -> Self {
        self.0.spawn_delay = spawn_delay;
        self
    }

    /// Deadline for a shard to reach `ready` after connecting.
    #[must_use]
    pub const fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.0.connect_timeout = connect_timeout;
        self
    }

    /// Bound on reconnect attempts before a shard gives up.
    #[must_use]
    pub const fn max_reconnect_attempts(mut self, max_reconnect_attempts: u8) -> Self {
        self.0.max_reconnect_attempts = max_reconnect_attempts;
        self
    }
}

/// Default `os`/`browser`/`device` properties sent in the identify payload.
#[must_use]
pub fn default_identify_properties() -> IdentifyProperties {
    IdentifyProperties::new(std::env::consts::OS, "halcyon", "halcyon")
}

#[cfg(test)]
mod tests {
    use super::{Config, ShardId};
    use halcyon_model::Intents;
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(Config: Clone, Debug, Send, Sync);
    assert_impl_all!(ShardId: Clone, Copy, Debug, Eq, PartialEq, Send, Sync);

    #[test]
    fn shard_id_displays_as_current_over_total() {
        let id = ShardId::new(1, 4);
        assert_eq!("shard 1/4", id.to_string());
        assert_eq!([1, 4], id.as_pair());
    }

    #[test]
    #[should_panic(expected = "less than the total")]
    fn shard_id_rejects_out_of_range_current() {
        let _ = ShardId::new(4, 4);
    }

    #[tokio::test]
    async fn builder_prefixes_bare_tokens_with_bot() {
        let config = Config::new("abc123".to_owned(), Intents::GUILDS);
        assert_eq!("Bot abc123", config.token());
    }

    #[tokio::test]
    #[should_panic(expected = "between 50 and 250")]
    async fn builder_rejects_out_of_range_large_threshold() {
        let _ = Config::builder("abc".to_owned(), Intents::GUILDS).large_threshold(1);
    }
}
