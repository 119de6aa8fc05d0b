//! Service-published gateway connection info, fetched by the shard manager
//! before spawning any shards.

use serde::{Deserialize, Serialize};

/// Response body of `GET /gateway/bot`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GatewayInfo {
    /// Websocket url to connect to.
    pub url: String,
    /// Recommended number of shards to use when connecting.
    pub shards: u32,
    /// Information about the current session start limit.
    pub session_start_limit: SessionStartLimit,
}

/// Session start limit published alongside [`GatewayInfo`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SessionStartLimit {
    /// Total number of session starts allowed per reset window.
    pub total: u32,
    /// Remaining number of session starts allowed per reset window.
    pub remaining: u32,
    /// Milliseconds until the limit resets.
    pub reset_after: u64,
    /// Number of shards allowed to identify concurrently.
    pub max_concurrency: u32,
}

#[cfg(test)]
mod tests {
    use super::{GatewayInfo, SessionStartLimit};

    #[test]
    fn deserializes_from_service_shape() {
        let json = r#"{
            "url": "wss://gateway.example.com",
            "shards": 12,
            "session_start_limit": {
                "total": 1000,
                "remaining": 998,
                "reset_after": 75000000,
                "max_concurrency": 16
            }
        }"#;

        let info: GatewayInfo = serde_json::from_str(json).unwrap();
        assert_eq!("wss://gateway.example.com", info.url);
        assert_eq!(12, info.shards);
        assert_eq!(
            SessionStartLimit {
                total: 1000,
                remaining: 998,
                reset_after: 75_000_000,
                max_concurrency: 16,
            },
            info.session_start_limit,
        );
    }
}
