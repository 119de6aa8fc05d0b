//! Gateway close codes and their reconnect policy.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Close code sent by the Service when it closes a gateway connection.
///
/// Codes not covered by a named variant still parse via [`CloseCode::new`]
/// and are treated as non-fatal, since unrecognized codes are assumed to be
/// the Service signalling a transient condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CloseCode {
    UnknownError,
    UnknownOpCode,
    DecodeError,
    NotAuthenticated,
    AuthenticationFailed,
    AlreadyAuthenticated,
    InvalidSequence,
    RateLimited,
    SessionTimedOut,
    InvalidShard,
    ShardingRequired,
    InvalidApiVersion,
    InvalidIntents,
    DisallowedIntents,
    /// A close code the library doesn't recognize.
    Other(u16),
}

impl CloseCode {
    /// Parse a raw close code received from the Service.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        match code {
            4000 => Self::UnknownError,
            4001 => Self::UnknownOpCode,
            4002 => Self::DecodeError,
            4003 => Self::NotAuthenticated,
            4004 => Self::AuthenticationFailed,
            4005 => Self::AlreadyAuthenticated,
            4007 => Self::InvalidSequence,
            4008 => Self::RateLimited,
            4009 => Self::SessionTimedOut,
            4010 => Self::InvalidShard,
            4011 => Self::ShardingRequired,
            4012 => Self::InvalidApiVersion,
            4013 => Self::InvalidIntents,
            4014 => Self::DisallowedIntents,
            other => Self::Other(other),
        }
    }

    /// The raw numeric value of the close code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::UnknownError => 4000,
            Self::UnknownOpCode => 4001,
            Self::DecodeError => 4002,
            Self::NotAuthenticated => 4003,
            Self::AuthenticationFailed => 4004,
            Self::AlreadyAuthenticated => 4005,
            Self::InvalidSequence => 4007,
            Self::RateLimited => 4008,
            Self::SessionTimedOut => 4009,
            Self::InvalidShard => 4010,
            Self::ShardingRequired => 4011,
            Self::InvalidApiVersion => 4012,
            Self::InvalidIntents => 4013,
            Self::DisallowedIntents => 4014,
            Self::Other(code) => code,
        }
    }

    /// Whether a shard may reconnect after receiving this close code.
    ///
    /// Codes indicating permanent misconfiguration -- a bad token, invalid or
    /// disallowed intents, an unsupported API version, or an invalid/oversized
    /// shard count -- are fatal and must not trigger a reconnect.
    #[must_use]
    pub const fn can_reconnect(self) -> bool {
        !matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }
}

impl Display for CloseCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.code(), f)
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self::new(code)
    }
}

#[cfg(test)]
mod tests {
    use super::CloseCode;

    #[test]
    fn fatal_codes_cannot_reconnect() {
        assert!(!CloseCode::AuthenticationFailed.can_reconnect());
        assert!(!CloseCode::InvalidIntents.can_reconnect());
        assert!(!CloseCode::DisallowedIntents.can_reconnect());
        assert!(!CloseCode::InvalidApiVersion.can_reconnect());
        assert!(!CloseCode::InvalidShard.can_reconnect());
        assert!(!CloseCode::ShardingRequired.can_reconnect());
    }

    #[test]
    fn non_fatal_codes_can_reconnect() {
        assert!(CloseCode::UnknownError.can_reconnect());
        assert!(CloseCode::RateLimited.can_reconnect());
        assert!(CloseCode::new(1006).can_reconnect());
    }

    #[test]
    fn round_trips_through_code() {
        assert_eq!(CloseCode::InvalidIntents, CloseCode::new(4013));
        assert_eq!(4013, CloseCode::InvalidIntents.code());
    }
}
