//! Typed identifiers for Service resources.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    marker::PhantomData,
};

/// A resource identifier.
///
/// `Id` is generic over a marker type so that, for example, a [`GuildId`]
/// can't accidentally be passed where a [`ChannelId`] is expected.
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct Id<T> {
    #[serde(skip)]
    phantom: PhantomData<T>,
    value: u64,
}

impl<T> Id<T> {
    /// Create an identifier from its raw numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self {
            phantom: PhantomData,
            value,
        }
    }

    /// The raw numeric value of the identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.value
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.value, f)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// Marker type for [`Id`]s identifying a guild.
#[derive(Debug)]
pub enum GuildMarker {}

/// Marker type for [`Id`]s identifying a channel.
#[derive(Debug)]
pub enum ChannelMarker {}

/// Identifier of a guild.
pub type GuildId = Id<GuildMarker>;

/// Identifier of a channel.
pub type ChannelId = Id<ChannelMarker>;

#[cfg(test)]
mod tests {
    use super::{GuildId, Id};
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(Id<()>: Clone, Copy, Debug, Eq, PartialEq, Send, Sync);

    #[test]
    fn get_returns_the_raw_value() {
        let id: GuildId = Id::new(123);

        assert_eq!(123, id.get());
    }

    #[test]
    fn distinct_marker_ids_with_the_same_value_are_equal_in_value() {
        let guild: GuildId = Id::new(7);
        let raw = guild.get();

        assert_eq!(7, raw);
    }
}
