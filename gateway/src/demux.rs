//! Fans dispatch frames out to subscribers, filtered by event type, and
//! tracks per-type dispatch counts.

use bitflags::bitflags;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

bitflags! {
    /// Which dispatch event types a subscriber wants forwarded.
    ///
    /// Event types this library doesn't otherwise have a named flag for are
    /// folded into [`EventTypeFlags::OTHER`]; subscribing to [`ALL`][Self::ALL]
    /// always receives everything regardless of type.
    pub struct EventTypeFlags: u64 {
        const READY = 1;
        const RESUMED = 1 << 1;
        const CHANNEL_CREATE = 1 << 2;
        const CHANNEL_UPDATE = 1 << 3;
        const CHANNEL_DELETE = 1 << 4;
        const GUILD_CREATE = 1 << 5;
        const GUILD_UPDATE = 1 << 6;
        const GUILD_DELETE = 1 << 7;
        const MESSAGE_CREATE = 1 << 8;
        const MESSAGE_UPDATE = 1 << 9;
        const MESSAGE_DELETE = 1 << 10;
        const PRESENCE_UPDATE = 1 << 11;
        const TYPING_START = 1 << 12;
        const VOICE_STATE_UPDATE = 1 << 13;
        /// Any dispatch type not covered by a named flag.
        const OTHER = 1 << 14;
        const ALL = u64::MAX;
    }
}

impl EventTypeFlags {
    /// Map a raw `t` field to the flag it belongs to, defaulting to
    /// [`Self::OTHER`] for types this crate doesn't otherwise track.
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "READY" => Self::READY,
            "RESUMED" => Self::RESUMED,
            "CHANNEL_CREATE" => Self::CHANNEL_CREATE,
            "CHANNEL_UPDATE" => Self::CHANNEL_UPDATE,
            "CHANNEL_DELETE" => Self::CHANNEL_DELETE,
            "GUILD_CREATE" => Self::GUILD_CREATE,
            "GUILD_UPDATE" => Self::GUILD_UPDATE,
            "GUILD_DELETE" => Self::GUILD_DELETE,
            "MESSAGE_CREATE" => Self::MESSAGE_CREATE,
            "MESSAGE_UPDATE" => Self::MESSAGE_UPDATE,
            "MESSAGE_DELETE" => Self::MESSAGE_DELETE,
            "PRESENCE_UPDATE" => Self::PRESENCE_UPDATE,
            "TYPING_START" => Self::TYPING_START,
            "VOICE_STATE_UPDATE" => Self::VOICE_STATE_UPDATE,
            _ => Self::OTHER,
        }
    }
}

/// A dispatch frame handed to subscribers.
///
/// `data` is the raw, undecoded `d` payload; decoding into a concrete type is
/// left to the subscriber, since this crate has no opinion on event schemas.
#[derive(Clone, Debug)]
pub struct Event {
    /// Id of the shard that received this dispatch.
    pub shard_id: u64,
    /// Sequence number of this dispatch.
    pub sequence: u64,
    /// Dispatch event type (e.g. `"MESSAGE_CREATE"`).
    pub event_type: String,
    /// Raw, undecoded payload.
    pub data: Arc<str>,
}

#[derive(Debug)]
struct Listener {
    events: EventTypeFlags,
    tx: UnboundedSender<Event>,
}

#[derive(Debug, Default)]
struct ListenersRef {
    id: AtomicU64,
    listeners: Mutex<HashMap<u64, Listener>>,
}

/// Registry of event subscribers, cheap to clone and share across shards.
#[derive(Clone, Debug, Default)]
pub struct Listeners(Arc<ListenersRef>);

impl Listeners {
    /// Subscribe to dispatch frames matching `events`.
    #[must_use]
    pub fn subscribe(&self, events: EventTypeFlags) -> UnboundedReceiver<Event> {
        let id = self.0.id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::unbounded_channel();

        self.0
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, Listener { events, tx });

        rx
    }

    /// Drop every registered subscriber.
    pub fn clear(&self) {
        self.0
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    /// Forward `event` to every subscriber whose filter matches its type,
    /// dropping subscribers whose receiver has gone away.
    pub fn dispatch(&self, event: Event) {
        let flag = EventTypeFlags::from_event_type(&event.event_type);

        let mut listeners = self.0.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        listeners.retain(|_, listener| {
            if listener.events.contains(EventTypeFlags::ALL) || listener.events.intersects(flag) {
                listener.tx.send(event.clone()).is_ok()
            } else {
                !listener.tx.is_closed()
            }
        });
    }
}

/// Per-event-type dispatch counters.
#[derive(Debug, Default)]
pub struct EventCounts {
    ready: AtomicU64,
    resumed: AtomicU64,
    other: AtomicU64,
}

impl EventCounts {
    /// Record a dispatch of the given event type.
    pub fn record(&self, event_type: &str) {
        match event_type {
            "READY" => &self.ready,
            "RESUMED" => &self.resumed,
            _ => &self.other,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    /// Total `READY` dispatches observed.
    #[must_use]
    pub fn ready(&self) -> u64 {
        self.ready.load(Ordering::Relaxed)
    }

    /// Total `RESUMED` dispatches observed.
    #[must_use]
    pub fn resumed(&self) -> u64 {
        self.resumed.load(Ordering::Relaxed)
    }

    /// Total dispatches of any other type observed.
    #[must_use]
    pub fn other(&self) -> u64 {
        self.other.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventCounts, EventTypeFlags, Listeners};
    use static_assertions::assert_impl_all;
    use std::{fmt::Debug, sync::Arc};

    assert_impl_all!(Listeners: Clone, Debug, Send, Sync);
    assert_impl_all!(EventCounts: Debug, Send, Sync);

    fn event(event_type: &str) -> Event {
        Event {
            shard_id: 0,
            sequence: 1,
            event_type: event_type.to_owned(),
            data: Arc::from("{}"),
        }
    }

    #[test]
    fn subscriber_only_receives_matching_types() {
        let listeners = Listeners::default();
        let mut messages = listeners.subscribe(EventTypeFlags::MESSAGE_CREATE);
        let mut ready = listeners.subscribe(EventTypeFlags::READY);

        listeners.dispatch(event("MESSAGE_CREATE"));

        assert!(messages.try_recv().is_ok());
        assert!(ready.try_recv().is_err());
    }

    #[test]
    fn all_subscriber_receives_unrecognized_types() {
        let listeners = Listeners::default();
        let mut everything = listeners.subscribe(EventTypeFlags::ALL);

        listeners.dispatch(event("SOME_FUTURE_EVENT_TYPE"));

        assert!(everything.try_recv().is_ok());
    }

    #[test]
    fn dropped_receivers_are_pruned_on_next_dispatch() {
        let listeners = Listeners::default();
        drop(listeners.subscribe(EventTypeFlags::ALL));

        listeners.dispatch(event("READY"));
        listeners.dispatch(event("READY"));
    }

    #[test]
    fn counts_track_dispatch_totals() {
        let counts = EventCounts::default();
        counts.record("READY");
        counts.record("MESSAGE_CREATE");
        counts.record("MESSAGE_CREATE");

        assert_eq!(1, counts.ready());
        assert_eq!(0, counts.resumed());
        assert_eq!(2, counts.other());
    }
}
