//! Paces heartbeats on one shard's connection and tracks liveness.

use crate::latency::Latency;
use std::{
    pin::Pin,
    time::{Duration, Instant},
};
use tokio::time::{self, Sleep};

/// `missedAcks` reaching this many turns the controller into a zombie
/// signal (spec: "at most 3 missed acknowledgements while non-zombie").
const ZOMBIE_THRESHOLD: u8 = 3;

/// Paces heartbeats at `interval` and tracks whether they're acknowledged.
///
/// Owned by a [`Shard`](crate::Shard); the shard's receive loop polls
/// [`Heartbeater::tick`] with top precedence over socket reads so heartbeat
/// timing is never starved by a busy connection, and calls
/// [`Heartbeater::ack`] whenever a `HEARTBEAT_ACK` frame arrives.
#[derive(Debug)]
pub struct Heartbeater {
    interval: Duration,
    sleep: Pin<Box<Sleep>>,
    last_sent: Option<Instant>,
    missed_acks: u8,
    latency: Latency,
}

impl Heartbeater {
    /// Begin pacing heartbeats every `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            sleep: Box::pin(time::sleep(Duration::ZERO)),
            last_sent: None,
            missed_acks: 0,
            latency: Latency::default(),
        }
    }

    /// Round-trip latency history for this session.
    #[must_use]
    pub const fn latency(&self) -> &Latency {
        &self.latency
    }

    /// Number of heartbeats sent without a matching ack so far.
    #[must_use]
    pub const fn missed_acks(&self) -> u8 {
        self.missed_acks
    }

    /// Whether the connection has missed enough acks to be a zombie.
    #[must_use]
    pub const fn is_zombie(&self) -> bool {
        self.missed_acks >= ZOMBIE_THRESHOLD
    }

    /// Resolves when the next heartbeat is due.
    ///
    /// Must be called again (via [`Heartbeater::sent`] resetting the timer)
    /// after every send so the timer restarts from the moment the heartbeat
    /// actually went out.
    pub async fn tick(&mut self) {
        self.sleep.as_mut().await;
    }

    /// Record that a heartbeat was just sent: bumps `missedAcks` if the
    /// previous one was never acknowledged, restarts the tick timer, and
    /// returns whether the connection has now become a zombie.
    pub fn sent(&mut self) -> bool {
        if self.last_sent.is_some() {
            self.missed_acks = self.missed_acks.saturating_add(1);
        }

        self.last_sent = Some(Instant::now());
        self.sleep.as_mut().reset(time::Instant::now() + self.interval);

        self.is_zombie()
    }

    /// Record a `HEARTBEAT_ACK`: resets `missedAcks` and records a latency
    /// sample if a heartbeat is outstanding.
    pub fn ack(&mut self) {
        self.missed_acks = 0;

        if let Some(sent) = self.last_sent.take() {
            self.latency.record(sent.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Heartbeater;
    use static_assertions::assert_impl_all;
    use std::{fmt::Debug, time::Duration};

    assert_impl_all!(Heartbeater: Debug, Send, Sync);

    #[tokio::test]
    async fn ack_resets_missed_acks_and_records_latency() {
        let mut hb = Heartbeater::new(Duration::from_secs(30));
        hb.sent();
        hb.sent();
        assert_eq!(1, hb.missed_acks());

        hb.ack();
        assert_eq!(0, hb.missed_acks());
        assert_eq!(1, hb.latency().heartbeats());
    }

    #[tokio::test]
    async fn three_consecutive_unacknowledged_sends_signal_zombie() {
        let mut hb = Heartbeater::new(Duration::from_secs(30));
        assert!(!hb.sent());
        assert!(!hb.sent());
        assert!(!hb.sent());
        assert!(hb.sent());
        assert!(hb.is_zombie());
    }
}
