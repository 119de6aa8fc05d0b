//! Round-trip latency tracking for a shard's heartbeats.

use std::time::Duration;

/// Number of recent heartbeat round-trips kept for [`Latency::recent`].
const RECENT_LEN: usize = 10;

/// Send-to-ack latency history for one shard's session.
///
/// Holds a ring buffer of the [`RECENT_LEN`] most recent round-trip times, as
/// required to compute [`average`][Latency::average] ("ping").
#[derive(Clone, Debug, Default)]
pub struct Latency {
    heartbeats: u32,
    recent: [Duration; RECENT_LEN],
    len: usize,
    head: usize,
}

impl Latency {
    /// Record a new round-trip sample.
    pub(crate) fn record(&mut self, sample: Duration) {
        self.recent[self.head] = sample;
        self.head = (self.head + 1) % RECENT_LEN;
        self.len = (self.len + 1).min(RECENT_LEN);
        self.heartbeats += 1;
    }

    /// Total number of heartbeats acknowledged over the life of the session.
    #[must_use]
    pub const fn heartbeats(&self) -> u32 {
        self.heartbeats
    }

    /// The recorded samples, oldest first, at most [`RECENT_LEN`] of them.
    #[must_use]
    pub fn recent(&self) -> Vec<Duration> {
        let start = (self.head + RECENT_LEN - self.len) % RECENT_LEN;

        (0..self.len).map(|i| self.recent[(start + i) % RECENT_LEN]).collect()
    }

    /// Mean of the recorded samples, or [`Duration::ZERO`] if none yet.
    #[must_use]
    pub fn average(&self) -> Duration {
        if self.len == 0 {
            return Duration::ZERO;
        }

        let total: Duration = self.recent().into_iter().sum();

        total / u32::try_from(self.len).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::Latency;
    use static_assertions::assert_impl_all;
    use std::{fmt::Debug, time::Duration};

    assert_impl_all!(Latency: Clone, Debug, Default, Send, Sync);

    #[test]
    fn average_of_no_samples_is_zero() {
        assert_eq!(Duration::ZERO, Latency::default().average());
    }

    #[test]
    fn keeps_only_the_ten_most_recent_samples() {
        let mut latency = Latency::default();

        for millis in 1..=12u64 {
            latency.record(Duration::from_millis(millis));
        }

        assert_eq!(12, latency.heartbeats());
        let recent = latency.recent();
        assert_eq!(10, recent.len());
        assert_eq!(Duration::from_millis(3), recent[0]);
        assert_eq!(Duration::from_millis(12), recent[9]);
    }

    #[test]
    fn average_reflects_recorded_samples() {
        let mut latency = Latency::default();
        latency.record(Duration::from_millis(10));
        latency.record(Duration::from_millis(20));
        latency.record(Duration::from_millis(30));

        assert_eq!(Duration::from_millis(20), latency.average());
    }
}
