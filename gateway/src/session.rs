//! Mutable session state exclusively owned by one shard's receive fiber.

/// Authenticated gateway session: resumable via its id, the last received
/// sequence, and the resume url the Service handed back in `READY`.
#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    resume_gateway_url: String,
    sequence: u64,
}

impl Session {
    /// Record a new session established via a `READY` event.
    #[must_use]
    pub fn new(id: String, resume_gateway_url: String, sequence: u64) -> Self {
        Self {
            id,
            resume_gateway_url,
            sequence,
        }
    }

    /// The Service-assigned session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The url to reconnect to when resuming this session.
    #[must_use]
    pub fn resume_gateway_url(&self) -> &str {
        &self.resume_gateway_url
    }

    /// Last sequence number received on this session.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Record a newly received sequence number.
    pub fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(Session: Clone, Debug, Send, Sync);

    #[test]
    fn set_sequence_updates_last_sequence() {
        let mut session = Session::new("abc".into(), "wss://example".into(), 1);
        session.set_sequence(5);
        assert_eq!(5, session.sequence());
    }
}
