//! The envelope every gateway message is wrapped in.

use crate::opcode::OpCode;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A single gateway frame: `{ op, d, s, t }`.
///
/// `s` and `t` are only ever present on [`OpCode::Dispatch`] frames. `d` is
/// left as a [`RawValue`] here because its shape depends entirely on `op`
/// (and, for dispatches, on `t`); decoding it is the caller's job.
#[derive(Debug, Deserialize, Serialize)]
pub struct Frame<'a> {
    /// Opcode of the frame.
    pub op: u8,
    /// Event data, shape depends on `op` (and `t` for dispatches).
    #[serde(borrow)]
    pub d: &'a RawValue,
    /// Sequence number, only present on dispatch frames.
    #[serde(default)]
    pub s: Option<u64>,
    /// Event type, only present on dispatch frames.
    #[serde(default)]
    pub t: Option<&'a str>,
}

impl Frame<'_> {
    /// The [`OpCode`] of this frame, if it's one the library recognizes.
    #[must_use]
    pub const fn op_code(&self) -> Option<OpCode> {
        OpCode::from_u8(self.op)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn parses_a_dispatch_frame() {
        let json = r#"{"op":0,"d":{"session_id":"abc"},"s":1,"t":"READY"}"#;
        let frame: Frame<'_> = serde_json::from_str(json).unwrap();

        assert_eq!(0, frame.op);
        assert_eq!(Some(1), frame.s);
        assert_eq!(Some("READY"), frame.t);
    }

    #[test]
    fn parses_a_heartbeat_ack_with_no_sequence_or_type() {
        let json = r#"{"op":11,"d":null}"#;
        let frame: Frame<'_> = serde_json::from_str(json).unwrap();

        assert_eq!(None, frame.s);
        assert_eq!(None, frame.t);
    }
}
