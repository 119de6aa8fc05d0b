//! Parses raw gateway frames into typed [`GatewayEvent`]s.

use crate::error::{ProcessError, ProcessErrorType};
use halcyon_model::{frame::Frame, opcode::OpCode};
use serde::Deserialize;
use serde_json::value::RawValue;

/// A gateway frame decoded enough to drive the [`Shard`](crate::Shard) state
/// machine; dispatch payloads are left raw (a `Box<RawValue>`) since their
/// shape depends on the event type and decoding them further is the
/// subscriber's job.
#[derive(Debug)]
pub enum GatewayEvent {
    /// `op: 0`. Carries the sequence number, event type, and raw payload.
    Dispatch {
        /// Sequence number of this dispatch.
        sequence: u64,
        /// Event type (e.g. `"MESSAGE_CREATE"`).
        event_type: String,
        /// Raw, undecoded payload.
        data: Box<RawValue>,
    },
    /// `op: 1`. The Service is requesting an immediate heartbeat.
    Heartbeat,
    /// `op: 7`. The Service is asking the shard to reconnect.
    Reconnect,
    /// `op: 9`. Carries whether the session may be resumed.
    InvalidSession {
        /// Whether the shard may resume instead of re-identifying.
        resumable: bool,
    },
    /// `op: 10`. Carries the heartbeat interval in milliseconds.
    Hello {
        /// Heartbeat interval, in milliseconds.
        heartbeat_interval: u64,
    },
    /// `op: 11`. Acknowledges the most recently sent heartbeat.
    HeartbeatAck,
}

#[derive(Deserialize)]
struct HelloPayload {
    heartbeat_interval: u64,
}

/// Parse a raw inbound frame into a [`GatewayEvent`].
pub fn parse(bytes: &[u8]) -> Result<GatewayEvent, ProcessError> {
    let frame: Frame<'_> = serde_json::from_slice(bytes)
        .map_err(|source| ProcessError::new(ProcessErrorType::Deserializing, Some(Box::new(source))))?;

    let op = frame
        .op_code()
        .ok_or_else(|| ProcessError::new(ProcessErrorType::ParsingPayload, None))?;

    match op {
        OpCode::Dispatch => {
            let sequence = frame
                .s
                .ok_or_else(|| ProcessError::new(ProcessErrorType::ParsingPayload, None))?;
            let event_type = frame
                .t
                .ok_or_else(|| ProcessError::new(ProcessErrorType::ParsingPayload, None))?
                .to_owned();

            Ok(GatewayEvent::Dispatch {
                sequence,
                event_type,
                data: frame.d.to_owned(),
            })
        }
        OpCode::Heartbeat => Ok(GatewayEvent::Heartbeat),
        OpCode::Reconnect => Ok(GatewayEvent::Reconnect),
        OpCode::InvalidSession => {
            let resumable = serde_json::from_str(frame.d.get())
                .map_err(|source| ProcessError::new(ProcessErrorType::ParsingPayload, Some(Box::new(source))))?;

            Ok(GatewayEvent::InvalidSession { resumable })
        }
        OpCode::Hello => {
            let hello: HelloPayload = serde_json::from_str(frame.d.get())
                .map_err(|source| ProcessError::new(ProcessErrorType::ParsingPayload, Some(Box::new(source))))?;

            Ok(GatewayEvent::Hello {
                heartbeat_interval: hello.heartbeat_interval,
            })
        }
        OpCode::HeartbeatAck => Ok(GatewayEvent::HeartbeatAck),
        // client-to-server-only opcodes, and any future additions
        _ => Err(ProcessError::new(ProcessErrorType::ParsingPayload, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, GatewayEvent};

    #[test]
    fn parses_hello() {
        let event = parse(br#"{"op":10,"d":{"heartbeat_interval":41250}}"#).unwrap();
        assert!(matches!(event, GatewayEvent::Hello { heartbeat_interval: 41250 }));
    }

    #[test]
    fn parses_dispatch() {
        let event = parse(br#"{"op":0,"d":{"session_id":"abc"},"s":3,"t":"READY"}"#).unwrap();

        match event {
            GatewayEvent::Dispatch { sequence, event_type, .. } => {
                assert_eq!(3, sequence);
                assert_eq!("READY", event_type);
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn parses_invalid_session() {
        let event = parse(br#"{"op":9,"d":false}"#).unwrap();
        assert!(matches!(event, GatewayEvent::InvalidSession { resumable: false }));
    }

    #[test]
    fn rejects_client_to_server_only_opcodes() {
        assert!(parse(br#"{"op":2,"d":{}}"#).is_err());
    }

    #[test]
    fn rejects_unknown_opcodes() {
        assert!(parse(br#"{"op":99,"d":null}"#).is_err());
    }
}
