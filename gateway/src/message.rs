//! Messages sent or received over a shard's websocket connection.
//!
//! This is mostly equivalent to the underlying websocket library's message
//! type, but exists so that type isn't exposed in this crate's public API.

use tokio_tungstenite::tungstenite::{
    protocol::{frame::coding::CloseCode as TungsteniteCloseCode, CloseFrame as TungsteniteCloseFrame},
    Message as TungsteniteMessage,
};

/// Information about a close message, if any.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct CloseFrame<'a> {
    code: u16,
    reason: std::borrow::Cow<'a, str>,
}

impl<'a> CloseFrame<'a> {
    /// Normal close, the shard will not reconnect.
    pub const NORMAL: Self = Self {
        code: 1000,
        reason: std::borrow::Cow::Borrowed("closing connection"),
    };

    /// Close code telling the Service the shard intends to resume soon.
    pub const RESUME: Self = Self {
        code: 4000,
        reason: std::borrow::Cow::Borrowed("resuming connection"),
    };

    pub(crate) fn from_tungstenite(tungstenite: TungsteniteCloseFrame) -> Self {
        Self {
            code: u16::from(tungstenite.code),
            reason: tungstenite.reason.as_str().to_owned().into(),
        }
    }

    pub(crate) fn into_tungstenite(self) -> TungsteniteCloseFrame {
        TungsteniteCloseFrame {
            code: TungsteniteCloseCode::from(self.code),
            reason: self.reason.into_owned().into(),
        }
    }

    /// Close code of the frame.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Reason for the close.
    #[must_use]
    pub fn reason(&self) -> &str {
        self.reason.as_ref()
    }
}

impl<'a, T: Into<std::borrow::Cow<'a, str>>> From<(u16, T)> for CloseFrame<'a> {
    fn from((code, reason): (u16, T)) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Message sent or received over a shard's connection.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Message {
    /// Binary websocket message.
    Binary(Vec<u8>),
    /// Close message with an optional frame describing the reason.
    Close(Option<CloseFrame<'static>>),
    /// Text websocket message.
    Text(String),
}

impl Message {
    pub(crate) fn from_tungstenite(tungstenite: TungsteniteMessage) -> Option<Self> {
        match tungstenite {
            TungsteniteMessage::Binary(bytes) => Some(Self::Binary(bytes.to_vec())),
            TungsteniteMessage::Close(maybe_close) => {
                Some(Self::Close(maybe_close.map(CloseFrame::from_tungstenite)))
            }
            TungsteniteMessage::Text(string) => Some(Self::Text(string.as_str().to_owned())),
            TungsteniteMessage::Frame(_)
            | TungsteniteMessage::Ping(_)
            | TungsteniteMessage::Pong(_) => None,
        }
    }

    pub(crate) fn into_tungstenite(self) -> TungsteniteMessage {
        match self {
            Self::Binary(bytes) => TungsteniteMessage::Binary(bytes.into()),
            Self::Close(close) => {
                TungsteniteMessage::Close(close.map(CloseFrame::into_tungstenite))
            }
            Self::Text(string) => TungsteniteMessage::Text(string.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CloseFrame, Message};
    use static_assertions::{assert_fields, assert_impl_all};

    assert_fields!(CloseFrame<'_>: code, reason);
    assert_impl_all!(
        CloseFrame<'_>:
        Clone,
        Eq,
        From<(u16, &'static str)>,
        From<(u16, String)>,
        PartialEq,
    );
    assert_impl_all!(Message: Clone, Eq, PartialEq);

    #[test]
    fn close_frame_from_tuple() {
        let frame = CloseFrame::from((1000, "reason here"));
        assert_eq!(1000, frame.code());
        assert_eq!("reason here", frame.reason());
    }
}
