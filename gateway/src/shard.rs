//! Primary logic and implementation details of the gateway websocket
//! connection.
//!
//! A shard is, at its heart, a websocket connection paired with the state
//! needed to maintain an authenticated session: handshake, heartbeat,
//! session resumption, and close-code-sensitive reconnect. Every transition
//! named in this crate's state machine is a distinct [`ShardState`] variant,
//! richer than a simple connected/disconnected split, so each one is
//! independently observable by callers.

use crate::{
    config::{default_identify_properties, Config, ShardId},
    error::{
        ProcessError, ReceiveMessageError, ReceiveMessageErrorType, SendError, SendErrorType,
        ShardInitializeError, ShardInitializeErrorType,
    },
    heartbeat::Heartbeater,
    json::{self, GatewayEvent},
    latency::Latency,
    message::{CloseFrame, Message},
    session::Session,
};
use futures_util::{SinkExt, StreamExt};
use halcyon_model::{
    payload::{Command, Heartbeat, Identify, IdentifyInfo, OutgoingFrame, Resume},
    CloseCode,
};
use rand::Rng;
use std::time::Duration;
use tokio::{
    net::TcpStream,
    sync::mpsc::UnboundedReceiver,
    time::sleep,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

#[cfg(feature = "zlib")]
use crate::compression::Inflater;

/// Live websocket connection a [`Shard`] reads frames from and writes to.
type Connection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Current state of a [`Shard`]'s session, named to match every transition
/// in the state machine independently.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ShardState {
    /// No connection is open.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The socket is open but no `HELLO` has been received yet.
    Connected,
    /// `HELLO` has been received and an `IDENTIFY` was just sent.
    Identifying,
    /// A `READY` was received; the session is fully usable.
    Ready,
    /// `HELLO` has been received for a known session and a `RESUME` was
    /// just sent.
    Resuming,
    /// The connection is being torn down and will be re-established.
    Reconnecting,
    /// Heartbeats have gone unacknowledged past the zombie threshold; the
    /// connection will be dropped and replaced.
    Zombie,
}

impl ShardState {
    /// Whether the shard has a usable, fully-identified session.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Gateway connection for a single shard.
#[derive(Debug)]
pub struct Shard {
    config: Config,
    id: ShardId,
    connection: Option<Connection>,
    state: ShardState,
    session: Option<Session>,
    heartbeater: Option<Heartbeater>,
    reconnect_attempts: u8,
    #[cfg(feature = "zlib")]
    inflater: Inflater,
}

impl Shard {
    /// Connect a new shard, going through the configured [`Queue`] first.
    ///
    /// [`Queue`]: halcyon_gateway_queue::Queue
    ///
    /// # Errors
    ///
    /// Returns a [`ShardInitializeErrorType::UrlInvalid`] error if `url` is
    /// not a valid websocket url, or [`ShardInitializeErrorType::Establishing`]
    /// if the handshake fails.
    pub async fn connect(id: ShardId, config: Config, url: &str) -> Result<Self, ShardInitializeError> {
        config.queue.request(id.as_pair()).await;

        let mut shard = Self {
            config,
            id,
            connection: None,
            state: ShardState::Disconnected,
            session: None,
            heartbeater: None,
            reconnect_attempts: 0,
            #[cfg(feature = "zlib")]
            inflater: Inflater::new(),
        };

        shard.open(url).await?;

        Ok(shard)
    }

    /// This shard's id.
    #[must_use]
    pub const fn id(&self) -> ShardId {
        self.id
    }

    /// Current state of the shard's session.
    #[must_use]
    pub const fn state(&self) -> ShardState {
        self.state
    }

    /// Recent heartbeat latency, if a heartbeat has been sent yet.
    #[must_use]
    pub fn latency(&self) -> Option<&Latency> {
        self.heartbeater.as_ref().map(Heartbeater::latency)
    }

    /// Active gateway session, if one has been established.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    async fn open(&mut self, url: &str) -> Result<(), ShardInitializeError> {
        self.state = ShardState::Connecting;

        Url::parse(url).map_err(|_| {
            ShardInitializeError::new(
                ShardInitializeErrorType::UrlInvalid { url: url.to_owned() },
                None,
            )
        })?;

        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|source| ShardInitializeError::new(ShardInitializeErrorType::Establishing, Some(Box::new(source))))?;

        self.connection = Some(stream);
        self.state = ShardState::Connected;
        self.reconnect_attempts = 0;
        #[cfg(feature = "zlib")]
        self.inflater.reset();

        Ok(())
    }

    /// Wait for and process the next event, driving the state machine as a
    /// side effect.
    ///
    /// Internally races, in precedence order: a due heartbeat, a queued
    /// outgoing command, then the next socket frame. Returns `Ok(None)` for
    /// frames that don't carry a dispatch event (heartbeats, acks, hello).
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiveMessageErrorType::FatallyClosed`] error if the
    /// gateway closed with a non-retryable close code. Returns
    /// [`ReceiveMessageErrorType::Reconnect`] if reconnect attempts were
    /// exhausted.
    pub async fn next_event(
        &mut self,
        outgoing: &mut UnboundedReceiver<Message>,
    ) -> Result<Option<(u64, String, Box<serde_json::value::RawValue>)>, ReceiveMessageError> {
        loop {
            if self.connection.is_none() {
                self.reconnect().await?;
                continue;
            }

            let raw = tokio::select! {
                biased;

                () = heartbeat_tick(&mut self.heartbeater) => {
                    self.send_heartbeat().await.map_err(|source| {
                        ReceiveMessageError::new(ReceiveMessageErrorType::SendingMessage, Some(Box::new(source)))
                    })?;
                    continue;
                }
                maybe_message = outgoing.recv() => {
                    let message = maybe_message.expect("shard owns a sender clone");
                    self.send(message).await.map_err(|source| {
                        ReceiveMessageError::new(ReceiveMessageErrorType::SendingMessage, Some(Box::new(source)))
                    })?;
                    continue;
                }
                frame = self.connection.as_mut().expect("checked above").next() => {
                    match frame {
                        Some(Ok(raw)) => raw,
                        _ => {
                            self.connection = None;
                            self.state = ShardState::Reconnecting;
                            continue;
                        }
                    }
                }
            };

            let Some(message) = Message::from_tungstenite(raw) else {
                continue;
            };

            let bytes = match message {
                Message::Binary(bytes) => bytes,
                Message::Text(text) => text.into_bytes(),
                Message::Close(frame) => {
                    return self.handle_close(frame).await.map(|()| None);
                }
            };

            #[cfg(feature = "zlib")]
            let decoded = {
                match self.inflater.decompress(&bytes) {
                    Ok(Some(decoded)) => decoded.to_vec(),
                    Ok(None) => continue,
                    Err(source) => {
                        return Err(ReceiveMessageError::new(
                            ReceiveMessageErrorType::Decompressing,
                            Some(Box::new(source)),
                        ))
                    }
                }
            };
            #[cfg(not(feature = "zlib"))]
            let decoded = bytes;

            match self.process(&decoded).await {
                Ok(dispatch) => {
                    if dispatch.is_some() {
                        return Ok(dispatch);
                    }
                }
                Err(source) => {
                    return Err(ReceiveMessageError::new(ReceiveMessageErrorType::Process, Some(Box::new(source))));
                }
            }
        }
    }

    async fn process(
        &mut self,
        bytes: &[u8],
    ) -> Result<Option<(u64, String, Box<serde_json::value::RawValue>)>, ProcessError> {
        let event = json::parse(bytes)?;

        match event {
            GatewayEvent::Dispatch { sequence, event_type, data } => {
                if let Some(session) = self.session.as_mut() {
                    session.set_sequence(sequence);
                }

                if event_type == "READY" {
                    if let Ok(ready) = serde_json::from_str::<ReadyPayload>(data.get()) {
                        self.session = Some(Session::new(ready.session_id, ready.resume_gateway_url, sequence));
                        self.state = ShardState::Ready;
                    }
                } else if event_type == "RESUMED" {
                    self.state = ShardState::Ready;
                }

                Ok(Some((sequence, event_type, data)))
            }
            GatewayEvent::Heartbeat => {
                self.send_heartbeat().await.map_err(|source| {
                    ProcessError::new(crate::error::ProcessErrorType::SendingMessage, Some(Box::new(source)))
                })?;
                Ok(None)
            }
            GatewayEvent::HeartbeatAck => {
                if let Some(heartbeater) = self.heartbeater.as_mut() {
                    heartbeater.ack();
                }
                Ok(None)
            }
            GatewayEvent::Hello { heartbeat_interval } => {
                self.heartbeater = Some(Heartbeater::new(Duration::from_millis(heartbeat_interval)));

                if self.session.is_some() {
                    self.state = ShardState::Resuming;
                    self.resume().await.map_err(|source| {
                        ProcessError::new(crate::error::ProcessErrorType::SendingMessage, Some(Box::new(source)))
                    })?;
                } else {
                    self.state = ShardState::Identifying;
                    self.identify().await.map_err(|source| {
                        ProcessError::new(crate::error::ProcessErrorType::SendingMessage, Some(Box::new(source)))
                    })?;
                }

                Ok(None)
            }
            GatewayEvent::InvalidSession { resumable } => {
                if resumable {
                    let wait = Duration::from_secs(rand::thread_rng().gen_range(1..=5));
                    sleep(wait).await;
                    self.state = ShardState::Resuming;
                } else {
                    self.session = None;
                    self.state = ShardState::Identifying;
                }

                Ok(None)
            }
            GatewayEvent::Reconnect => {
                self.connection = None;
                self.state = ShardState::Reconnecting;
                Ok(None)
            }
        }
    }

    async fn handle_close(&mut self, frame: Option<CloseFrame<'static>>) -> Result<(), ReceiveMessageError> {
        self.connection = None;

        let close_code = frame.map_or(CloseCode::Other(1006), |frame| CloseCode::new(frame.code()));

        if !close_code.can_reconnect() {
            self.state = ShardState::Disconnected;
            return Err(ReceiveMessageError::new(
                ReceiveMessageErrorType::FatallyClosed { close_code },
                None,
            ));
        }

        self.state = ShardState::Reconnecting;
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<(), ReceiveMessageError> {
        if self.reconnect_attempts >= self.config.max_reconnect_attempts {
            return Err(ReceiveMessageError::new(ReceiveMessageErrorType::Reconnect, None));
        }

        let wait_secs = 2u64.saturating_pow(u32::from(self.reconnect_attempts)).min(30);
        sleep(Duration::from_secs(wait_secs)).await;
        self.reconnect_attempts += 1;

        let url = self
            .session
            .as_ref()
            .map_or_else(|| "wss://gateway.invalid".to_owned(), |session| session.resume_gateway_url().to_owned());

        self.open(&url).await.map_err(|source| {
            ReceiveMessageError::new(ReceiveMessageErrorType::Client, Some(Box::new(source)))
        })
    }

    /// Send a raw websocket message.
    ///
    /// # Errors
    ///
    /// Returns [`SendErrorType::Sending`] if the underlying socket write
    /// fails.
    pub async fn send(&mut self, message: Message) -> Result<(), SendError> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(SendError::new(SendErrorType::Sending, None));
        };

        connection
            .send(message.into_tungstenite())
            .await
            .map_err(|source| SendError::new(SendErrorType::Sending, Some(Box::new(source))))
    }

    /// Send a command, serializing it to its framed `{ op, d }` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SendErrorType::Serializing`] if the command fails to
    /// serialize, or [`SendErrorType::Sending`] if the socket write fails.
    pub async fn command(&mut self, command: &impl Command) -> Result<(), SendError> {
        let frame = OutgoingFrame::new(command);
        let json = serde_json::to_vec(&frame)
            .map_err(|source| SendError::new(SendErrorType::Serializing, Some(Box::new(source))))?;

        self.send(Message::Binary(json)).await
    }

    async fn send_heartbeat(&mut self) -> Result<(), SendError> {
        let sequence = self.session.as_ref().map(Session::sequence);
        self.command(&Heartbeat::new(sequence)).await?;

        if let Some(heartbeater) = self.heartbeater.as_mut() {
            if heartbeater.sent() {
                self.state = ShardState::Zombie;
                self.connection = None;
                self.state = ShardState::Reconnecting;
            }
        }

        Ok(())
    }

    async fn identify(&mut self) -> Result<(), SendError> {
        let identify = Identify::new(IdentifyInfo {
            token: self.config.token.clone(),
            intents: self.config.intents,
            shard: self.id.as_pair(),
            large_threshold: self.config.large_threshold,
            presence: self.config.presence.clone(),
            properties: default_identify_properties(),
        });

        self.command(&identify).await
    }

    async fn resume(&mut self) -> Result<(), SendError> {
        let Some(session) = self.session.as_ref() else {
            return self.identify().await;
        };

        let resume = Resume::new(self.config.token.clone(), session.id().to_owned(), session.sequence());
        self.command(&resume).await
    }
}

#[derive(serde::Deserialize)]
struct ReadyPayload {
    session_id: String,
    resume_gateway_url: String,
}

async fn heartbeat_tick(heartbeater: &mut Option<Heartbeater>) {
    match heartbeater {
        Some(heartbeater) => heartbeater.tick().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::ShardState;
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(ShardState: Clone, Copy, Debug, Eq, PartialEq, Send, Sync);

    #[test]
    fn only_ready_reports_is_ready() {
        assert!(ShardState::Ready.is_ready());
        assert!(!ShardState::Connected.is_ready());
        assert!(!ShardState::Resuming.is_ready());
    }
}
