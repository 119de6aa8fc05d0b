//! Determines shard count, spawns shards under the Service-published
//! concurrency limit, and forwards their events to subscribers.

use crate::{
    config::{Config, ShardId},
    demux::{Event, EventCounts, EventTypeFlags, Listeners},
    error::{ManagerError, ManagerErrorType},
    message::Message,
    shard::Shard,
};
use futures_util::future;
use halcyon_http::{Client, Method, Request};
use halcyon_model::GatewayInfo;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
    time::timeout,
};

struct ShardHandle {
    join: JoinHandle<()>,
    sender: mpsc::UnboundedSender<Message>,
    ready: Arc<AtomicBool>,
}

struct ManagerRef {
    config: Config,
    url: String,
    shards: Mutex<HashMap<u64, ShardHandle>>,
    listeners: Listeners,
    counts: EventCounts,
}

/// Owns and supervises every shard for one bot, forwarding their dispatches
/// to subscribers.
///
/// Cheap to clone: every clone shares the same underlying shard table and
/// subscriber registry.
#[derive(Clone)]
pub struct ShardManager(Arc<ManagerRef>);

impl ShardManager {
    /// Fetch gateway info and spawn one shard per id in `0..total`, where
    /// `total` defaults to the Service-recommended shard count unless
    /// `shard_count` overrides it.
    ///
    /// Spawns proceed in batches sized to the Service's published
    /// `max_concurrency`, waiting `spawn_delay` between batches and up to
    /// `connect_timeout` for each shard in a batch to become ready.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerErrorType::RetrievingGatewayInfo`] if `GET
    /// /gateway/bot` fails, or [`ManagerErrorType::ShardTimedOut`] if a
    /// shard doesn't reach `ready` before its connect timeout.
    pub async fn connect(
        http: &Client,
        config: Config,
        shard_count: Option<u64>,
    ) -> Result<Self, ManagerError> {
        let info: GatewayInfo = http
            .request(Request::new(Method::Get, "/gateway/bot"))
            .await
            .map_err(|source| ManagerError::new(ManagerErrorType::RetrievingGatewayInfo, Some(Box::new(source))))?;

        let total = shard_count.unwrap_or(u64::from(info.shards)).max(1);
        let max_concurrency = u64::from(info.session_start_limit.max_concurrency).max(1);

        let manager = Self(Arc::new(ManagerRef {
            config,
            url: info.url,
            shards: Mutex::new(HashMap::new()),
            listeners: Listeners::default(),
            counts: EventCounts::default(),
        }));

        let mut current = 0;
        while current < total {
            let batch_end = (current + max_concurrency).min(total);

            future::try_join_all(
                (current..batch_end).map(|shard_current| manager.spawn_shard(ShardId::new(shard_current, total))),
            )
            .await?;

            current = batch_end;

            if current < total {
                tokio::time::sleep(manager.0.config.spawn_delay).await;
            }
        }

        Ok(manager)
    }

    async fn spawn_shard(&self, id: ShardId) -> Result<(), ManagerError> {
        let manager_ref = Arc::clone(&self.0);
        let config = manager_ref.config.clone();
        let url = manager_ref.url.clone();
        let ready = Arc::new(AtomicBool::new(false));
        let ready_for_task = Arc::clone(&ready);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let connect_timeout = config.connect_timeout;

        let join = tokio::spawn(async move {
            let mut shard = match Shard::connect(id, config, &url).await {
                Ok(shard) => shard,
                Err(_source) => return,
            };

            let mut ready_tx = Some(ready_tx);

            loop {
                match shard.next_event(&mut rx).await {
                    Ok(Some((sequence, event_type, data))) => {
                        if event_type == "READY" {
                            ready_for_task.store(true, Ordering::Relaxed);

                            if let Some(tx) = ready_tx.take() {
                                let _ = tx.send(());
                            }
                        }

                        manager_ref.counts.record(&event_type);
                        manager_ref.listeners.dispatch(Event {
                            shard_id: id.current(),
                            sequence,
                            event_type,
                            data: Arc::from(data.get()),
                        });
                    }
                    Ok(None) => {}
                    Err(_source) => break,
                }
            }

            ready_for_task.store(false, Ordering::Relaxed);
        });

        self.0.shards.lock().await.insert(
            id.current(),
            ShardHandle {
                join,
                sender: tx,
                ready,
            },
        );

        match timeout(connect_timeout, ready_rx).await {
            Ok(_) => Ok(()),
            Err(_) => Err(ManagerError::new(
                ManagerErrorType::ShardTimedOut { id: id.current() },
                None,
            )),
        }
    }

    /// Subscribe to dispatches forwarded from every managed shard.
    #[must_use]
    pub fn subscribe(&self, events: EventTypeFlags) -> mpsc::UnboundedReceiver<Event> {
        self.0.listeners.subscribe(events)
    }

    /// Per-event-type dispatch counters, aggregated across every shard.
    #[must_use]
    pub fn event_counts(&self) -> &EventCounts {
        &self.0.counts
    }

    /// Send `message` to every ready shard, returning the number it was
    /// sent to.
    pub async fn broadcast(&self, message: Message) -> usize {
        let shards = self.0.shards.lock().await;
        let mut sent = 0;

        for handle in shards.values() {
            if handle.ready.load(Ordering::Relaxed) && handle.sender.send(message.clone()).is_ok() {
                sent += 1;
            }
        }

        sent
    }

    /// Send `message` to a specific shard.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerErrorType::ShardNonexistent`] if no shard with `id`
    /// is managed by this manager.
    pub async fn send_to_shard(&self, id: u64, message: Message) -> Result<(), ManagerError> {
        let shards = self.0.shards.lock().await;
        let handle = shards
            .get(&id)
            .ok_or_else(|| ManagerError::new(ManagerErrorType::ShardNonexistent { id }, None))?;

        let _ = handle.sender.send(message);
        Ok(())
    }

    /// Abort every managed shard's receive task.
    pub async fn shutdown(&self) {
        let mut shards = self.0.shards.lock().await;

        for (_, handle) in shards.drain() {
            handle.join.abort();
        }

        self.0.listeners.clear();
    }
}
