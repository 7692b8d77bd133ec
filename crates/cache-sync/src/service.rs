//! Cache synchronization engine.
//!
//! One coordinating loop per engine multiplexes two event sources: the
//! bounded outbound publish queue and the inbound broker subscription.
//! Exactly one task drives the loop, so the publish/broadcast/store
//! sequence needs no internal locking. The bulk loader runs as an
//! independent short-lived task and shares only the broker handle and
//! the consumer-facing record channel.

use std::sync::Arc;

use hickory_proto::op::Message;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::envelope;
use crate::domain::keys::{prefix_key, strip_prefix};
use crate::domain::ttl::{derive_store_ttl, restamp_on_read};
use crate::events::{
    CacheRecord, CachedResponse, RecordOrigin, SyncError, SyncMetrics, SyncMetricsSnapshot,
};
use crate::ports::outbound::Broker;
use crate::{SyncConfig, CACHE_CHANNEL, CACHE_KEY_PREFIX};

/// Per-process origin identifier embedded in every outbound envelope.
///
/// Generated once at engine construction, immutable afterwards, and
/// compared by value against every inbound envelope to discard our own
/// broadcasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OriginId([u8; 16]);

impl OriginId {
    fn generate() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Queued outbound publication.
struct PublishRequest {
    key: String,
    message: Message,
}

/// Cache synchronization engine.
///
/// Construction establishes broker connectivity and the channel
/// subscription, then spawns the coordinating loop. Records received
/// from peers and from bulk loads arrive on the receiver returned by
/// [`CacheSync::connect`]; the host cache is expected to drain it.
pub struct CacheSync<B: Broker> {
    broker: Arc<B>,
    origin: OriginId,
    publish_tx: mpsc::Sender<PublishRequest>,
    record_tx: mpsc::Sender<CacheRecord>,
    metrics: Arc<SyncMetrics>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl<B: Broker> CacheSync<B> {
    /// Connect the engine to a broker and start its coordinating loop.
    ///
    /// Returns `Ok(None)` when no broker address is configured: cache
    /// synchronization is disabled and no background work starts. Fails
    /// fast when the reachability probe or the subscription handshake
    /// fails; no loop is spawned in that case.
    pub async fn connect(
        config: &SyncConfig,
        broker: Arc<B>,
    ) -> Result<Option<(Self, mpsc::Receiver<CacheRecord>)>, SyncError> {
        if !config.enabled() {
            debug!("no broker address configured, cache sync disabled");
            return Ok(None);
        }

        broker.ping().await?;
        let origin = OriginId::generate();
        let inbound = broker.subscribe(CACHE_CHANNEL).await?;

        let (publish_tx, publish_rx) = mpsc::channel(config.channel_capacity);
        let (record_tx, record_rx) = mpsc::channel(config.channel_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let metrics = Arc::new(SyncMetrics::default());

        let worker = Worker {
            broker: Arc::clone(&broker),
            origin,
            record_tx: record_tx.clone(),
            metrics: Arc::clone(&metrics),
        };
        tokio::spawn(worker.run(publish_rx, inbound, shutdown_rx));

        Ok(Some((
            Self {
                broker,
                origin,
                publish_tx,
                record_tx,
                metrics,
                shutdown_tx: Some(shutdown_tx),
            },
            record_rx,
        )))
    }

    /// Queue an answer for persistence and broadcast.
    ///
    /// Lenient by design: an empty key or a missing answer is silently
    /// dropped, not an error the caller must branch on. Waits when the
    /// outbound queue is full; publish traffic is never discarded under
    /// load.
    pub async fn publish(&self, key: &str, message: Option<Message>) {
        let Some(message) = message else { return };
        if key.is_empty() {
            return;
        }

        let request = PublishRequest {
            key: key.to_owned(),
            message,
        };
        if self.publish_tx.send(request).await.is_err() {
            warn!(key, "publish dropped, sync engine closed");
            return;
        }
        self.metrics.record_published();
    }

    /// Warm the consumer from the shared store.
    ///
    /// Fire-and-forget: spawns a scan over the cache namespace and
    /// forwards every decodable entry with a positive remaining TTL as a
    /// bulk-load record. Per-key failures are logged and skipped; the
    /// scan itself never aborts. No consistent snapshot is guaranteed if
    /// entries expire or are overwritten mid-scan.
    pub fn load_all(&self) {
        let broker = Arc::clone(&self.broker);
        let record_tx = self.record_tx.clone();

        tokio::spawn(async move {
            let keys = match broker.scan(CACHE_KEY_PREFIX).await {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(error = %e, "bulk load scan failed");
                    return;
                }
            };

            debug!(keys = keys.len(), "bulk load started");
            for stored_key in keys {
                match read_entry(broker.as_ref(), &stored_key).await {
                    Ok(Some(record)) => {
                        if record_tx.send(record).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(key = %stored_key, error = %e, "bulk load entry skipped"),
                }
            }
        });
    }

    /// This instance's origin identifier.
    #[must_use]
    pub fn origin(&self) -> OriginId {
        self.origin
    }

    /// Current message-disposition counters.
    #[must_use]
    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Signal the coordinating loop to exit after its in-flight branch.
    ///
    /// Releases the subscription and the loop's channel ends. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Read one persisted entry and convert it to a bulk-load record.
///
/// Returns `Ok(None)` for entries whose remaining lifetime is already
/// zero (expired but not yet reaped by the store).
async fn read_entry<B: Broker>(
    broker: &B,
    stored_key: &str,
) -> Result<Option<CacheRecord>, SyncError> {
    let remaining = broker.remaining_ttl(stored_key).await?;
    if remaining.is_zero() {
        debug!(key = stored_key, "expired entry skipped");
        return Ok(None);
    }

    let payload = broker.get(stored_key).await?;
    let mut message = envelope::unpack_answer(&payload)?;
    restamp_on_read(&mut message, remaining);

    Ok(Some(CacheRecord {
        key: strip_prefix(stored_key),
        origin: RecordOrigin::BulkLoad,
        response: CachedResponse::external(message),
    }))
}

/// State owned by the coordinating loop task.
struct Worker<B: Broker> {
    broker: Arc<B>,
    origin: OriginId,
    record_tx: mpsc::Sender<CacheRecord>,
    metrics: Arc<SyncMetrics>,
}

impl<B: Broker> Worker<B> {
    /// Coordinating loop: multiplex the outbound queue and the inbound
    /// subscription until shutdown or until either source closes.
    async fn run(
        self,
        mut publish_rx: mpsc::Receiver<PublishRequest>,
        mut inbound: mpsc::Receiver<Vec<u8>>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        debug!("cache sync loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    debug!("cache sync loop shutting down");
                    break;
                }
                request = publish_rx.recv() => match request {
                    Some(request) => self.handle_outbound(request).await,
                    None => break,
                },
                payload = inbound.recv() => match payload {
                    Some(payload) => self.handle_inbound(&payload).await,
                    None => {
                        warn!("subscription stream closed");
                        break;
                    }
                },
            }
        }
    }

    /// Persist and broadcast one queued publication.
    ///
    /// The store write and the broadcast are independent best-effort
    /// operations: a failure in either is logged, does not affect the
    /// other, and never stalls later publishes.
    async fn handle_outbound(&self, request: PublishRequest) {
        let packed = match envelope::pack_answer(&request.message) {
            Ok(packed) => packed,
            Err(e) => {
                warn!(key = %request.key, error = %e, "answer pack failed");
                return;
            }
        };
        let ttl = derive_store_ttl(&request.message);

        if let Err(e) = self
            .broker
            .set(&prefix_key(&request.key), packed.clone(), ttl)
            .await
        {
            warn!(key = %request.key, error = %e, "store write failed");
        }

        match envelope::seal(&request.key, packed, self.origin.as_bytes()) {
            Ok(bytes) => {
                if let Err(e) = self.broker.publish(CACHE_CHANNEL, bytes).await {
                    warn!(key = %request.key, error = %e, "broadcast failed");
                }
            }
            Err(e) => warn!(key = %request.key, error = %e, "envelope seal failed"),
        }
    }

    /// Convert one inbound broadcast into a consumer record.
    ///
    /// Undecodable envelopes are logged and discarded; self-originated
    /// ones are discarded silently. Forwarding waits when the record
    /// channel is full, the same backpressure rule as publishing.
    async fn handle_inbound(&self, payload: &[u8]) {
        if payload.is_empty() {
            return;
        }

        let (env, message) = match envelope::decode(payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.metrics.record_decode_failure();
                warn!(error = %e, "inbound envelope discarded");
                return;
            }
        };

        if env.origin == self.origin.as_bytes() {
            self.metrics.record_self_dropped();
            return;
        }

        let record = CacheRecord {
            key: env.key,
            origin: RecordOrigin::PeerBroadcast,
            response: CachedResponse::external(message),
        };
        if self.record_tx.send(record).await.is_ok() {
            self.metrics.record_forwarded();
        }
    }
}
