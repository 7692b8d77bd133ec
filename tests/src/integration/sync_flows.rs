//! # Cache Synchronization Flows
//!
//! Tests that independent sync engines sharing one broker converge:
//!
//! 1. **Publish fan-out**: an answer published by instance A reaches
//!    instance B as a peer-broadcast record, and never loops back to A.
//! 2. **Persistence**: the store holds the packed answer with the
//!    record-derived TTL.
//! 3. **Restart warm-up**: a fresh instance bulk-loads persisted answers
//!    published before it existed.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use cache_sync::domain::keys::prefix_key;
    use cache_sync::{Broker, CacheSync, InMemoryBroker, RecordOrigin, SyncConfig};

    use hickory_proto::op::{Message, MessageType, Query};
    use hickory_proto::rr::rdata::A;
    use hickory_proto::rr::{Name, RData, Record, RecordType};
    use std::str::FromStr;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("cache_sync=debug")
            .with_test_writer()
            .try_init();
    }

    /// Build a response for `name` with a single A record.
    fn answer(name: &str, ip: [u8; 4], ttl: u32) -> Message {
        let name = Name::from_str(name).unwrap();
        let mut message = Message::new();
        message.set_message_type(MessageType::Response);
        message.add_query(Query::query(name.clone(), RecordType::A));
        message.add_answer(Record::from_rdata(
            name,
            ttl,
            RData::A(A::new(ip[0], ip[1], ip[2], ip[3])),
        ));
        message
    }

    async fn connect(
        broker: &Arc<InMemoryBroker>,
    ) -> (
        CacheSync<InMemoryBroker>,
        tokio::sync::mpsc::Receiver<cache_sync::CacheRecord>,
    ) {
        CacheSync::connect(&SyncConfig::for_testing(), Arc::clone(broker))
            .await
            .expect("broker reachable")
            .expect("sync enabled")
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_publish_reaches_peer_but_not_self() {
        init_tracing();
        let broker = Arc::new(InMemoryBroker::new());

        let (instance_a, mut records_a) = connect(&broker).await;
        let (_instance_b, mut records_b) = connect(&broker).await;

        instance_a
            .publish("example.com./A", Some(answer("example.com.", [1, 2, 3, 4], 300)))
            .await;

        // B decodes the broadcast, sees a foreign origin, and forwards it.
        let record = timeout(Duration::from_secs(1), records_b.recv())
            .await
            .expect("timeout")
            .expect("record");
        assert_eq!(record.key, "example.com./A");
        assert_eq!(record.origin, RecordOrigin::PeerBroadcast);
        assert_eq!(record.response.message.answers().len(), 1);
        assert_eq!(record.response.message.answers()[0].ttl(), 300);

        // A receives the same broadcast, sees its own origin, and emits
        // nothing.
        let looped = timeout(Duration::from_millis(200), records_a.recv()).await;
        assert!(looped.is_err());
        assert_eq!(instance_a.metrics().self_dropped, 1);
    }

    #[tokio::test]
    async fn test_publish_persists_with_record_ttl() {
        init_tracing();
        let broker = Arc::new(InMemoryBroker::new());
        let (instance_a, _records_a) = connect(&broker).await;

        instance_a
            .publish("example.com./A", Some(answer("example.com.", [1, 2, 3, 4], 300)))
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let remaining = broker
            .remaining_ttl(&prefix_key("example.com./A"))
            .await
            .expect("entry persisted");
        assert!(remaining > Duration::from_secs(295));
        assert!(remaining <= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_restarted_instance_warms_from_store() {
        init_tracing();
        let broker = Arc::new(InMemoryBroker::new());

        let (instance_a, _records_a) = connect(&broker).await;
        instance_a
            .publish("one.example./A", Some(answer("one.example.", [1, 1, 1, 1], 120)))
            .await;
        instance_a
            .publish("two.example./A", Some(answer("two.example.", [2, 2, 2, 2], 240)))
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        // A "restarted" instance joins after the publishes and warms its
        // cache from the store alone.
        let (instance_c, mut records_c) = connect(&broker).await;
        instance_c.load_all();

        let mut keys = Vec::new();
        while let Ok(Some(record)) = timeout(Duration::from_millis(300), records_c.recv()).await {
            assert_eq!(record.origin, RecordOrigin::BulkLoad);
            assert!(!record.response.message.answers().is_empty());
            keys.push(record.key);
            if keys.len() == 2 {
                break;
            }
        }

        keys.sort();
        assert_eq!(
            keys,
            vec!["one.example./A".to_owned(), "two.example./A".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_concurrent_publishers_converge() {
        init_tracing();
        let broker = Arc::new(InMemoryBroker::new());

        let (instance_a, _records_a) = connect(&broker).await;
        let (instance_b, _records_b) = connect(&broker).await;
        let (_instance_c, mut records_c) = connect(&broker).await;

        // Same key from two instances; the store keeps whichever write
        // landed last, and the observer sees both broadcasts in some
        // order.
        instance_a
            .publish("race.example./A", Some(answer("race.example.", [1, 0, 0, 1], 60)))
            .await;
        instance_b
            .publish("race.example./A", Some(answer("race.example.", [2, 0, 0, 2], 60)))
            .await;

        let mut seen = 0;
        while let Ok(Some(record)) = timeout(Duration::from_millis(500), records_c.recv()).await {
            assert_eq!(record.key, "race.example./A");
            assert_eq!(record.origin, RecordOrigin::PeerBroadcast);
            seen += 1;
            if seen == 2 {
                break;
            }
        }
        assert_eq!(seen, 2);

        // The persisted entry is one of the two published answers.
        let payload = broker
            .get(&prefix_key("race.example./A"))
            .await
            .expect("entry persisted");
        assert!(!payload.is_empty());
    }
}
