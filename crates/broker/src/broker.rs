// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Primary-lane broker port over Redis Streams. The queue (`engine::queue`)
//! layers the fallback lane and lane-selection policy on top of this trait;
//! this module only knows how to talk to one durable stream.

use crate::error::BrokerError;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct BrokerMessage {
    pub id: String,
    pub payload: Value,
    pub delivery_count: u32,
}

#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Appends `payload` to `stream`, partitioned implicitly by `key` (the
    /// caller hashes run id to a stream name upstream of this call).
    async fn publish(&self, stream: &str, payload: Value) -> Result<String, BrokerError>;

    /// Reads up to `max` new entries for `group`/`consumer`, blocking up to
    /// `block_ms`. Entries land on the group's pending list until acked.
    async fn consume(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        max: usize,
        block_ms: u64,
    ) -> Result<Vec<BrokerMessage>, BrokerError>;

    async fn ack(&self, stream: &str, group: &str, id: &str) -> Result<(), BrokerError>;

    /// Re-delivers `id` to `consumer` if it has been pending longer than
    /// `min_idle_ms` (XCLAIM semantics) — used to take over a crashed
    /// worker's unacked messages.
    async fn xclaim(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        id: &str,
        min_idle_ms: u64,
    ) -> Result<Option<BrokerMessage>, BrokerError>;

    async fn ensure_group(&self, stream: &str, group: &str) -> Result<(), BrokerError>;
}

pub struct RedisBroker {
    client: redis::Client,
}

impl RedisBroker {
    pub fn new(url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url).map_err(BrokerError::from)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, BrokerError> {
        self.client.get_multiplexed_async_connection().await.map_err(BrokerError::from)
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, stream: &str, payload: Value) -> Result<String, BrokerError> {
        let mut conn = self.connection().await?;
        let body = serde_json::to_string(&payload).map_err(|e| BrokerError::PublishFailed(e.to_string()))?;
        let id: String = redis::cmd("XADD")
            .arg(stream)
            .arg("*")
            .arg("payload")
            .arg(body)
            .query_async(&mut conn)
            .await
            .map_err(BrokerError::from)?;
        Ok(id)
    }

    async fn consume(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        max: usize,
        block_ms: u64,
    ) -> Result<Vec<BrokerMessage>, BrokerError> {
        let mut conn = self.connection().await?;
        let reply: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(group)
            .arg(consumer)
            .arg("COUNT")
            .arg(max)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(stream)
            .arg(">")
            .query_async(&mut conn)
            .await
            .map_err(BrokerError::from)?;

        let mut out = Vec::new();
        for key in reply.keys {
            for id_entry in key.ids {
                let payload = id_entry
                    .map
                    .get("payload")
                    .and_then(|v| redis::from_redis_value::<String>(v).ok())
                    .and_then(|s| serde_json::from_str::<Value>(&s).ok())
                    .unwrap_or(Value::Null);
                out.push(BrokerMessage { id: id_entry.id, payload, delivery_count: 1 });
            }
        }
        Ok(out)
    }

    async fn ack(&self, stream: &str, group: &str, id: &str) -> Result<(), BrokerError> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("XACK")
            .arg(stream)
            .arg(group)
            .arg(id)
            .query_async(&mut conn)
            .await
            .map_err(BrokerError::from)?;
        Ok(())
    }

    async fn xclaim(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        id: &str,
        min_idle_ms: u64,
    ) -> Result<Option<BrokerMessage>, BrokerError> {
        let mut conn = self.connection().await?;
        let reply: Vec<(String, std::collections::HashMap<String, redis::Value>)> = redis::cmd("XCLAIM")
            .arg(stream)
            .arg(group)
            .arg(consumer)
            .arg(min_idle_ms)
            .arg(id)
            .query_async(&mut conn)
            .await
            .map_err(BrokerError::from)?;

        Ok(reply.into_iter().next().map(|(id, map)| {
            let payload = map
                .get("payload")
                .and_then(|v| redis::from_redis_value::<String>(v).ok())
                .and_then(|s| serde_json::from_str::<Value>(&s).ok())
                .unwrap_or(Value::Null);
            BrokerMessage { id, payload, delivery_count: 2 }
        }))
    }

    async fn ensure_group(&self, stream: &str, group: &str) -> Result<(), BrokerError> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<String> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream)
            .arg(group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(BrokerError::from(e)),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct PendingEntry {
        payload: Value,
        consumer: String,
        delivery_count: u32,
    }

    #[derive(Default)]
    struct State {
        streams: HashMap<String, Vec<(String, Value)>>,
        pending: HashMap<(String, String), PendingEntry>,
        groups: std::collections::HashSet<(String, String)>,
    }

    /// In-memory stand-in for Redis Streams, preserving enough semantics
    /// (pending list, ack, claim) for engine-level tests.
    #[derive(Clone)]
    pub struct FakeBroker {
        state: Arc<Mutex<State>>,
        next_id: Arc<AtomicU64>,
    }

    impl Default for FakeBroker {
        fn default() -> Self {
            Self { state: Arc::new(Mutex::new(State::default())), next_id: Arc::new(AtomicU64::new(1)) }
        }
    }

    impl FakeBroker {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl Broker for FakeBroker {
        async fn publish(&self, stream: &str, payload: Value) -> Result<String, BrokerError> {
            let id = format!("{}-0", self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut state = self.state.lock();
            state.streams.entry(stream.to_string()).or_default().push((id.clone(), payload));
            Ok(id)
        }

        async fn consume(
            &self,
            stream: &str,
            group: &str,
            consumer: &str,
            max: usize,
            _block_ms: u64,
        ) -> Result<Vec<BrokerMessage>, BrokerError> {
            let mut state = self.state.lock();
            let entries = state.streams.get_mut(stream).cloned().unwrap_or_default();
            let mut claimed_ids: Vec<String> =
                state.pending.keys().filter(|(s, _)| s == stream).map(|(_, id)| id.clone()).collect();
            claimed_ids.sort();

            let mut out = Vec::new();
            for (id, payload) in entries {
                if claimed_ids.contains(&id) {
                    continue;
                }
                if out.len() >= max {
                    break;
                }
                state.pending.insert(
                    (stream.to_string(), id.clone()),
                    PendingEntry { payload: payload.clone(), consumer: consumer.to_string(), delivery_count: 1 },
                );
                out.push(BrokerMessage { id, payload, delivery_count: 1 });
            }
            state.groups.insert((stream.to_string(), group.to_string()));
            Ok(out)
        }

        async fn ack(&self, stream: &str, _group: &str, id: &str) -> Result<(), BrokerError> {
            self.state.lock().pending.remove(&(stream.to_string(), id.to_string()));
            Ok(())
        }

        async fn xclaim(
            &self,
            stream: &str,
            _group: &str,
            consumer: &str,
            id: &str,
            _min_idle_ms: u64,
        ) -> Result<Option<BrokerMessage>, BrokerError> {
            let mut state = self.state.lock();
            let key = (stream.to_string(), id.to_string());
            if let Some(entry) = state.pending.get_mut(&key) {
                entry.consumer = consumer.to_string();
                entry.delivery_count += 1;
                return Ok(Some(BrokerMessage {
                    id: id.to_string(),
                    payload: entry.payload.clone(),
                    delivery_count: entry.delivery_count,
                }));
            }
            Ok(None)
        }

        async fn ensure_group(&self, stream: &str, group: &str) -> Result<(), BrokerError> {
            self.state.lock().groups.insert((stream.to_string(), group.to_string()));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBroker;

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
