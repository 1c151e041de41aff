// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable work queue's single logical API. Lane selection (Redis
//! Streams primary vs. Postgres fallback) is internal to `TwoLaneQueue`;
//! callers only see `Queue`.

use crate::backoff::compute_backoff_ms;
use crate::error::EngineError;
use orc_broker::{Broker, HealthTracker};
use orc_core::{OpId, RunId};
use orc_storage::{FallbackQueueStore, OpStore};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct QueuedOp {
    pub op_id: OpId,
    pub payload: Value,
    pub attempt: u32,
    /// Opaque handle the lane implementation needs to ack/nack: either a
    /// broker message id (primary) or nothing (fallback, identified by op id).
    pub lane_token: LaneToken,
}

#[derive(Debug, Clone)]
pub enum LaneToken {
    Primary { message_id: String },
    Fallback,
}

#[async_trait::async_trait]
pub trait Queue: Send + Sync + 'static {
    async fn enqueue(&self, op_id: OpId, payload: Value, now_ms: u64) -> Result<(), EngineError>;
    async fn claim(&self, consumer: &str, max: usize, now_ms: u64) -> Result<Vec<QueuedOp>, EngineError>;
    async fn ack(&self, op: &QueuedOp) -> Result<(), EngineError>;
    async fn nack(&self, op: &QueuedOp, attempt: u32, now_ms: u64) -> Result<(), EngineError>;

    /// Drains fallback-lane backlog back to the primary lane. Queues with
    /// no fallback lane of their own are a no-op.
    async fn reconcile_fallback(&self, _max: usize, _now_ms: u64) -> Result<usize, EngineError> {
        Ok(0)
    }
}

/// Stream name ops of a given run are hashed onto, so a run's ops are
/// always read back in the order a single partition preserves.
fn stream_for_run(run_id: RunId) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in run_id.as_str().as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("orc:ops:{}", hash % 16)
}

pub struct TwoLaneQueue<B: Broker, F: FallbackQueueStore, O: OpStore> {
    broker: Arc<B>,
    fallback: Arc<F>,
    ops: Arc<O>,
    health: Arc<HealthTracker>,
    group: String,
}

impl<B: Broker, F: FallbackQueueStore, O: OpStore> TwoLaneQueue<B, F, O> {
    pub fn new(broker: Arc<B>, fallback: Arc<F>, ops: Arc<O>, health: Arc<HealthTracker>, group: impl Into<String>) -> Self {
        Self { broker, fallback, ops, health, group: group.into() }
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }
}

#[async_trait::async_trait]
impl<B: Broker, F: FallbackQueueStore, O: OpStore> Queue for TwoLaneQueue<B, F, O> {
    async fn enqueue(&self, op_id: OpId, payload: Value, now_ms: u64) -> Result<(), EngineError> {
        if self.health.is_unhealthy() {
            self.fallback.enqueue(op_id, payload, now_ms).await?;
            return Ok(());
        }

        let stream = stream_for_run(op_id.run_id);
        match self.broker.publish(&stream, payload.clone()).await {
            Ok(_) => {
                self.health.record(true);
                Ok(())
            }
            Err(_) => {
                self.health.record(false);
                self.fallback.enqueue(op_id, payload, now_ms).await?;
                Ok(())
            }
        }
    }

    async fn claim(&self, consumer: &str, max: usize, now_ms: u64) -> Result<Vec<QueuedOp>, EngineError> {
        let mut out = Vec::new();

        if !self.health.is_unhealthy() {
            let remaining_streams: Vec<String> = (0..16).map(|i| format!("orc:ops:{i}")).collect();
            for stream in remaining_streams {
                if out.len() >= max {
                    break;
                }
                self.broker.ensure_group(&stream, &self.group).await.ok();
                match self.broker.consume(&stream, &self.group, consumer, max - out.len(), 0).await {
                    Ok(messages) => {
                        self.health.record(true);
                        for m in messages {
                            if let Some(op_id) = op_id_from_payload(&m.payload) {
                                out.push(QueuedOp {
                                    op_id,
                                    payload: m.payload,
                                    attempt: m.delivery_count,
                                    lane_token: LaneToken::Primary { message_id: m.id },
                                });
                            }
                        }
                    }
                    Err(_) => {
                        self.health.record(false);
                        break;
                    }
                }
            }
        }

        if out.len() < max {
            let items = self.fallback.claim(max - out.len(), now_ms).await?;
            for item in items {
                out.push(QueuedOp { op_id: item.op_id, payload: item.payload, attempt: item.attempt, lane_token: LaneToken::Fallback });
            }
        }

        let _ = &self.ops;
        Ok(out)
    }

    async fn ack(&self, op: &QueuedOp) -> Result<(), EngineError> {
        match &op.lane_token {
            LaneToken::Primary { message_id } => {
                let stream = stream_for_run(op.op_id.run_id);
                self.broker.ack(&stream, &self.group, message_id).await?;
            }
            LaneToken::Fallback => {
                self.fallback.ack(op.op_id).await?;
            }
        }
        Ok(())
    }

    async fn nack(&self, op: &QueuedOp, attempt: u32, now_ms: u64) -> Result<(), EngineError> {
        let delay_ms = compute_backoff_ms(op.op_id.run_id, attempt);
        match &op.lane_token {
            LaneToken::Primary { message_id } => {
                // Primary lane has no native delayed-redelivery; the op
                // falls back to the DB lane to honor the backoff delay. Ack
                // the original message so it leaves the consumer group's
                // pending list — otherwise it sits there forever, since
                // nothing reclaims it once it's been handed to the fallback
                // lane instead.
                let stream = stream_for_run(op.op_id.run_id);
                self.fallback.enqueue(op.op_id, op.payload.clone(), now_ms).await?;
                self.fallback.nack(op.op_id, delay_ms, now_ms).await?;
                self.broker.ack(&stream, &self.group, message_id).await?;
            }
            LaneToken::Fallback => {
                self.fallback.nack(op.op_id, delay_ms, now_ms).await?;
            }
        }
        Ok(())
    }

    /// Drains up to `max` fallback-lane items back onto the primary broker
    /// now that it looks healthy again. Stops at the first publish failure
    /// so a relapse doesn't spin through the whole backlog.
    async fn reconcile_fallback(&self, max: usize, now_ms: u64) -> Result<usize, EngineError> {
        if self.health.is_unhealthy() {
            return Ok(0);
        }

        let items = self.fallback.claim(max, now_ms).await?;
        let mut migrated = 0;
        for item in items {
            let stream = stream_for_run(item.op_id.run_id);
            match self.broker.publish(&stream, item.payload.clone()).await {
                Ok(_) => {
                    self.health.record(true);
                    self.fallback.ack(item.op_id).await?;
                    migrated += 1;
                }
                Err(_) => {
                    self.health.record(false);
                    break;
                }
            }
        }
        Ok(migrated)
    }
}

fn op_id_from_payload(payload: &Value) -> Option<OpId> {
    let run_id = payload.get("run_id")?.as_str()?;
    let index = payload.get("op_index")?.as_u64()?;
    Some(OpId { run_id: RunId::from_string(run_id), index: index as u32 })
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
