// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP `DeliveryAdapter` for the outbox processor (C4). Delivers a
//! webhook-shaped outbox entry by POSTing its payload to `target`, with the
//! downstream idempotency key forwarded as a header so a well-behaved
//! receiver can dedupe retried deliveries.

use async_trait::async_trait;
use orc_engine::outbox::{DeliveryAdapter, DeliveryResult};

pub struct HttpDeliveryAdapter {
    client: reqwest::Client,
}

impl HttpDeliveryAdapter {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for HttpDeliveryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryAdapter for HttpDeliveryAdapter {
    async fn deliver(&self, target: &str, payload: &[u8], idempotency_key: &str) -> DeliveryResult {
        let response = self
            .client
            .post(target)
            .header("Idempotency-Key", idempotency_key)
            .header("Content-Type", "application/json")
            .body(payload.to_vec())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => DeliveryResult::Delivered,
            Ok(resp) if resp.status().is_client_error() => DeliveryResult::Permanent,
            Ok(_) => DeliveryResult::Retryable,
            Err(e) if e.is_timeout() || e.is_connect() => DeliveryResult::Retryable,
            Err(_) => DeliveryResult::Permanent,
        }
    }
}
