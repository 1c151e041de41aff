// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate. Every
//! override uses the `ORC_` prefix; `Config::load` consults these after
//! defaults and the TOML file have been merged.

use std::time::Duration;

/// Postgres connection string. Required; no default.
pub fn database_url() -> Option<String> {
    std::env::var("ORC_DATABASE_URL").ok().filter(|s| !s.is_empty())
}

/// Redis connection string for the primary queue lane.
pub fn broker_url() -> Option<String> {
    std::env::var("ORC_BROKER_URL").ok().filter(|s| !s.is_empty())
}

/// Path to the layered TOML config file, if any.
pub fn config_path() -> Option<String> {
    std::env::var("ORC_CONFIG_PATH").ok().filter(|s| !s.is_empty())
}

/// Path to the failure catalog TOML file. Empty catalog (no heuristic
/// recovery candidates) when unset.
pub fn catalog_path() -> Option<String> {
    std::env::var("ORC_CATALOG_PATH").ok().filter(|s| !s.is_empty())
}

pub fn lock_lease_ms() -> Option<u64> {
    std::env::var("ORC_LOCK_LEASE_MS").ok().and_then(|s| s.parse().ok())
}

pub fn op_deadline_ms() -> Option<u64> {
    std::env::var("ORC_OP_DEADLINE_MS").ok().and_then(|s| s.parse().ok())
}

pub fn max_attempts() -> Option<u32> {
    std::env::var("ORC_MAX_ATTEMPTS").ok().and_then(|s| s.parse().ok())
}

pub fn outbox_batch() -> Option<usize> {
    std::env::var("ORC_OUTBOX_BATCH").ok().and_then(|s| s.parse().ok())
}

pub fn maintenance_period_ms() -> Option<u64> {
    std::env::var("ORC_MAINTENANCE_PERIOD_MS").ok().and_then(|s| s.parse().ok())
}

pub fn retention_ms() -> Option<u64> {
    std::env::var("ORC_RETENTION_MS").ok().and_then(|s| s.parse().ok())
}

/// Graceful-shutdown drain timeout (default 5s, `ORC_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("ORC_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

pub fn worker_id() -> Option<String> {
    std::env::var("ORC_WORKER_ID").ok().filter(|s| !s.is_empty())
}

pub fn log_filter() -> String {
    std::env::var("ORC_LOG").unwrap_or_else(|_| "info".to_string())
}
