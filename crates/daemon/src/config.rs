// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered daemon configuration: defaults, then an optional TOML file, then
//! `ORC_`-prefixed environment overrides. Loaded once at startup into an
//! immutable `Config`, passed by `Arc` to every component; no global statics.

use serde::Deserialize;
use thiserror::Error;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ORC_DATABASE_URL is not set and no database_url is configured")]
    MissingDatabaseUrl,
    #[error("ORC_BROKER_URL is not set and no broker_url is configured")]
    MissingBrokerUrl,
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

/// On-disk TOML shape. Every field is optional; absent fields fall back to
/// built-in defaults, then to the matching `ORC_*` environment variable.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database_url: Option<String>,
    broker_url: Option<String>,
    worker_id: Option<String>,
    lock_lease_ms: Option<u64>,
    op_deadline_ms: Option<u64>,
    max_attempts: Option<u32>,
    budget_max: Option<f64>,
    outbox_batch: Option<usize>,
    maintenance_period_ms: Option<u64>,
    retention_ms: Option<u64>,
    claim_batch: Option<usize>,
    catalog_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub broker_url: String,
    pub worker_id: String,
    pub lock_lease_ms: u64,
    pub op_deadline_ms: u64,
    pub max_attempts: u32,
    pub budget_max: f64,
    pub outbox_batch: usize,
    pub maintenance_period_ms: u64,
    pub retention_ms: u64,
    pub claim_batch: usize,
    pub catalog_path: Option<String>,
}

impl Config {
    /// Defaults used when neither the config file nor the environment name
    /// a value. Conservative: short leases, small batches, bounded retries.
    fn defaults() -> FileConfig {
        FileConfig {
            database_url: None,
            broker_url: None,
            worker_id: None,
            lock_lease_ms: Some(30_000),
            op_deadline_ms: Some(30_000),
            max_attempts: Some(5),
            budget_max: Some(100.0),
            outbox_batch: Some(50),
            maintenance_period_ms: Some(10_000),
            retention_ms: Some(30 * 24 * 60 * 60 * 1_000),
            claim_batch: Some(10),
            catalog_path: None,
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        let mut merged = Self::defaults();

        if let Some(path) = env::config_path() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path: path.clone(), source })?;
            let file: FileConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
            merge(&mut merged, file);
        }

        let database_url = env::database_url().or(merged.database_url).ok_or(ConfigError::MissingDatabaseUrl)?;
        let broker_url = env::broker_url().or(merged.broker_url).ok_or(ConfigError::MissingBrokerUrl)?;
        let worker_id = env::worker_id().or(merged.worker_id).unwrap_or_else(default_worker_id);

        Ok(Config {
            database_url,
            broker_url,
            worker_id,
            lock_lease_ms: env::lock_lease_ms().or(merged.lock_lease_ms).unwrap_or(30_000),
            op_deadline_ms: env::op_deadline_ms().or(merged.op_deadline_ms).unwrap_or(30_000),
            max_attempts: env::max_attempts().or(merged.max_attempts).unwrap_or(5),
            budget_max: merged.budget_max.unwrap_or(100.0),
            outbox_batch: env::outbox_batch().or(merged.outbox_batch).unwrap_or(50),
            maintenance_period_ms: env::maintenance_period_ms().or(merged.maintenance_period_ms).unwrap_or(10_000),
            retention_ms: env::retention_ms().or(merged.retention_ms).unwrap_or(30 * 24 * 60 * 60 * 1_000),
            claim_batch: merged.claim_batch.unwrap_or(10),
            catalog_path: env::catalog_path().or(merged.catalog_path),
        })
    }
}

fn merge(base: &mut FileConfig, file: FileConfig) {
    base.database_url = file.database_url.or(base.database_url.take());
    base.broker_url = file.broker_url.or(base.broker_url.take());
    base.worker_id = file.worker_id.or(base.worker_id.take());
    base.lock_lease_ms = file.lock_lease_ms.or(base.lock_lease_ms);
    base.op_deadline_ms = file.op_deadline_ms.or(base.op_deadline_ms);
    base.max_attempts = file.max_attempts.or(base.max_attempts);
    base.budget_max = file.budget_max.or(base.budget_max);
    base.outbox_batch = file.outbox_batch.or(base.outbox_batch);
    base.maintenance_period_ms = file.maintenance_period_ms.or(base.maintenance_period_ms);
    base.retention_ms = file.retention_ms.or(base.retention_ms);
    base.claim_batch = file.claim_batch.or(base.claim_batch);
    base.catalog_path = file.catalog_path.or(base.catalog_path.take());
}

fn default_worker_id() -> String {
    format!("orcd-{}", std::process::id())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
