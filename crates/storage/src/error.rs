// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-layer error type. Library code in this crate never returns
//! `anyhow::Error` or `Box<dyn Error>` — every port method returns
//! `Result<T, StorageError>`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("idempotency key {key} reused with a different parameter fingerprint")]
    ParamMismatch { key: String },

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound(err.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => StorageError::Unavailable(err.to_string()),
            other => StorageError::Backend(other.to_string()),
        }
    }
}
