// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    #[error("publish rejected: {0}")]
    PublishFailed(String),
    #[error("ack rejected, fencing token stale")]
    StaleFencingToken,
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for BrokerError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_timeout() || err.is_io_error() {
            BrokerError::Unavailable(err.to_string())
        } else {
            BrokerError::Backend(err.to_string())
        }
    }
}
