// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),
    #[error(transparent)]
    Storage(#[from] orc_storage::StorageError),
    #[error(transparent)]
    Broker(#[from] orc_broker::BrokerError),
    #[error(transparent)]
    Skill(#[from] orc_adapters::SkillError),
    #[error("lock order violation: attempted to acquire {0:?} while holding {1:?}")]
    LockOrderViolation(orc_core::LockClass, orc_core::LockClass),
    #[error("invariant violated: {0}")]
    Invariant(String),
}
