// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery candidate persistence port (C5).

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{CandidateId, CandidateSource, CandidateStatus, DeadLetterId, RecoveryAction, RecoveryCandidate};

type CandidateRow = (String, String, serde_json::Value, f32, String, String, Option<String>, Option<i64>);

fn parse_candidate_status(s: &str) -> Result<CandidateStatus, StorageError> {
    match s {
        "Proposed" => Ok(CandidateStatus::Proposed),
        "Approved" => Ok(CandidateStatus::Approved),
        "Rejected" => Ok(CandidateStatus::Rejected),
        "Executed" => Ok(CandidateStatus::Executed),
        other => Err(StorageError::Backend(format!("unknown candidate status {other}"))),
    }
}

fn parse_candidate_source(s: &str) -> Result<CandidateSource, StorageError> {
    match s {
        "Heuristic" => Ok(CandidateSource::Heuristic),
        "Learned" => Ok(CandidateSource::Learned),
        other => Err(StorageError::Backend(format!("unknown candidate source {other}"))),
    }
}

fn row_to_candidate(row: CandidateRow) -> Result<RecoveryCandidate, StorageError> {
    let (id, dead_letter_id, action, confidence, source, status, approver, decided_at_ms) = row;
    let action: RecoveryAction = serde_json::from_value(action)?;
    Ok(RecoveryCandidate {
        id: CandidateId::from_string(id),
        dead_letter_id: DeadLetterId::from_string(dead_letter_id),
        action,
        confidence,
        source: parse_candidate_source(&source)?,
        status: parse_candidate_status(&status)?,
        approver,
        decided_at_ms: decided_at_ms.map(|v| v as u64),
    })
}

#[async_trait]
pub trait CandidateStore: Send + Sync + 'static {
    async fn insert(&self, candidate: &RecoveryCandidate) -> Result<(), StorageError>;
    async fn get(&self, id: CandidateId) -> Result<RecoveryCandidate, StorageError>;
    async fn list_for_dead_letter(&self, dead_letter_id: DeadLetterId) -> Result<Vec<RecoveryCandidate>, StorageError>;
    async fn list_pending_approval(&self) -> Result<Vec<RecoveryCandidate>, StorageError>;
    async fn save(&self, candidate: &RecoveryCandidate) -> Result<(), StorageError>;
}

pub struct PgCandidateStore {
    pool: sqlx::PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn insert(&self, candidate: &RecoveryCandidate) -> Result<(), StorageError> {
        let action = serde_json::to_value(&candidate.action)?;
        sqlx::query(
            "INSERT INTO recovery_candidates (id, dead_letter_id, action, confidence, source, status) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(candidate.id.as_str())
        .bind(candidate.dead_letter_id.as_str())
        .bind(action)
        .bind(candidate.confidence)
        .bind(format!("{:?}", candidate.source))
        .bind(format!("{:?}", candidate.status))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: CandidateId) -> Result<RecoveryCandidate, StorageError> {
        let row: Option<CandidateRow> = sqlx::query_as(
            "SELECT id, dead_letter_id, action, confidence, source, status, approver, decided_at_ms \
             FROM recovery_candidates WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_candidate(row),
            None => Err(StorageError::NotFound(id.as_str().to_string())),
        }
    }

    async fn list_for_dead_letter(&self, dead_letter_id: DeadLetterId) -> Result<Vec<RecoveryCandidate>, StorageError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            "SELECT id, dead_letter_id, action, confidence, source, status, approver, decided_at_ms \
             FROM recovery_candidates WHERE dead_letter_id = $1",
        )
        .bind(dead_letter_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_candidate).collect()
    }

    async fn list_pending_approval(&self) -> Result<Vec<RecoveryCandidate>, StorageError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            "SELECT id, dead_letter_id, action, confidence, source, status, approver, decided_at_ms \
             FROM recovery_candidates WHERE status = 'Proposed'",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_candidate).collect()
    }

    async fn save(&self, candidate: &RecoveryCandidate) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE recovery_candidates SET status = $2, approver = $3, decided_at_ms = $4 WHERE id = $1",
        )
        .bind(candidate.id.as_str())
        .bind(format!("{:?}", candidate.status))
        .bind(&candidate.approver)
        .bind(candidate.decided_at_ms.map(|v| v as i64))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use dashmap::DashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeCandidateStore {
        candidates: Arc<DashMap<CandidateId, RecoveryCandidate>>,
    }

    impl FakeCandidateStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl CandidateStore for FakeCandidateStore {
        async fn insert(&self, candidate: &RecoveryCandidate) -> Result<(), StorageError> {
            self.candidates.insert(candidate.id, candidate.clone());
            Ok(())
        }

        async fn get(&self, id: CandidateId) -> Result<RecoveryCandidate, StorageError> {
            self.candidates
                .get(&id)
                .map(|c| c.clone())
                .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))
        }

        async fn list_for_dead_letter(&self, dead_letter_id: DeadLetterId) -> Result<Vec<RecoveryCandidate>, StorageError> {
            Ok(self
                .candidates
                .iter()
                .filter(|c| c.dead_letter_id == dead_letter_id)
                .map(|c| c.clone())
                .collect())
        }

        async fn list_pending_approval(&self) -> Result<Vec<RecoveryCandidate>, StorageError> {
            Ok(self
                .candidates
                .iter()
                .filter(|c| c.status == CandidateStatus::Proposed)
                .map(|c| c.clone())
                .collect())
        }

        async fn save(&self, candidate: &RecoveryCandidate) -> Result<(), StorageError> {
            if !self.candidates.contains_key(&candidate.id) {
                return Err(StorageError::NotFound(candidate.id.as_str().to_string()));
            }
            self.candidates.insert(candidate.id, candidate.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCandidateStore;

#[cfg(test)]
#[path = "candidate_store_tests.rs"]
mod tests;
