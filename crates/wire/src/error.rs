// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// The narrow set of errors visible to a `submit-run` caller. Anything more
/// specific than this is an internal detail the submitter can't act on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("queue unavailable")]
    QueueUnavailable,
    #[error("tenant budget exceeded")]
    BudgetExceeded,
    #[error("forbidden")]
    Forbidden,
    #[error("idempotency key reused with different plan")]
    ParamMismatch,
    #[error("run not found: {0}")]
    RunNotFound(String),
    #[error("run already terminal, cannot cancel")]
    AlreadyTerminal,
}
