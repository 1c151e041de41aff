// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heuristic recovery candidate generation: turns a catalog match into a
//! `RecoveryCandidate` with a fixed confidence, distinct from the learned
//! source in [`super::learned`].

use super::catalog::FailureCatalog;
use orc_core::{CandidateSource, DeadLetterEntry, RecoveryCandidate};

/// Confidence assigned to every heuristic candidate. Deterministic rules
/// are trusted more than the learned classifier by default.
pub const HEURISTIC_CONFIDENCE: f32 = 0.9;

/// Produces at most one heuristic candidate per dead letter: the catalog's
/// best match, if any, translated directly into its declared action.
pub fn heuristic_candidates(catalog: &FailureCatalog, entry: &DeadLetterEntry) -> Vec<RecoveryCandidate> {
    match catalog.best_match(entry) {
        Some(rule) => vec![RecoveryCandidate::new(entry.id, rule.action.clone(), HEURISTIC_CONFIDENCE, CandidateSource::Heuristic)],
        None => Vec::new(),
    }
}

#[cfg(test)]
#[path = "candidates_tests.rs"]
mod tests;
