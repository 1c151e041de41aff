// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Learned recovery candidate source: a linear model trained offline and
//! loaded at runtime, scored online by a pure function. The trainer that
//! produces the weights is out of scope; the feature extraction it would
//! share with this online path is implemented and tested here.

use orc_core::{CandidateSource, DeadLetterEntry, FailureKind, RecoveryAction, RecoveryCandidate};
use serde::Deserialize;

/// Feature vector shared by the (out-of-scope) offline trainer and this
/// online scorer: `[kind_ordinal, attempts, historical_success_rate]`.
pub fn extract_features(kind: FailureKind, attempts: u32, historical_success_rate: f32) -> Vec<f32> {
    vec![kind_ordinal(kind), attempts as f32, historical_success_rate]
}

fn kind_ordinal(kind: FailureKind) -> f32 {
    match kind {
        FailureKind::Transient => 0.0,
        FailureKind::RateLimited => 1.0,
        FailureKind::Deadline => 2.0,
        FailureKind::CircuitOpen => 3.0,
        FailureKind::BudgetExceeded => 4.0,
        FailureKind::SchemaMismatch => 5.0,
        FailureKind::ParamMismatch => 6.0,
        FailureKind::NotFound => 7.0,
        FailureKind::Forbidden => 8.0,
        FailureKind::UpstreamBug => 9.0,
        FailureKind::InternalInvariant => 10.0,
    }
}

/// Scores a feature vector against a linear model, squashed through a
/// logistic sigmoid so the result is always a `[0,1]` confidence.
pub fn score(weights: &[f32], bias: f32, features: &[f32]) -> f32 {
    let dot: f32 = weights.iter().zip(features).map(|(w, f)| w * f).sum();
    1.0 / (1.0 + (-(dot + bias)).exp())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionModel {
    pub action: RecoveryAction,
    pub weights: Vec<f32>,
    pub bias: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LearnedModel {
    pub actions: Vec<ActionModel>,
    /// Candidates scoring below this floor are not emitted at all.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_min_confidence() -> f32 {
    0.05
}

impl LearnedModel {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn candidates(&self, entry: &DeadLetterEntry, historical_success_rate: f32) -> Vec<RecoveryCandidate> {
        let features = extract_features(entry.failure_kind, entry.attempts, historical_success_rate);
        self.actions
            .iter()
            .filter_map(|am| {
                let confidence = score(&am.weights, am.bias, &features);
                if confidence < self.min_confidence {
                    None
                } else {
                    Some(RecoveryCandidate::new(entry.id, am.action.clone(), confidence, CandidateSource::Learned))
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "learned_tests.rs"]
mod tests;
