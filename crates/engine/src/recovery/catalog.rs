// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure catalog (C5): a declarative table of matchers loaded from TOML,
//! mapping archived failures to a default recovery action.

use orc_core::{DeadLetterEntry, FailureKind, RecoveryAction};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid matcher regex in rule {rule}: {source}")]
    BadRegex { rule: String, source: regex::Error },
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(rename = "rule")]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    name: String,
    kind: FailureKind,
    /// Optional regex matched against the dead-letter's `last_error`. A rule
    /// with no matcher matches any error of the given `kind`.
    matcher: Option<String>,
    action: RawAction,
    retryable: bool,
    #[serde(default)]
    priority: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawAction {
    RetryAsIs,
    RetryWithTransform { transform: String },
    RouteToAltSkill { skill: String },
    Abort,
}

impl From<RawAction> for RecoveryAction {
    fn from(raw: RawAction) -> Self {
        match raw {
            RawAction::RetryAsIs => RecoveryAction::RetryAsIs,
            RawAction::RetryWithTransform { transform } => RecoveryAction::RetryWithTransform { transform },
            RawAction::RouteToAltSkill { skill } => RecoveryAction::RouteToAltSkill { skill },
            RawAction::Abort => RecoveryAction::Abort,
        }
    }
}

#[derive(Clone)]
pub struct CatalogRule {
    pub name: String,
    pub kind: FailureKind,
    matcher: Option<Regex>,
    pub action: RecoveryAction,
    pub retryable: bool,
    pub priority: u32,
}

impl CatalogRule {
    /// Specificity used to break ties when more than one rule matches:
    /// a rule with a regex matcher is considered more specific than one
    /// that matches on `kind` alone.
    fn specificity(&self) -> u32 {
        if self.matcher.is_some() {
            1
        } else {
            0
        }
    }

    fn matches(&self, entry: &DeadLetterEntry) -> bool {
        if entry.failure_kind != self.kind {
            return false;
        }
        match &self.matcher {
            Some(re) => re.is_match(&entry.last_error),
            None => true,
        }
    }
}

#[derive(Default, Clone)]
pub struct FailureCatalog {
    rules: Vec<CatalogRule>,
}

impl FailureCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(s)?;
        let mut rules = Vec::with_capacity(raw.rules.len());
        for r in raw.rules {
            let matcher = match r.matcher {
                Some(pattern) => Some(Regex::new(&pattern).map_err(|source| CatalogError::BadRegex { rule: r.name.clone(), source })?),
                None => None,
            };
            rules.push(CatalogRule {
                name: r.name,
                kind: r.kind,
                matcher,
                action: r.action.into(),
                retryable: r.retryable,
                priority: r.priority,
            });
        }
        Ok(Self { rules })
    }

    /// Longest/most-specific match wins; ties broken by declared priority
    /// (higher wins), then by catalog order.
    pub fn best_match(&self, entry: &DeadLetterEntry) -> Option<&CatalogRule> {
        self.rules
            .iter()
            .filter(|r| r.matches(entry))
            .max_by_key(|r| (r.specificity(), r.priority))
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
