// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-adapters: the skill adapter trait, the registry skills are looked up
//! through, and the handful of skills this core ships (echo/noop/webhook).
//! Real skill bodies (HTTP, email, KV, embeddings) register against
//! `SkillRegistry` from outside this crate.

pub mod error;
pub mod outcome;
pub mod skill;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::SkillError;
pub use outcome::SkillOutcome;
pub use skill::{EchoSkill, NoopSkill, SkillAdapter, SkillRegistration, SkillRegistry, WebhookSkill};

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSkillAdapter;
