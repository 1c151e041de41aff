// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("unknown skill: {0}")]
    UnknownSkill(String),
    #[error("param validation failed: {0}")]
    InvalidParams(String),
    #[error("downstream call failed: {0}")]
    Downstream(String),
}
