// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios for the recovery and durable execution core, run
//! against in-memory fakes. Each module covers one failure/recovery path
//! that spans admission, execution, and maintenance rather than a single
//! crate's unit boundary.

mod support;

mod s1_crash_between_commit_and_ack;
mod s2_idempotency_key_param_reuse;
mod s3_rate_limited_recovery;
mod s4_dead_letter_to_recovery;
mod s5_broker_outage_fallback;
mod s6_replay_mismatch_detection;
