// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The metrics port (§6): a narrow `MetricsSink` trait so `orc-engine`
//! never links a concrete metrics-exposition crate. The daemon wires a
//! real sink in production; tests use `NoopMetricsSink`.

pub trait MetricsSink: Send + Sync + 'static {
    fn queue_depth(&self, lane: &str, depth: u64);
    fn outbox_pending(&self, count: u64);
    fn idempotency_cache_hit(&self, hit: bool);
    fn circuit_breaker_state(&self, target: &str, open: bool);
    fn recovery_candidate_proposed(&self, source: &str);
    fn replay_mismatch(&self);
    /// A `FailureKind::InternalInvariant` was raised; a production sink
    /// wires this to paging (§7).
    fn invariant_violation(&self, component: &str);
}

/// Default sink: every call is a no-op. Used in tests and whenever no
/// metrics backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn queue_depth(&self, _lane: &str, _depth: u64) {}
    fn outbox_pending(&self, _count: u64) {}
    fn idempotency_cache_hit(&self, _hit: bool) {}
    fn circuit_breaker_state(&self, _target: &str, _open: bool) {}
    fn recovery_candidate_proposed(&self, _source: &str) {}
    fn replay_mismatch(&self) {}
    fn invariant_violation(&self, _component: &str) {}
}

/// Logs every call through `tracing` at the default target. Does not link
/// a concrete exposition format (Prometheus, statsd, ...); a real
/// deployment would pair this with a crate that scrapes the same events or
/// replace it outright with one that pushes to an exposition endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn queue_depth(&self, lane: &str, depth: u64) {
        tracing::debug!(lane, depth, "queue depth");
    }

    fn outbox_pending(&self, count: u64) {
        tracing::debug!(count, "outbox pending");
    }

    fn idempotency_cache_hit(&self, hit: bool) {
        tracing::trace!(hit, "idempotency claim");
    }

    fn circuit_breaker_state(&self, target: &str, open: bool) {
        tracing::debug!(target = %target, open, "circuit breaker state");
    }

    fn recovery_candidate_proposed(&self, source: &str) {
        tracing::info!(source, "recovery candidate proposed");
    }

    fn replay_mismatch(&self) {
        tracing::warn!("replay mismatch detected");
    }

    fn invariant_violation(&self, component: &str) {
        tracing::error!(target: "audit", component, "internal invariant violated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_every_call_without_panicking() {
        let sink = NoopMetricsSink;
        sink.queue_depth("primary", 3);
        sink.outbox_pending(0);
        sink.idempotency_cache_hit(true);
        sink.circuit_breaker_state("slack", false);
        sink.recovery_candidate_proposed("heuristic");
        sink.replay_mismatch();
        sink.invariant_violation("worker");
    }
}
