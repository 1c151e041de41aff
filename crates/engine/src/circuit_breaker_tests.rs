use super::*;

#[test]
fn closed_by_default() {
    let registry = CircuitBreakerRegistry::new(10, 0.5, 1_000);
    assert_eq!(registry.state("send_email", "smtp"), CircuitState::Closed);
    assert!(registry.allow("send_email", "smtp", 0));
}

#[test]
fn opens_after_failure_rate_crosses_threshold() {
    let registry = CircuitBreakerRegistry::new(10, 0.5, 1_000);
    for _ in 0..6 {
        registry.record("send_email", "smtp", false, 0);
    }
    assert_eq!(registry.state("send_email", "smtp"), CircuitState::Open);
    assert!(!registry.allow("send_email", "smtp", 0));
}

#[test]
fn half_opens_after_cooldown_and_recloses_on_success() {
    let registry = CircuitBreakerRegistry::new(10, 0.5, 1_000);
    for _ in 0..6 {
        registry.record("send_email", "smtp", false, 0);
    }
    assert!(registry.allow("send_email", "smtp", 1_000));
    assert_eq!(registry.state("send_email", "smtp"), CircuitState::HalfOpen);
    registry.record("send_email", "smtp", true, 1_000);
    assert_eq!(registry.state("send_email", "smtp"), CircuitState::Closed);
}

#[test]
fn half_open_failure_reopens_circuit() {
    let registry = CircuitBreakerRegistry::new(10, 0.5, 1_000);
    for _ in 0..6 {
        registry.record("send_email", "smtp", false, 0);
    }
    registry.allow("send_email", "smtp", 1_000);
    registry.record("send_email", "smtp", false, 1_000);
    assert_eq!(registry.state("send_email", "smtp"), CircuitState::Open);
}

#[test]
fn distinct_targets_track_independent_state() {
    let registry = CircuitBreakerRegistry::new(10, 0.5, 1_000);
    for _ in 0..6 {
        registry.record("send_email", "smtp", false, 0);
    }
    assert_eq!(registry.state("send_email", "webhook"), CircuitState::Closed);
}
