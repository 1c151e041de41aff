use super::*;

#[test]
fn budget_exceeded_is_not_retryable_by_default() {
    assert!(!FailureKind::BudgetExceeded.default_retryable());
}

#[test]
fn rate_limited_is_retryable_by_default() {
    assert!(FailureKind::RateLimited.default_retryable());
}

#[test]
fn display_matches_as_str() {
    assert_eq!(FailureKind::CircuitOpen.to_string(), "circuit_open");
    assert_eq!(FailureKind::CircuitOpen.as_str(), "circuit_open");
}

#[test]
fn serde_roundtrip() {
    let kind = FailureKind::SchemaMismatch;
    let json = serde_json::to_string(&kind).unwrap();
    let back: FailureKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, kind);
}
