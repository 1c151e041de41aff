use super::*;

#[test]
fn backoff_grows_with_attempt() {
    let run_id = RunId::new();
    assert!(compute_backoff_ms(run_id, 0) < compute_backoff_ms(run_id, 3));
}

#[test]
fn backoff_is_deterministic_for_same_run_and_attempt() {
    let run_id = RunId::new();
    assert_eq!(compute_backoff_ms(run_id, 2), compute_backoff_ms(run_id, 2));
}

#[test]
fn backoff_never_exceeds_cap() {
    let run_id = RunId::new();
    assert!(compute_backoff_ms(run_id, 30) <= MAX_MS);
}

#[test]
fn different_runs_get_different_jitter() {
    let a = RunId::new();
    let b = RunId::new();
    assert_ne!(compute_backoff_ms(a, 1), compute_backoff_ms(b, 1));
}
