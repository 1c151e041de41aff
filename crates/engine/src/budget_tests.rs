use super::*;
use orc_core::RunId;

#[test]
fn consume_within_budget_succeeds_and_accumulates() {
    let tracker = BudgetTracker::new();
    let run_id = RunId::new();
    assert!(tracker.try_consume(run_id, 3.0, 10.0));
    assert!(tracker.try_consume(run_id, 4.0, 10.0));
    assert_eq!(tracker.spent(run_id), 7.0);
}

#[test]
fn consume_over_budget_is_rejected_and_does_not_partially_apply() {
    let tracker = BudgetTracker::new();
    let run_id = RunId::new();
    assert!(tracker.try_consume(run_id, 8.0, 10.0));
    assert!(!tracker.try_consume(run_id, 5.0, 10.0));
    assert_eq!(tracker.spent(run_id), 8.0);
}

#[test]
fn distinct_runs_have_independent_budgets() {
    let tracker = BudgetTracker::new();
    let a = RunId::new();
    let b = RunId::new();
    assert!(tracker.try_consume(a, 10.0, 10.0));
    assert!(tracker.try_consume(b, 10.0, 10.0));
}
