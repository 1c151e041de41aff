use super::*;

#[test]
fn new_run_starts_queued() {
    let run = Run::new(TenantId::new(), "agent-1", vec![], 0);
    assert_eq!(run.status, RunStatus::Queued);
    assert!(!run.is_terminal());
    assert!(run.parent_run_id.is_none());
}

#[test]
fn start_moves_queued_to_running() {
    let mut run = Run::new(TenantId::new(), "agent-1", vec![], 0);
    run.start(10).unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.started_at_ms, Some(10));
}

#[test]
fn start_rejects_non_queued_run() {
    let mut run = Run::new(TenantId::new(), "agent-1", vec![], 0);
    run.start(10).unwrap();
    assert!(run.start(20).is_err());
}

#[test]
fn terminal_transition_is_one_way() {
    let mut run = Run::new(TenantId::new(), "agent-1", vec![], 0);
    run.start(10).unwrap();
    run.transition_terminal(RunStatus::Succeeded, 20).unwrap();
    assert!(run.is_terminal());
    assert_eq!(run.completed_at_ms, Some(20));
    assert!(run.transition_terminal(RunStatus::Failed, 30).is_err());
}

#[test]
fn reinject_links_parent_and_preserves_tenant() {
    let parent = Run::builder().tenant_id(TenantId::new()).build();
    let child = Run::reinject(&parent, vec![], 5);
    assert_eq!(child.parent_run_id, Some(parent.id));
    assert_eq!(child.tenant_id, parent.tenant_id);
    assert_eq!(child.status, RunStatus::Queued);
}
