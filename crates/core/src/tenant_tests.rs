use super::*;
use crate::id::TenantId;

#[test]
fn manual_policy_never_auto_executes() {
    let policy = TenantPolicy::manual(TenantId::new());
    assert!(!policy.auto_executes(0.99));
}

#[test]
fn auto_policy_respects_threshold() {
    let mut policy = TenantPolicy::manual(TenantId::new());
    policy.approval_mode = ApprovalMode::Auto;
    policy.auto_threshold = 0.8;
    assert!(policy.auto_executes(0.8));
    assert!(!policy.auto_executes(0.79));
}

#[test]
fn default_approval_mode_is_manual() {
    assert_eq!(ApprovalMode::default(), ApprovalMode::Manual);
}
