use super::*;

#[test]
fn lock_record_expiry_is_inclusive() {
    let record = LockRecord {
        resource: "outbox-leader".to_string(),
        holder: WorkerId::new(),
        acquired_at_ms: 0,
        lease_expires_at_ms: 1000,
        fencing_token: 1,
    };
    assert!(!record.is_expired(999));
    assert!(record.is_expired(1000));
}

#[test]
fn lock_class_order_is_outbox_then_run_then_idempotency() {
    assert!(LockClass::OutboxLeader < LockClass::Run);
    assert!(LockClass::Run < LockClass::IdempotencyRecord);
}
