use super::*;
use orc_core::LockClass;

#[tokio::test]
async fn in_order_acquisition_is_fine() {
    with_lock_order_tracking(async {
        let _outer = LockOrderGuard::acquire(LockClass::OutboxLeader);
        let _inner = LockOrderGuard::acquire(LockClass::Run);
    })
    .await;
}

#[tokio::test]
#[cfg_attr(not(debug_assertions), ignore)]
#[should_panic(expected = "lock order violation")]
async fn out_of_order_acquisition_panics_in_debug() {
    with_lock_order_tracking(async {
        let _outer = LockOrderGuard::acquire(LockClass::IdempotencyRecord);
        let _inner = LockOrderGuard::acquire(LockClass::OutboxLeader);
    })
    .await;
}

#[tokio::test]
async fn guard_drop_releases_held_class() {
    with_lock_order_tracking(async {
        {
            let _outer = LockOrderGuard::acquire(LockClass::IdempotencyRecord);
        }
        let _again = LockOrderGuard::acquire(LockClass::OutboxLeader);
    })
    .await;
}
