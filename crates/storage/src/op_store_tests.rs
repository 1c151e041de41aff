use super::fake::FakeOpStore;
use super::*;
use orc_core::Operation;

#[tokio::test]
async fn insert_many_is_idempotent_on_run_and_index() {
    let store = FakeOpStore::new();
    let run_id = RunId::new();
    let op = Operation::new(run_id, 0, "kv.set", serde_json::json!({}));
    store.insert_many(&[op.clone()]).await.unwrap();
    store.insert_many(&[op.clone()]).await.unwrap();
    let ops = store.list_for_run(run_id).await.unwrap();
    assert_eq!(ops.len(), 1);
}

#[tokio::test]
async fn list_for_run_is_sorted_by_index() {
    let store = FakeOpStore::new();
    let run_id = RunId::new();
    let second = Operation::new(run_id, 1, "kv.set", serde_json::json!({}));
    let first = Operation::new(run_id, 0, "kv.set", serde_json::json!({}));
    store.insert_many(&[second, first]).await.unwrap();
    let ops = store.list_for_run(run_id).await.unwrap();
    assert_eq!(ops[0].id.index, 0);
    assert_eq!(ops[1].id.index, 1);
}

#[tokio::test]
async fn release_orphaned_returns_stale_claims_to_pending() {
    let store = FakeOpStore::new();
    let run_id = RunId::new();
    let mut op = Operation::new(run_id, 0, "kv.set", serde_json::json!({}));
    op.claim(orc_core::WorkerId::new(), 100).unwrap();
    store.insert_many(&[op]).await.unwrap();

    let released = store.release_orphaned(200).await.unwrap();
    assert_eq!(released, 1);
    let op = store.get(OpId::new(run_id, 0)).await.unwrap();
    assert_eq!(op.status, orc_core::OpStatus::Pending);
}
