use super::fake::FakeOutboxStore;
use super::*;
use orc_core::{OpId, RunId};

#[tokio::test]
async fn claim_batch_only_returns_visible_pending_entries() {
    let store = FakeOutboxStore::new();
    let not_yet = OutboxEntry::new(OpId::new(RunId::new(), 0), "slack", vec![], "dk-1", 500);
    let ready = OutboxEntry::new(OpId::new(RunId::new(), 1), "slack", vec![], "dk-2", 0);
    store.insert(&not_yet).await.unwrap();
    store.insert(&ready).await.unwrap();

    let claimed = store.claim_batch(10, 100).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, ready.id);
}

#[tokio::test]
async fn claim_batch_respects_max() {
    let store = FakeOutboxStore::new();
    for i in 0..5 {
        let entry = OutboxEntry::new(OpId::new(RunId::new(), i), "slack", vec![], format!("dk-{i}"), 0);
        store.insert(&entry).await.unwrap();
    }
    let claimed = store.claim_batch(2, 100).await.unwrap();
    assert_eq!(claimed.len(), 2);
}

#[tokio::test]
async fn pending_count_excludes_delivered() {
    let store = FakeOutboxStore::new();
    let entry = OutboxEntry::new(OpId::new(RunId::new(), 0), "slack", vec![], "dk-1", 0);
    store.insert(&entry).await.unwrap();
    assert_eq!(store.pending_count().await.unwrap(), 1);
    store.mark_delivered(entry.id).await.unwrap();
    assert_eq!(store.pending_count().await.unwrap(), 0);
}
