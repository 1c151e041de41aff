use super::fake::FakeCandidateStore;
use super::*;
use orc_core::RecoveryCandidate;

#[tokio::test]
async fn insert_then_get_roundtrips() {
    let store = FakeCandidateStore::new();
    let candidate = RecoveryCandidate::builder().build();
    store.insert(&candidate).await.unwrap();
    let fetched = store.get(candidate.id).await.unwrap();
    assert_eq!(fetched.id, candidate.id);
}

#[tokio::test]
async fn list_pending_approval_excludes_decided_candidates() {
    let store = FakeCandidateStore::new();
    let proposed = RecoveryCandidate::builder().build();
    let mut approved = RecoveryCandidate::builder().build();
    approved.approve("alice", 10).unwrap();
    store.insert(&proposed).await.unwrap();
    store.insert(&approved).await.unwrap();

    let pending = store.list_pending_approval().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, proposed.id);
}

#[tokio::test]
async fn list_for_dead_letter_filters_by_source() {
    let store = FakeCandidateStore::new();
    let dl_id = orc_core::DeadLetterId::new();
    let mut matching = RecoveryCandidate::builder().build();
    matching.dead_letter_id = dl_id;
    let other = RecoveryCandidate::builder().build();
    store.insert(&matching).await.unwrap();
    store.insert(&other).await.unwrap();

    let results = store.list_for_dead_letter(dl_id).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, matching.id);
}
