use super::fake::FakeAuditStore;
use super::*;
use orc_core::RunId;
use serde_json::json;

#[tokio::test]
async fn list_for_run_filters_by_run_id() {
    let store = FakeAuditStore::new();
    let run_id = RunId::new();
    store
        .append(AuditRecord {
            run_id: Some(run_id),
            event: "run_started".to_string(),
            detail: json!({}),
            recorded_at_ms: 0,
        })
        .await
        .unwrap();
    store
        .append(AuditRecord {
            run_id: Some(RunId::new()),
            event: "run_started".to_string(),
            detail: json!({}),
            recorded_at_ms: 1,
        })
        .await
        .unwrap();

    let records = store.list_for_run(run_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, "run_started");
}

#[tokio::test]
async fn append_accepts_records_with_no_run_id() {
    let store = FakeAuditStore::new();
    store
        .append(AuditRecord {
            run_id: None,
            event: "maintenance_tick".to_string(),
            detail: json!({"phase": "outbox_drain"}),
            recorded_at_ms: 0,
        })
        .await
        .unwrap();
}
