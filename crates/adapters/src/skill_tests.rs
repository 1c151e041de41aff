use super::*;
use std::time::Duration;

#[tokio::test]
async fn echo_skill_returns_params_unchanged() {
    let skill = EchoSkill;
    let params = serde_json::json!({"x": 1});
    let outcome = skill.invoke(&params, Duration::from_secs(1)).await;
    match outcome {
        SkillOutcome::Ok { result, .. } => assert_eq!(result, params),
        _ => panic!("expected Ok"),
    }
}

#[tokio::test]
async fn webhook_skill_fails_without_url() {
    let skill = WebhookSkill;
    let outcome = skill.invoke(&serde_json::json!({}), Duration::from_secs(1)).await;
    assert!(!outcome.is_ok());
    assert!(skill.produces_outbox());
}

#[test]
fn registry_rejects_unknown_skill() {
    let registry = SkillRegistry::new();
    assert!(registry.get("does-not-exist").is_err());
}

#[test]
fn registry_resolves_registered_skill() {
    let mut registry = SkillRegistry::new();
    registry.register("echo", std::sync::Arc::new(EchoSkill));
    assert!(registry.get("echo").is_ok());
}
