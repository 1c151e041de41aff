use super::*;
use orc_core::{FailureKind, OpId, RunId};

const CATALOG: &str = r#"
[[rule]]
name = "rate-limited-default"
kind = "RateLimited"
action = { type = "retry_as_is" }
retryable = true
priority = 0
"#;

#[test]
fn matching_entry_yields_one_heuristic_candidate() {
    let catalog = FailureCatalog::from_toml_str(CATALOG).unwrap();
    let entry = orc_core::DeadLetterEntry::new(
        OpId::new(RunId::new(), 0),
        "skill",
        Vec::new(),
        FailureKind::RateLimited,
        "429",
        1,
        0,
        true,
    );
    let candidates = heuristic_candidates(&catalog, &entry);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].source, CandidateSource::Heuristic);
    assert_eq!(candidates[0].confidence, HEURISTIC_CONFIDENCE);
}

#[test]
fn non_matching_entry_yields_no_candidates() {
    let catalog = FailureCatalog::from_toml_str(CATALOG).unwrap();
    let entry = orc_core::DeadLetterEntry::new(
        OpId::new(RunId::new(), 0),
        "skill",
        Vec::new(),
        FailureKind::Forbidden,
        "403",
        1,
        0,
        true,
    );
    assert!(heuristic_candidates(&catalog, &entry).is_empty());
}
