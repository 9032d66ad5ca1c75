//! Trait contract tests for RuleStore, ModelStore and EssayStore.
//!
//! Each contract is written once against the trait object and run against
//! both the in-memory fakes and the SurrealDB store (`mem://`). Any
//! conforming implementation must pass these.

use grader_state::fakes::{MemoryEssayStore, MemoryModelStore, MemoryRuleStore};
use grader_state::storage_traits::*;
use grader_state::{StorageError, SurrealStore};
use serde_json::json;

async fn surreal() -> SurrealStore {
    SurrealStore::in_memory().await.unwrap()
}

fn sample_rule(name: &str, kind: RuleKind, parameters: ParameterBag) -> NewRule {
    NewRule {
        name: name.to_string(),
        description: format!("{name} description"),
        kind,
        parameters,
    }
}

fn rich_parameters() -> ParameterBag {
    ParameterBag::new()
        .with("min_words", json!(150))
        .with("forbidden", json!(["eu", "minha", "acho"]))
        .with("ratio", json!(0.25))
        .with("strict", json!(true))
        .with(
            "components",
            json!({"agent": ["governo", "escola"], "means": ["por meio de"]}),
        )
}

// ===========================================================================
// RuleStore contract
// ===========================================================================

async fn rules_start_empty(store: &dyn RuleStore) {
    assert!(store.fetch_rules().await.unwrap().is_empty());
    assert_eq!(store.count_rules().await.unwrap(), 0);
}

async fn rule_ids_are_sequential_and_fetch_is_ordered(store: &dyn RuleStore) {
    let a = store
        .insert_rule(sample_rule("A", RuleKind::NormCompliance, ParameterBag::new()))
        .await
        .unwrap();
    let b = store
        .insert_rule(sample_rule("B", RuleKind::Cohesion, ParameterBag::new()))
        .await
        .unwrap();
    let c = store
        .insert_rule(sample_rule("C", RuleKind::FirstPerson, ParameterBag::new()))
        .await
        .unwrap();

    assert_eq!((a, b, c), (RuleId(1), RuleId(2), RuleId(3)));

    let names: Vec<String> = store
        .fetch_rules()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(store.count_rules().await.unwrap(), 3);
}

async fn parameter_bag_round_trips(store: &dyn RuleStore) {
    let params = rich_parameters();
    let id = store
        .insert_rule(sample_rule("Length", RuleKind::MinimumLength, params.clone()))
        .await
        .unwrap();

    let fetched = store.fetch_rule_parameters_by_id(id).await.unwrap();
    assert_eq!(fetched, params);

    let record = store.fetch_rule(id).await.unwrap();
    assert_eq!(record.kind, RuleKind::MinimumLength);
    assert_eq!(record.parameters, params);
}

async fn empty_parameter_bag_round_trips(store: &dyn RuleStore) {
    let id = store
        .insert_rule(sample_rule("Norm", RuleKind::NormCompliance, ParameterBag::new()))
        .await
        .unwrap();
    assert!(store
        .fetch_rule_parameters_by_id(id)
        .await
        .unwrap()
        .is_empty());
}

async fn missing_rule_is_not_found(store: &dyn RuleStore) {
    let err = store
        .fetch_rule_parameters_by_id(RuleId(99))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::RuleNotFound { id: 99 }));

    let err = store.delete_rule(RuleId(99)).await.unwrap_err();
    assert!(matches!(err, StorageError::RuleNotFound { .. }));
}

async fn update_rule_applies_patch(store: &dyn RuleStore) {
    let id = store
        .insert_rule(sample_rule("Length", RuleKind::MinimumLength, ParameterBag::new()))
        .await
        .unwrap();

    let updated = store
        .update_rule(
            id,
            RulePatch {
                parameters: Some(ParameterBag::new().with("min_words", json!(200))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Length");
    assert_eq!(updated.parameters.get("min_words"), Some(&json!(200)));

    let refetched = store.fetch_rule(id).await.unwrap();
    assert_eq!(refetched.parameters.get("min_words"), Some(&json!(200)));
    assert_eq!(refetched.description, "Length description");
}

async fn delete_rule_removes_record(store: &dyn RuleStore) {
    let id = store
        .insert_rule(sample_rule("Gone", RuleKind::Referencing, ParameterBag::new()))
        .await
        .unwrap();
    store.delete_rule(id).await.unwrap();

    assert!(store.fetch_rule(id).await.is_err());
    assert_eq!(store.count_rules().await.unwrap(), 0);
}

#[tokio::test]
async fn memory_rules_start_empty() {
    rules_start_empty(&MemoryRuleStore::new()).await;
}

#[tokio::test]
async fn surreal_rules_start_empty() {
    rules_start_empty(&surreal().await).await;
}

#[tokio::test]
async fn memory_rule_ids_sequential() {
    rule_ids_are_sequential_and_fetch_is_ordered(&MemoryRuleStore::new()).await;
}

#[tokio::test]
async fn surreal_rule_ids_sequential() {
    rule_ids_are_sequential_and_fetch_is_ordered(&surreal().await).await;
}

#[tokio::test]
async fn memory_parameter_bag_round_trips() {
    parameter_bag_round_trips(&MemoryRuleStore::new()).await;
    empty_parameter_bag_round_trips(&MemoryRuleStore::new()).await;
}

#[tokio::test]
async fn surreal_parameter_bag_round_trips() {
    parameter_bag_round_trips(&surreal().await).await;
    empty_parameter_bag_round_trips(&surreal().await).await;
}

#[tokio::test]
async fn memory_missing_rule_not_found() {
    missing_rule_is_not_found(&MemoryRuleStore::new()).await;
}

#[tokio::test]
async fn surreal_missing_rule_not_found() {
    missing_rule_is_not_found(&surreal().await).await;
}

#[tokio::test]
async fn memory_update_rule() {
    update_rule_applies_patch(&MemoryRuleStore::new()).await;
}

#[tokio::test]
async fn surreal_update_rule() {
    update_rule_applies_patch(&surreal().await).await;
}

#[tokio::test]
async fn memory_delete_rule() {
    delete_rule_removes_record(&MemoryRuleStore::new()).await;
}

#[tokio::test]
async fn surreal_delete_rule() {
    delete_rule_removes_record(&surreal().await).await;
}

// ===========================================================================
// ModelStore contract
// ===========================================================================

async fn model_create_get_list(store: &dyn ModelStore) {
    let overrides =
        ParameterBag::new().with("minimum_length", json!({"min_words": 200}));
    let a = store
        .create_model("ENEM", "Redação do ENEM", overrides.clone())
        .await
        .unwrap();
    let b = store
        .create_model("Vestibular", "", ParameterBag::new())
        .await
        .unwrap();
    assert_eq!((a, b), (ModelId(1), ModelId(2)));

    let model = store.get_model(a).await.unwrap();
    assert_eq!(model.name, "ENEM");
    assert_eq!(model.parameters, overrides);

    let names: Vec<String> = store
        .list_models()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["ENEM", "Vestibular"]);
}

async fn model_update_and_not_found(store: &dyn ModelStore) {
    let id = store
        .create_model("ENEM", "", ParameterBag::new())
        .await
        .unwrap();
    let updated = store
        .update_model_parameters(id, ParameterBag::new().with("cohesion", json!({"min_count": 3})))
        .await
        .unwrap();
    assert_eq!(updated.parameters.len(), 1);

    let err = store.get_model(ModelId(42)).await.unwrap_err();
    assert!(matches!(err, StorageError::ModelNotFound { id: 42 }));
}

#[tokio::test]
async fn memory_model_contract() {
    model_create_get_list(&MemoryModelStore::new()).await;
    model_update_and_not_found(&MemoryModelStore::new()).await;
}

#[tokio::test]
async fn surreal_model_contract() {
    model_create_get_list(&surreal().await).await;
    model_update_and_not_found(&surreal().await).await;
}

// ===========================================================================
// EssayStore contract
// ===========================================================================

async fn essay_identity_is_stable(store: &dyn EssayStore) {
    let first = store
        .find_or_create_essay("ana", ModelId(1), "Mobilidade urbana")
        .await
        .unwrap();
    let again = store
        .find_or_create_essay("ana", ModelId(1), "Mobilidade urbana")
        .await
        .unwrap();
    let other_title = store
        .find_or_create_essay("ana", ModelId(1), "Outro tema")
        .await
        .unwrap();
    let other_model = store
        .find_or_create_essay("ana", ModelId(2), "Mobilidade urbana")
        .await
        .unwrap();

    assert_eq!(first.id, again.id);
    assert_ne!(first.id, other_title.id);
    assert_ne!(first.id, other_model.id);
    assert_eq!(store.get_essay(first.id).await.unwrap().student, "ana");
}

async fn versions_are_monotonic_from_one(store: &dyn EssayStore) {
    let essay = store
        .find_or_create_essay("bruno", ModelId(1), "Tema")
        .await
        .unwrap();

    let v1 = store.append_version(essay.id, "primeira versão").await.unwrap();
    let v2 = store.append_version(essay.id, "segunda versão").await.unwrap();
    let v3 = store.append_version(essay.id, "primeira versão").await.unwrap();

    assert_eq!((v1.version, v2.version, v3.version), (1, 2, 3));
    assert_eq!(v1.text_digest, v3.text_digest);
    assert_ne!(v1.text_digest, v2.text_digest);

    let listed = store.list_versions(essay.id).await.unwrap();
    let numbers: Vec<u32> = listed.iter().map(|v| v.version).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(listed[1].text, "segunda versão");
}

async fn versions_are_numbered_per_essay(store: &dyn EssayStore) {
    let a = store
        .find_or_create_essay("carla", ModelId(1), "A")
        .await
        .unwrap();
    let b = store
        .find_or_create_essay("carla", ModelId(1), "B")
        .await
        .unwrap();

    store.append_version(a.id, "a1").await.unwrap();
    store.append_version(a.id, "a2").await.unwrap();
    let b1 = store.append_version(b.id, "b1").await.unwrap();
    let a3 = store.append_version(a.id, "a3").await.unwrap();

    assert_eq!(b1.version, 1);
    assert_eq!(a3.version, 3);
    assert_eq!(store.list_versions(a.id).await.unwrap().len(), 3);
    assert_eq!(store.list_versions(b.id).await.unwrap().len(), 1);
}

async fn find_essay_does_not_create(store: &dyn EssayStore) {
    assert!(store
        .find_essay("diego", ModelId(1), "Tema")
        .await
        .unwrap()
        .is_none());

    let created = store
        .find_or_create_essay("diego", ModelId(1), "Tema")
        .await
        .unwrap();
    let found = store
        .find_essay("diego", ModelId(1), "Tema")
        .await
        .unwrap()
        .expect("essay exists after creation");
    assert_eq!(found.id, created.id);
    assert!(store
        .find_essay("diego", ModelId(2), "Tema")
        .await
        .unwrap()
        .is_none());
}

async fn delete_essay_removes_versions(store: &dyn EssayStore) {
    let kept = store
        .find_or_create_essay("eva", ModelId(1), "Fica")
        .await
        .unwrap();
    let gone = store
        .find_or_create_essay("eva", ModelId(1), "Sai")
        .await
        .unwrap();
    store.append_version(kept.id, "k1").await.unwrap();
    store.append_version(gone.id, "g1").await.unwrap();
    store.append_version(gone.id, "g2").await.unwrap();

    store.delete_essay(gone.id).await.unwrap();

    assert!(matches!(
        store.get_essay(gone.id).await.unwrap_err(),
        StorageError::EssayNotFound { .. }
    ));
    assert!(store
        .find_essay("eva", ModelId(1), "Sai")
        .await
        .unwrap()
        .is_none());
    assert_eq!(store.list_versions(kept.id).await.unwrap().len(), 1);

    let err = store.delete_essay(gone.id).await.unwrap_err();
    assert!(matches!(err, StorageError::EssayNotFound { .. }));

    let again = store
        .find_or_create_essay("eva", ModelId(1), "Sai")
        .await
        .unwrap();
    let v1 = store.append_version(again.id, "nova").await.unwrap();
    assert_eq!(v1.version, 1);
}

async fn append_to_unknown_essay_fails(store: &dyn EssayStore) {
    let err = store
        .append_version(EssayId(404), "texto")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::EssayNotFound { id: 404 }));
}

#[tokio::test]
async fn memory_essay_contract() {
    essay_identity_is_stable(&MemoryEssayStore::new()).await;
    versions_are_monotonic_from_one(&MemoryEssayStore::new()).await;
    versions_are_numbered_per_essay(&MemoryEssayStore::new()).await;
    append_to_unknown_essay_fails(&MemoryEssayStore::new()).await;
    find_essay_does_not_create(&MemoryEssayStore::new()).await;
    delete_essay_removes_versions(&MemoryEssayStore::new()).await;
}

#[tokio::test]
async fn surreal_essay_contract() {
    essay_identity_is_stable(&surreal().await).await;
    versions_are_monotonic_from_one(&surreal().await).await;
    versions_are_numbered_per_essay(&surreal().await).await;
    append_to_unknown_essay_fails(&surreal().await).await;
    find_essay_does_not_create(&surreal().await).await;
    delete_essay_removes_versions(&surreal().await).await;
}
