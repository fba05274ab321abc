//! End-to-end export and import tests
//!
//! A configuration is exported from one in-memory store and imported into
//! another whose ids do not line up with the first.

use confport::prelude::*;
use serde_json::json;
use std::sync::Arc;

const CONFIGURATION: &str = "pets";

fn object(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn id_of(entity: &Entity) -> String {
    entity.id().unwrap().to_string()
}

/// Seed the exporting environment
///
/// The `address` mapping is not a member of the configuration; it is only
/// called from the `pet` template.
fn seed_origin() -> InMemoryEntityStore {
    let store = InMemoryEntityStore::new();
    let member = || vec![CONFIGURATION.to_string()];

    let mut register = Register::new("Reg A");
    register.id = Some(12);
    store.seed(register).unwrap();
    let mut schema = Schema::new("Sch B");
    schema.id = Some(34);
    store.seed(schema).unwrap();

    let mut source = Source::new("Petstore");
    source.location = "https://petstore.example".to_string();
    source.username = Some("admin".to_string());
    source.password = Some("hunter2".to_string());
    source.configuration = object(json!({
        "headers.Authorization": "Bearer abc",
        "headers.Accept": "application/json"
    }));
    source.configurations = member();
    let source = store.seed(source).unwrap();

    let mut pet = Mapping::new("Pet");
    pet.source_id = Some(id_of(&source));
    pet.mapping = object(json!({
        "name": "{{ name }}",
        "home": "{{ executeMapping('address', address) }}"
    }));
    pet.configurations = member();
    let pet = store.seed(pet).unwrap();

    let mut address = Mapping::new("Address");
    address.mapping = object(json!({"street": "{{ street }}"}));
    store.seed(address).unwrap();

    let mut rule_a = Rule::new("Rule A");
    rule_a.configuration = json!({"mapping": pet.id()});
    rule_a.configurations = member();
    let rule_a = store.seed(rule_a).unwrap();
    let mut rule_b = Rule::new("Rule B");
    rule_b.configurations = member();
    let rule_b = store.seed(rule_b).unwrap();

    let mut endpoint = Endpoint::new("Pets");
    endpoint.endpoint = "pets".to_string();
    endpoint.input_mapping = Some(id_of(&pet));
    endpoint.output_mapping = Some("404".to_string());
    endpoint.target_type = Some("register/schema".to_string());
    endpoint.target_id = Some("12/34".to_string());
    endpoint.rules = vec![id_of(&rule_a), id_of(&rule_b), "99".to_string()];
    endpoint.configurations = member();
    store.seed(endpoint).unwrap();

    let mut sync = Synchronization::new("Pets sync");
    sync.source_id = Some(id_of(&source));
    sync.source_type = Some("api".to_string());
    sync.source_target_mapping = Some(id_of(&pet));
    sync.actions = vec![id_of(&rule_a), "manual".to_string()];
    sync.configurations = member();
    let sync = store.seed(sync).unwrap();

    let mut job = Job::new("Nightly");
    job.arguments = object(json!({"synchronizationId": sync.id()}));
    job.configurations = member();
    store.seed(job).unwrap();

    store
}

/// Seed an environment with unrelated entities so ids are taken
fn seed_target() -> InMemoryEntityStore {
    let store = InMemoryEntityStore::new();
    store.seed(Source::new("Legacy")).unwrap();
    store.seed(Mapping::new("Legacy one")).unwrap();
    store.seed(Mapping::new("Legacy two")).unwrap();
    store.seed(Rule::new("Legacy rule")).unwrap();

    let mut register = Register::new("Reg A");
    register.id = Some(3);
    store.seed(register).unwrap();
    let mut schema = Schema::new("Sch B");
    schema.id = Some(4);
    store.seed(schema).unwrap();
    store
}

fn service(store: &InMemoryEntityStore) -> ConfigurationService {
    ConfigurationService::new(Arc::new(store.clone()), PortConfig::default()).unwrap()
}

async fn export_origin() -> ExportDocument {
    service(&seed_origin())
        .export_configuration(CONFIGURATION)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_export_document_is_portable() {
    let document = export_origin().await;

    assert_eq!(document.configuration_id, CONFIGURATION);
    for records in document.entities.values() {
        for record in records {
            assert!(record.contains_key("slug"));
            assert!(!record.contains_key("id"));
            assert!(!record.contains_key("uuid"));
        }
    }

    let job = document.find(EntityType::Job, "nightly").unwrap();
    assert_eq!(job["arguments"]["synchronizationId"], json!("pets-sync"));

    let sync = document.find(EntityType::Synchronization, "pets-sync").unwrap();
    assert_eq!(sync["sourceId"], json!("petstore"));
    assert_eq!(sync["sourceTargetMapping"], json!("pet"));
    assert_eq!(sync["actions"], json!(["rule-a", "manual"]));

    let rule = document.find(EntityType::Rule, "rule-a").unwrap();
    assert_eq!(rule["configuration"], json!({"mapping": "pet"}));
}

#[tokio::test]
async fn test_composite_target_uses_register_and_schema_slugs() {
    let document = export_origin().await;
    let endpoint = document.find(EntityType::Endpoint, "pets").unwrap();
    assert_eq!(endpoint["targetId"], json!("reg-a/sch-b"));
}

#[tokio::test]
async fn test_unknown_reference_is_left_unchanged() {
    let document = export_origin().await;
    let endpoint = document.find(EntityType::Endpoint, "pets").unwrap();
    assert_eq!(endpoint["outputMapping"], json!("404"));
}

#[tokio::test]
async fn test_endpoint_rules_drop_unresolved_entries() {
    let document = export_origin().await;
    let endpoint = document.find(EntityType::Endpoint, "pets").unwrap();
    assert_eq!(endpoint["rules"], json!(["rule-a", "rule-b"]));
}

#[tokio::test]
async fn test_source_credentials_are_stripped() {
    let document = export_origin().await;
    let source = document.find(EntityType::Source, "petstore").unwrap();

    assert!(!source.contains_key("username"));
    assert!(!source.contains_key("password"));
    assert_eq!(
        source["configuration"],
        json!({"headers.Accept": "application/json"})
    );
    assert_eq!(source["location"], json!("https://petstore.example"));
}

#[tokio::test]
async fn test_mapping_called_from_template_is_bundled() {
    let document = export_origin().await;
    let slugs: Vec<&str> = document
        .records(EntityType::Mapping)
        .iter()
        .filter_map(|r| r["slug"].as_str())
        .collect();
    assert_eq!(slugs, vec!["pet", "address"]);
}

#[tokio::test]
async fn test_transitive_mappings_can_be_disabled() {
    let config = PortConfig {
        include_transitive_mappings: false,
        ..Default::default()
    };
    let exporter = ConfigurationService::new(Arc::new(seed_origin()), config).unwrap();
    let document = exporter.export_configuration(CONFIGURATION).await.unwrap();
    assert!(document.find(EntityType::Mapping, "address").is_none());
}

#[tokio::test]
async fn test_import_rewrites_references_to_target_ids() {
    let document = export_origin().await;
    let target = seed_target();
    let report = service(&target)
        .import_configuration(&document, &ImportOptions::into_configuration(CONFIGURATION))
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.imported_count(), document.entity_count());

    let source_id = id_of(report.find(EntityType::Source, "petstore").unwrap());
    let pet_id = id_of(report.find(EntityType::Mapping, "pet").unwrap());
    let rule_a_id = id_of(report.find(EntityType::Rule, "rule-a").unwrap());
    let rule_b_id = id_of(report.find(EntityType::Rule, "rule-b").unwrap());
    let sync_id = id_of(report.find(EntityType::Synchronization, "pets-sync").unwrap());
    assert_eq!(source_id, "2");
    assert_eq!(pet_id, "3");

    let Some(Entity::Endpoint(endpoint)) = report.find(EntityType::Endpoint, "pets") else {
        panic!("endpoint not imported");
    };
    assert_eq!(endpoint.input_mapping.as_deref(), Some(pet_id.as_str()));
    assert_eq!(endpoint.output_mapping.as_deref(), Some("404"));
    assert_eq!(endpoint.target_id.as_deref(), Some("3/4"));
    assert_eq!(endpoint.rules, vec![rule_a_id.clone(), rule_b_id]);
    assert_eq!(endpoint.configurations, vec![CONFIGURATION.to_string()]);

    let Some(Entity::Synchronization(sync)) = report.find(EntityType::Synchronization, "pets-sync")
    else {
        panic!("synchronization not imported");
    };
    assert_eq!(sync.source_id.as_deref(), Some(source_id.as_str()));
    assert_eq!(sync.source_target_mapping.as_deref(), Some(pet_id.as_str()));
    assert_eq!(sync.actions, vec![rule_a_id, "manual".to_string()]);

    let Some(Entity::Job(job)) = report.find(EntityType::Job, "nightly") else {
        panic!("job not imported");
    };
    assert_eq!(job.arguments["synchronizationId"], json!(sync_id));

    let Some(Entity::Mapping(pet)) = report.find(EntityType::Mapping, "pet") else {
        panic!("mapping not imported");
    };
    assert_eq!(pet.source_id.as_deref(), Some(source_id.as_str()));
    assert_eq!(
        pet.mapping["home"],
        json!("{{ executeMapping('address', address) }}")
    );
}

#[tokio::test]
async fn test_import_is_idempotent() {
    let document = export_origin().await;
    let target = seed_target();
    let importer = service(&target);

    let first = importer
        .import_configuration(&document, &ImportOptions::default())
        .await
        .unwrap();
    let mappings_after_first = target.count(EntityType::Mapping).unwrap();

    let second = importer
        .import_configuration(&document, &ImportOptions::default())
        .await
        .unwrap();

    assert!(second.is_success());
    assert_eq!(target.count(EntityType::Mapping).unwrap(), mappings_after_first);
    assert_eq!(target.count(EntityType::Source).unwrap(), 2);
    for entity_type in EntityType::HANDLED {
        let first_ids: Vec<_> = first.entities(entity_type).iter().map(Entity::id).collect();
        let second_ids: Vec<_> = second.entities(entity_type).iter().map(Entity::id).collect();
        assert_eq!(first_ids, second_ids, "{} ids changed", entity_type);
    }
}

#[tokio::test]
async fn test_round_trip_through_json_reproduces_document() {
    let document = export_origin().await;
    let parsed = ExportDocument::from_json(&document.to_json_pretty().unwrap()).unwrap();

    let target = InMemoryEntityStore::new();
    let importer = service(&target);
    let report = importer
        .import_configuration(&parsed, &ImportOptions::into_configuration(CONFIGURATION))
        .await
        .unwrap();
    assert!(report.is_success(), "{:?}", report.failures);

    let reexported = importer.export_configuration(CONFIGURATION).await.unwrap();
    assert_eq!(reexported.entities, document.entities);
}

#[tokio::test]
async fn test_failed_entity_does_not_discard_others() {
    let mut document = export_origin().await;
    document
        .entities
        .get_mut("rule")
        .unwrap()
        .push(object(json!({"slug": "nameless"})));

    let target = InMemoryEntityStore::new();
    let report = service(&target)
        .import_configuration(&document, &ImportOptions::default())
        .await
        .unwrap();

    assert!(!report.aborted);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].slug.as_deref(), Some("nameless"));
    assert_eq!(report.failures[0].error_code, "MISSING_FIELD");
    assert_eq!(report.imported_count(), document.entity_count() - 1);
    assert!(report.find(EntityType::Job, "nightly").is_some());
}

#[tokio::test]
async fn test_abort_stops_after_first_failure() {
    let mut document = export_origin().await;
    document
        .entities
        .get_mut("rule")
        .unwrap()
        .insert(0, object(json!({"slug": "nameless"})));

    let target = InMemoryEntityStore::new();
    let options = ImportOptions {
        on_import_error: Some(OnImportError::Abort),
        ..Default::default()
    };
    let report = service(&target)
        .import_configuration(&document, &options)
        .await
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.failures.len(), 1);
    // sources and mappings come before rules and stay committed
    assert_eq!(target.count(EntityType::Source).unwrap(), 1);
    assert_eq!(target.count(EntityType::Mapping).unwrap(), 2);
    assert_eq!(target.count(EntityType::Rule).unwrap(), 0);
    assert_eq!(target.count(EntityType::Job).unwrap(), 0);
}

/// References to entities that come later in the import order
fn seed_forward_references() -> InMemoryEntityStore {
    let store = InMemoryEntityStore::new();
    let member = || vec![CONFIGURATION.to_string()];

    let mut hook = Endpoint::new("Hook");
    hook.endpoint = "hook".to_string();
    hook.configurations = member();
    let hook = store.seed(hook).unwrap();

    let mut nightly = Job::new("Nightly");
    nightly.configurations = member();
    let nightly = store.seed(nightly).unwrap();

    let mut notify = Rule::new("Notify");
    notify.configuration = json!({"endpoint": hook.id(), "jobId": nightly.id()});
    notify.configurations = member();
    store.seed(notify).unwrap();

    let mut first = Synchronization::new("First");
    first.id = Some(10);
    first.follow_ups = vec!["20".to_string()];
    first.configurations = member();
    store.seed(first).unwrap();

    let mut later = Synchronization::new("Later");
    later.id = Some(20);
    later.configurations = member();
    store.seed(later).unwrap();

    store
}

#[tokio::test]
async fn test_import_resolves_references_to_later_entities() {
    let document = service(&seed_forward_references())
        .export_configuration(CONFIGURATION)
        .await
        .unwrap();
    let first = document.find(EntityType::Synchronization, "first").unwrap();
    assert_eq!(first["followUps"], json!(["later"]));
    let notify = document.find(EntityType::Rule, "notify").unwrap();
    assert_eq!(notify["configuration"], json!({"endpoint": "hook", "jobId": "nightly"}));

    let target = InMemoryEntityStore::new();
    let importer = service(&target);
    let report = importer
        .import_configuration(&document, &ImportOptions::into_configuration(CONFIGURATION))
        .await
        .unwrap();
    assert!(report.is_success(), "{:?}", report.failures);

    let later_id = id_of(report.find(EntityType::Synchronization, "later").unwrap());
    let hook_id = id_of(report.find(EntityType::Endpoint, "hook").unwrap());
    let nightly_id = id_of(report.find(EntityType::Job, "nightly").unwrap());

    let Some(Entity::Synchronization(first)) = report.find(EntityType::Synchronization, "first")
    else {
        panic!("synchronization not imported");
    };
    assert_eq!(first.follow_ups, vec![later_id.clone()]);

    let Some(Entity::Rule(notify)) = report.find(EntityType::Rule, "notify") else {
        panic!("rule not imported");
    };
    assert_eq!(
        notify.configuration,
        json!({"endpoint": hook_id, "jobId": nightly_id})
    );

    let stored = target
        .find(EntityType::Synchronization, first.id.unwrap())
        .await
        .unwrap();
    let Entity::Synchronization(stored) = stored else {
        panic!("expected synchronization");
    };
    assert_eq!(stored.follow_ups, vec![later_id]);

    let reexported = importer.export_configuration(CONFIGURATION).await.unwrap();
    assert_eq!(reexported.entities, document.entities);
}
