//! Export a configuration from one store and import it into another
//!
//! Run with `RUST_LOG=confport=debug cargo run --example roundtrip` to see
//! every reference being resolved.

use confport::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CONFIGURATION: &str = "petstore-sync";

fn seed(store: &InMemoryEntityStore) -> Result<()> {
    let member = || vec![CONFIGURATION.to_string()];

    let mut source = Source::new("Petstore API");
    source.location = "https://petstore.example/v2".to_string();
    source.password = Some("not-for-export".to_string());
    source.configuration = json!({
        "headers.Authorization": "Bearer secret",
        "headers.Accept": "application/json"
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    source.configurations = member();
    let source = store.seed(source)?;
    let source_id = source.id().map(|id| id.to_string());

    let mut address = Mapping::new("Address");
    address.mapping = json!({"street": "{{ street }}"})
        .as_object()
        .cloned()
        .unwrap_or_default();
    // Only called from a template, so not a configuration member
    let address = store.seed(address)?;

    let mut pet = Mapping::new("Pet to animal");
    pet.source_id = source_id.clone();
    pet.mapping = json!({
        "name": "{{ name }}",
        "home": format!("{{{{ executeMapping('{}', address) }}}}", address.slug())
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    pet.configurations = member();
    let pet = store.seed(pet)?;

    let mut rule = Rule::new("Require owner");
    rule.rule_type = "error".to_string();
    rule.configuration = json!({"mapping": pet.id(), "sourceId": source_id});
    rule.configurations = member();
    let rule = store.seed(rule)?;

    let mut sync = Synchronization::new("Pets");
    sync.source_id = source_id.clone();
    sync.source_type = Some("api".to_string());
    sync.source_target_mapping = pet.id().map(|id| id.to_string());
    sync.actions = rule.id().map(|id| id.to_string()).into_iter().collect();
    sync.configurations = member();
    let sync = store.seed(sync)?;

    let mut job = Job::new("Nightly pets");
    job.job_class = "SynchronizationAction".to_string();
    job.arguments = json!({"synchronizationId": sync.id()})
        .as_object()
        .cloned()
        .unwrap_or_default();
    job.configurations = member();
    store.seed(job)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("confport=info")),
        )
        .init();

    let origin = InMemoryEntityStore::new();
    seed(&origin)?;

    let exporter = ConfigurationService::new(Arc::new(origin), PortConfig::default())?;
    let document = exporter.export_configuration(CONFIGURATION).await?;
    let json = document.to_json_pretty()?;
    println!("Exported document:\n{}", json);

    // The target already has an unrelated source, so ids shift
    let target = InMemoryEntityStore::new();
    target.seed(Source::new("Legacy CRM"))?;

    let importer = ConfigurationService::new(Arc::new(target.clone()), PortConfig::default())?;
    let report = importer
        .import_configuration(
            &ExportDocument::from_json(&json)?,
            &ImportOptions::into_configuration(CONFIGURATION),
        )
        .await?;

    println!(
        "Imported {} entities, {} failures",
        report.imported_count(),
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {} {:?}: {}", failure.entity_type, failure.slug, failure.error);
    }

    let reexported = importer.export_configuration(CONFIGURATION).await?;
    println!("Re-exported from target:\n{}", reexported.to_json_pretty()?);

    Ok(())
}
