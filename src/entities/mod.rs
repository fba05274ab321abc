//! Portable entity types
//!
//! Six integration entities (sources, endpoints, mappings, rules, jobs and
//! synchronizations) plus the two register-side types they point at.
//! Reference fields hold the numeric id of the referenced entity as text.

pub mod macros;
pub mod refs;

use crate::core::entity::{ConfigEntity, EntityType, Record};
use crate::core::error::EntityError;
use crate::core::slug::Slugifier;
use macros::impl_config_entity;
use serde_json::Value;
use uuid::Uuid;

pub(crate) fn default_version() -> String {
    "0.0.1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_source_type() -> String {
    "api".to_string()
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_interval() -> u64 {
    3600
}

impl_config_entity!(
    /// An external system data is read from or written to
    Source,
    EntityType::Source,
    {
        #[serde(default)]
        location: String,

        /// Kind of source: api, database, soap, ...
        #[serde(rename = "type", default = "default_source_type")]
        source_type: String,

        #[serde(default = "default_true")]
        is_enabled: bool,

        /// Authentication scheme name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization_header: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization_passthrough: Option<bool>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        authentication_config: Option<Value>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization_keys: Option<Value>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        jwt: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        jwt_id: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        apikey: Option<String>,

        /// Default request headers
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<Value>,

        /// Client configuration, either flat (`headers.Accept`) or nested
        #[serde(default)]
        configuration: Record,
    }
);

impl_config_entity!(
    /// A public endpoint that forwards requests to a source or register
    Endpoint,
    EntityType::Endpoint,
    {
        /// Path template, e.g. `pets/{{id}}`
        #[serde(default)]
        endpoint: String,

        #[serde(default)]
        endpoint_array: Vec<String>,

        #[serde(default = "default_method")]
        method: String,

        /// `api`, `database` or `register/schema`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_type: Option<String>,

        /// Source id, or `register/schema` id pair
        #[serde(default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,

        #[serde(default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        input_mapping: Option<String>,

        #[serde(default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        output_mapping: Option<String>,

        /// Rule ids applied to requests, in order
        #[serde(default, deserialize_with = "refs::ref_list")]
        rules: Vec<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        conditions: Option<Value>,
    }
);

impl_config_entity!(
    /// A field-transformation template
    Mapping,
    EntityType::Mapping,
    {
        /// Target field -> template expression
        #[serde(default)]
        mapping: Record,

        /// Fields removed after mapping
        #[serde(default)]
        unset: Vec<String>,

        /// Target field -> cast expression
        #[serde(default)]
        cast: Record,

        #[serde(default)]
        pass_through: bool,

        #[serde(rename = "source_id", default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        source_id: Option<String>,

        #[serde(rename = "target_id", default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
    }
);

impl_config_entity!(
    /// A business rule evaluated around endpoint and synchronization calls
    Rule,
    EntityType::Rule,
    {
        /// create, read, update, delete, ...
        #[serde(default)]
        action: String,

        /// before or after
        #[serde(default)]
        timing: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        conditions: Option<Value>,

        #[serde(rename = "type", default)]
        rule_type: String,

        /// Rule-type specific settings; may reference other entities by key name
        #[serde(default)]
        configuration: Value,

        #[serde(default)]
        order: i32,

        #[serde(rename = "source_id", default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        source_id: Option<String>,

        #[serde(rename = "target_id", default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
    }
);

impl_config_entity!(
    /// A scheduled job
    Job,
    EntityType::Job,
    {
        #[serde(default)]
        job_class: String,

        /// Job arguments; `synchronizationId`, `endpointId` and `sourceId`
        /// hold references
        #[serde(default)]
        arguments: Record,

        /// Seconds between runs
        #[serde(default = "default_interval")]
        interval: u64,

        #[serde(default)]
        execution_time: u64,

        #[serde(default = "default_true")]
        is_enabled: bool,

        #[serde(default)]
        single_run: bool,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    }
);

impl_config_entity!(
    /// A synchronization between a source and a target
    Synchronization,
    EntityType::Synchronization,
    {
        #[serde(default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        source_id: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_type: Option<String>,

        #[serde(default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        source_target_mapping: Option<String>,

        #[serde(default)]
        source_config: Record,

        #[serde(default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_type: Option<String>,

        #[serde(default, deserialize_with = "refs::optional_ref", skip_serializing_if = "Option::is_none")]
        target_source_mapping: Option<String>,

        #[serde(default)]
        target_config: Record,

        /// Rule ids gating the synchronization
        #[serde(default, deserialize_with = "refs::ref_list")]
        conditions: Vec<String>,

        /// Rule ids applied to synchronized objects
        #[serde(default, deserialize_with = "refs::ref_list")]
        actions: Vec<String>,

        /// Synchronization ids run afterwards
        #[serde(default, deserialize_with = "refs::ref_list")]
        follow_ups: Vec<String>,
    }
);

impl_config_entity!(
    /// An object register, owned by the register system
    Register,
    EntityType::Register,
    {}
);

impl_config_entity!(
    /// An object schema, owned by the register system
    Schema,
    EntityType::Schema,
    {}
);

/// Tagged union over every entity type
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Source(Source),
    Endpoint(Endpoint),
    Mapping(Mapping),
    Rule(Rule),
    Job(Job),
    Synchronization(Synchronization),
    Register(Register),
    Schema(Schema),
}

/// Apply the same expression to whichever variant is present
macro_rules! each_variant {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Entity::Source($inner) => $body,
            Entity::Endpoint($inner) => $body,
            Entity::Mapping($inner) => $body,
            Entity::Rule($inner) => $body,
            Entity::Job($inner) => $body,
            Entity::Synchronization($inner) => $body,
            Entity::Register($inner) => $body,
            Entity::Schema($inner) => $body,
        }
    };
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Source(_) => EntityType::Source,
            Entity::Endpoint(_) => EntityType::Endpoint,
            Entity::Mapping(_) => EntityType::Mapping,
            Entity::Rule(_) => EntityType::Rule,
            Entity::Job(_) => EntityType::Job,
            Entity::Synchronization(_) => EntityType::Synchronization,
            Entity::Register(_) => EntityType::Register,
            Entity::Schema(_) => EntityType::Schema,
        }
    }

    pub fn id(&self) -> Option<i64> {
        each_variant!(self, e => e.id())
    }

    pub fn uuid(&self) -> Option<Uuid> {
        each_variant!(self, e => e.uuid())
    }

    pub fn slug(&self) -> &str {
        each_variant!(self, e => e.slug())
    }

    pub fn name(&self) -> &str {
        each_variant!(self, e => e.name())
    }

    pub fn configurations(&self) -> &[String] {
        each_variant!(self, e => e.configurations())
    }

    pub fn belongs_to(&self, configuration_id: &str) -> bool {
        each_variant!(self, e => e.belongs_to(configuration_id))
    }

    pub fn set_slug(&mut self, slug: String) {
        each_variant!(self, e => e.set_slug(slug))
    }

    /// The persisted slug, or one derived from the name (or type and id)
    /// when the persisted value is empty
    pub fn effective_slug(&self) -> String {
        if self.slug().is_empty() {
            Slugifier::for_entity(self.entity_type(), self.name(), self.id())
        } else {
            self.slug().to_string()
        }
    }

    /// Assign a derived slug if none is set. Returns true when one was assigned.
    pub fn ensure_slug(&mut self) -> bool {
        if !self.slug().is_empty() {
            return false;
        }
        let slug = self.effective_slug();
        self.set_slug(slug);
        true
    }

    /// Serialize the entity into a plain record
    pub fn to_record(&self) -> Result<Record, EntityError> {
        let value = each_variant!(self, e => serde_json::to_value(e));
        match value {
            Ok(Value::Object(record)) => Ok(record),
            Ok(other) => Err(EntityError::SerializationError {
                entity_type: self.entity_type(),
                message: format!("expected an object, got {}", other),
            }),
            Err(e) => Err(EntityError::SerializationError {
                entity_type: self.entity_type(),
                message: e.to_string(),
            }),
        }
    }

    /// Build an entity of the given type from a plain record
    pub fn from_record(entity_type: EntityType, record: Record) -> Result<Self, EntityError> {
        fn parse<T: ConfigEntity + Into<Entity>>(
            entity_type: EntityType,
            record: Record,
        ) -> Result<Entity, EntityError> {
            serde_json::from_value::<T>(Value::Object(record))
                .map(Into::into)
                .map_err(|e| EntityError::SerializationError {
                    entity_type,
                    message: e.to_string(),
                })
        }

        match entity_type {
            EntityType::Source => parse::<Source>(entity_type, record),
            EntityType::Endpoint => parse::<Endpoint>(entity_type, record),
            EntityType::Mapping => parse::<Mapping>(entity_type, record),
            EntityType::Rule => parse::<Rule>(entity_type, record),
            EntityType::Job => parse::<Job>(entity_type, record),
            EntityType::Synchronization => parse::<Synchronization>(entity_type, record),
            EntityType::Register => parse::<Register>(entity_type, record),
            EntityType::Schema => parse::<Schema>(entity_type, record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_sets_defaults() {
        let source = Source::new("Petstore");
        assert_eq!(source.name, "Petstore");
        assert_eq!(source.version, "0.0.1");
        assert!(source.slug.is_empty());
        assert!(source.id.is_none());
    }

    #[test]
    fn test_record_roundtrip_keeps_reference_fields() {
        let mut sync = Synchronization::new("Pets to register");
        sync.id = Some(4);
        sync.source_id = Some("1".to_string());
        sync.source_type = Some("api".to_string());
        sync.actions = vec!["2".to_string(), "3".to_string()];
        let entity = Entity::from(sync.clone());

        let record = entity.to_record().unwrap();
        assert_eq!(record["sourceId"], json!("1"));
        assert_eq!(record["actions"], json!(["2", "3"]));

        let back = Entity::from_record(EntityType::Synchronization, record).unwrap();
        assert_eq!(back, Entity::Synchronization(sync));
    }

    #[test]
    fn test_mapping_and_rule_keep_snake_case_source_keys() {
        let mut mapping = Mapping::new("Pet");
        mapping.source_id = Some("1".to_string());
        let record = Entity::from(mapping).to_record().unwrap();
        assert_eq!(record["source_id"], json!("1"));
        assert!(!record.contains_key("sourceId"));
    }

    #[test]
    fn test_from_record_requires_name() {
        let err = Entity::from_record(EntityType::Job, Record::new()).unwrap_err();
        assert!(matches!(err, EntityError::SerializationError { .. }));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_from_record_accepts_numeric_references() {
        let record = json!({"name": "Pets", "inputMapping": 3, "rules": [5, 7]});
        let Value::Object(record) = record else { unreachable!() };
        let entity = Entity::from_record(EntityType::Endpoint, record).unwrap();
        let Entity::Endpoint(endpoint) = entity else { panic!("expected endpoint") };
        assert_eq!(endpoint.input_mapping.as_deref(), Some("3"));
        assert_eq!(endpoint.rules, vec!["5", "7"]);
    }

    #[test]
    fn test_effective_slug_prefers_persisted_value() {
        let mut rule = Rule::new("Check Auth");
        rule.id = Some(9);
        let mut entity = Entity::from(rule);
        assert_eq!(entity.effective_slug(), "check-auth");

        entity.set_slug("custom".to_string());
        assert_eq!(entity.effective_slug(), "custom");
        assert!(!entity.ensure_slug());
    }

    #[test]
    fn test_ensure_slug_assigns_once() {
        let mut entity = Entity::from(Job::new(""));
        assert!(entity.ensure_slug());
        assert_eq!(entity.slug(), "job");
        assert!(!entity.ensure_slug());
    }
}
