//! Macros for reducing boilerplate when defining entities
//!
//! Every portable entity shares the same metadata block (id, uuid, slug,
//! name, ...). The macro injects it and implements
//! [`ConfigEntity`](crate::core::entity::ConfigEntity).

/// Define a portable entity struct with the common metadata fields
///
/// # Example
///
/// ```rust,ignore
/// impl_config_entity!(
///     /// A data source
///     Source,
///     EntityType::Source,
///     {
///         #[serde(default)]
///         location: String,
///     }
/// );
///
/// let source = Source::new("Petstore");
/// assert_eq!(source.version, "0.0.1");
/// ```
macro_rules! impl_config_entity {
    (
        $(#[$struct_meta:meta])*
        $type:ident,
        $entity_type:expr,
        {
            $( $(#[$field_meta:meta])* $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        $(#[$struct_meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $type {
            /// Environment-local numeric identifier
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub id: Option<i64>,

            /// Globally unique identifier
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub uuid: Option<::uuid::Uuid>,

            /// URL-safe handle, unique within the entity type
            #[serde(default)]
            pub slug: String,

            /// Human readable name
            pub name: String,

            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub description: Option<String>,

            /// External reference (e.g. a schema URL)
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub reference: Option<String>,

            #[serde(default = "crate::entities::default_version")]
            pub version: String,

            /// Ids of the configurations this entity belongs to
            #[serde(default, skip_serializing_if = "Vec::is_empty")]
            pub configurations: Vec<String>,

            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub created: Option<::chrono::DateTime<::chrono::Utc>>,

            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub updated: Option<::chrono::DateTime<::chrono::Utc>>,

            $( $(#[$field_meta])* pub $field : $field_type, )*
        }

        impl $type {
            /// Create an unsaved entity with the given name
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    version: $crate::entities::default_version(),
                    ..Default::default()
                }
            }
        }

        impl $crate::core::entity::ConfigEntity for $type {
            const ENTITY_TYPE: $crate::core::entity::EntityType = $entity_type;

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn uuid(&self) -> Option<::uuid::Uuid> {
                self.uuid
            }

            fn slug(&self) -> &str {
                &self.slug
            }

            fn set_slug(&mut self, slug: String) {
                self.slug = slug;
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn configurations(&self) -> &[String] {
                &self.configurations
            }

            fn updated(&self) -> Option<::chrono::DateTime<::chrono::Utc>> {
                self.updated
            }
        }

        impl From<$type> for $crate::entities::Entity {
            fn from(entity: $type) -> Self {
                $crate::entities::Entity::$type(entity)
            }
        }
    };
}

pub(crate) use impl_config_entity;
