//! Generic reference resolution
//!
//! Each handler describes where its references live with a list of
//! [`FieldRule`]s. [`resolve`] walks a record against those rules and
//! rewrites ids to slugs ([`Direction::Export`]) or slugs to ids
//! ([`Direction::Import`]). A reference without a table entry keeps its
//! original value, except in [`Unresolved::Drop`] lists on export.

use crate::core::entity::{EntityType, Record};
use crate::core::table::MappingTable;
use crate::entities::refs::scalar_key;
use indexmap::IndexSet;
use serde_json::Value;
use uuid::Uuid;

/// Which way references are rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// id -> slug
    Export,
    /// slug -> id
    Import,
}

/// What happens to list entries without a table entry on export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// Leave the entry as it is
    Keep,
    /// Remove the entry from the list
    Drop,
}

/// Where a reference lives in a record and what it points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// A single id at `path` (nested keys for values inside objects)
    Simple {
        path: &'static [&'static str],
        target: EntityType,
    },

    /// An id whose meaning depends on a sibling type field:
    /// `api` and `database` point at a source, `register/schema` holds a
    /// register id and a schema id joined by `/`
    Composite {
        id_field: &'static str,
        type_field: &'static str,
    },

    /// An ordered list of ids
    List {
        field: &'static str,
        target: EntityType,
        unresolved: Unresolved,
    },

    /// Ids anywhere inside an object, located by key name: a key equal to
    /// a type tag or ending in `<tag>Id` holds an id of that type
    Nested {
        field: &'static str,
        targets: &'static [EntityType],
    },
}

/// Composite type values that point at a source
const SOURCE_TARGET_TYPES: [&str; 2] = ["api", "database"];

/// Composite type value for a register/schema pair
const REGISTER_SCHEMA: &str = "register/schema";

/// Rewrite every reference in `record` described by `rules`
///
/// Returns the ids of mappings referenced through nested rules (export
/// only), normalized to numeric ids.
pub fn resolve(
    record: &mut Record,
    rules: &[FieldRule],
    table: &MappingTable,
    direction: Direction,
) -> IndexSet<String> {
    let mut discovered = IndexSet::new();

    for rule in rules {
        match *rule {
            FieldRule::Simple { path, target } => {
                if let Some(value) = value_at_path(record, path) {
                    resolve_scalar(value, target, table, direction);
                }
            }
            FieldRule::Composite {
                id_field,
                type_field,
            } => {
                let Some(kind) = record.get(type_field).and_then(Value::as_str) else {
                    continue;
                };
                let kind = kind.to_string();
                if let Some(value) = record.get_mut(id_field) {
                    resolve_composite(value, &kind, table, direction);
                }
            }
            FieldRule::List {
                field,
                target,
                unresolved,
            } => {
                if let Some(Value::Array(items)) = record.get_mut(field) {
                    resolve_list(items, target, unresolved, table, direction);
                }
            }
            FieldRule::Nested { field, targets } => {
                if let Some(value) = record.get_mut(field) {
                    walk_nested(value, targets, table, direction, &mut discovered);
                }
            }
        }
    }

    discovered
}

fn value_at_path<'a>(record: &'a mut Record, path: &[&str]) -> Option<&'a mut Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get_mut(*first)?;
    for key in rest {
        current = current.as_object_mut()?.get_mut(*key)?;
    }
    Some(current)
}

fn lookup(table: &MappingTable, target: EntityType, key: &str, direction: Direction) -> Option<String> {
    let found = match direction {
        Direction::Export => table.slug_for(target, key),
        Direction::Import => table.id_for(target, key),
    };
    found.map(str::to_string)
}

/// Rewrite a scalar in place; returns the original key when it resolved
fn resolve_scalar(
    value: &mut Value,
    target: EntityType,
    table: &MappingTable,
    direction: Direction,
) -> Option<String> {
    let key = scalar_key(value)?;
    match lookup(table, target, &key, direction) {
        Some(resolved) => {
            *value = Value::String(resolved);
            Some(key)
        }
        None => {
            tracing::trace!(%target, reference = %key, ?direction, "Unresolved reference left as is");
            None
        }
    }
}

fn resolve_composite(value: &mut Value, kind: &str, table: &MappingTable, direction: Direction) {
    if SOURCE_TARGET_TYPES.contains(&kind) {
        resolve_scalar(value, EntityType::Source, table, direction);
        return;
    }
    if kind != REGISTER_SCHEMA {
        return;
    }

    let Some(composite) = value.as_str() else {
        return;
    };
    let Some((register, schema)) = composite.split_once('/') else {
        tracing::trace!(value = composite, "Composite reference without separator left as is");
        return;
    };

    let register = lookup(table, EntityType::Register, register, direction)
        .unwrap_or_else(|| register.to_string());
    let schema =
        lookup(table, EntityType::Schema, schema, direction).unwrap_or_else(|| schema.to_string());
    *value = Value::String(format!("{}/{}", register, schema));
}

fn resolve_list(
    items: &mut Vec<Value>,
    target: EntityType,
    unresolved: Unresolved,
    table: &MappingTable,
    direction: Direction,
) {
    let resolved = std::mem::take(items)
        .into_iter()
        .filter_map(|item| {
            let Some(key) = scalar_key(&item) else {
                return Some(item);
            };

            if direction == Direction::Export
                && unresolved == Unresolved::Keep
                && !is_id_like(&key)
            {
                return Some(item);
            }

            match lookup(table, target, &key, direction) {
                Some(found) => Some(Value::String(found)),
                None if direction == Direction::Export && unresolved == Unresolved::Drop => {
                    tracing::debug!(%target, reference = %key, "Dropping unresolved list reference");
                    None
                }
                None => Some(item),
            }
        })
        .collect();
    *items = resolved;
}

/// Numeric ids and UUIDs are looked up; anything else is already portable
fn is_id_like(key: &str) -> bool {
    key.parse::<i64>().is_ok() || Uuid::parse_str(key).is_ok()
}

fn walk_nested(
    value: &mut Value,
    targets: &[EntityType],
    table: &MappingTable,
    direction: Direction,
    discovered: &mut IndexSet<String>,
) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                match key_target(key, targets) {
                    Some(target) => {
                        resolve_matched(inner, target, targets, table, direction, discovered)
                    }
                    None => walk_nested(inner, targets, table, direction, discovered),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_nested(item, targets, table, direction, discovered);
            }
        }
        _ => {}
    }
}

fn resolve_matched(
    value: &mut Value,
    target: EntityType,
    targets: &[EntityType],
    table: &MappingTable,
    direction: Direction,
    discovered: &mut IndexSet<String>,
) {
    match value {
        Value::String(_) | Value::Number(_) => {
            let original = resolve_scalar(value, target, table, direction);
            if let Some(original) = original
                && direction == Direction::Export
                && target == EntityType::Mapping
            {
                let id = table
                    .canonical_id(EntityType::Mapping, &original)
                    .map(str::to_string)
                    .unwrap_or(original);
                discovered.insert(id);
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_matched(item, target, targets, table, direction, discovered);
            }
        }
        Value::Object(_) => walk_nested(value, targets, table, direction, discovered),
        _ => {}
    }
}

/// The entity type a configuration key refers to, if any
fn key_target(key: &str, targets: &[EntityType]) -> Option<EntityType> {
    targets
        .iter()
        .copied()
        .find(|target| key == target.as_str() || ends_with_type_id(key, target.as_str()))
}

/// `mappingId`, or `inputMappingId` with the tag capitalized after a prefix
fn ends_with_type_id(key: &str, tag: &str) -> bool {
    let Some(stem) = key.strip_suffix("Id") else {
        return false;
    };
    if stem == tag {
        return true;
    }

    let mut tag_chars = tag.chars();
    let Some(first) = tag_chars.next() else {
        return false;
    };
    let capitalized = format!("{}{}", first.to_ascii_uppercase(), tag_chars.as_str());
    stem.len() > capitalized.len() && stem.ends_with(&capitalized)
}
