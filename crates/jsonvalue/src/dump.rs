//! Rich values back to plain JSON-LD.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::trace;

use crate::collector::ErrorCollector;
use crate::error::{JsonValueError, Result};
use crate::iri::{ROOT, is_object_iri};
use crate::registry::TypeRegistry;
use crate::rich::{Native, RichMap, RichValue};
use crate::table::ObjectTable;
use crate::types::Extra;

/// Converts a rich tree to plain JSON-LD in two passes around an expansion.
///
/// [`dump`](Self::dump) turns registered natives into nodes and parks every
/// other native in the object table. [`transform`](Self::transform) then
/// converts the typed literals of the expanded result.
pub struct DumpTransformer<'a> {
    registry: &'a TypeRegistry,
    extra: Extra<'a>,
    table: ObjectTable,
    errors: ErrorCollector,
    failed: BTreeMap<String, FailedNode>,
}

/// A node dump that failed in the first pass. It is reported under its
/// expanded property once the second pass reaches it.
struct FailedNode {
    key: String,
    node_type: String,
    native: Native,
    reason: String,
}

impl<'a> DumpTransformer<'a> {
    pub fn new(registry: &'a TypeRegistry, extra: Extra<'a>) -> Self {
        Self {
            registry,
            extra,
            table: ObjectTable::new(),
            errors: ErrorCollector::new(),
            failed: BTreeMap::new(),
        }
    }

    /// First pass: a JSON document ready to be expanded.
    pub fn dump(&mut self, value: &RichValue) -> Value {
        self.dump_value(value, ROOT)
    }

    /// Second pass, over the expanded document.
    pub fn transform(&mut self, expanded: &Value) -> Value {
        self.transform_element(expanded, "")
    }

    /// `Ok` unless either pass recorded errors.
    ///
    /// A failed node the second pass never reached (its key did not expand)
    /// is reported under its key.
    pub fn finish(mut self) -> Result<()> {
        for failed in std::mem::take(&mut self.failed).into_values() {
            self.errors.record(
                &failed.key,
                Some(&failed.node_type),
                RichValue::Native(failed.native),
                Some(failed.reason),
            );
        }
        tracing::debug!(
            objects = self.table.len(),
            errors = self.errors.len(),
            "dump transform finished"
        );
        self.errors.finish(JsonValueError::Dump)
    }

    fn dump_value(&mut self, value: &RichValue, key: &str) -> Value {
        match value {
            RichValue::Null => Value::Null,
            RichValue::Bool(b) => Value::Bool(*b),
            RichValue::Number(n) => Value::Number(n.clone()),
            RichValue::String(s) if is_object_iri(s) => Value::String(self.table.insert(value.clone())),
            RichValue::String(s) => Value::String(s.clone()),
            RichValue::Array(items) => {
                Value::Array(items.iter().map(|item| self.dump_value(item, key)).collect())
            }
            RichValue::Object(map) => Value::Object(self.dump_map(map)),
            RichValue::Native(native) => self.dump_native(native, key),
        }
    }

    fn dump_map(&mut self, map: &RichMap) -> Map<String, Value> {
        map.iter()
            .map(|(key, value)| {
                let value = if key.starts_with('@') {
                    self.park(value)
                } else {
                    self.dump_value(value, key)
                };
                (key.clone(), value)
            })
            .collect()
    }

    fn dump_native(&mut self, native: &Native, key: &str) -> Value {
        let Some(node_type) = self.registry.node_type_for(native) else {
            return Value::String(self.table.insert(RichValue::Native(native.clone())));
        };

        match node_type.dump(native, self.extra) {
            Ok(fields) => {
                trace!(key, node_type = node_type.id(), "dumped node");
                let mut node = self.dump_map(&fields);
                node.insert("@type".to_string(), Value::String(node_type.id().to_string()));
                let context = node_type.load_context();
                if !context.as_object().is_some_and(Map::is_empty) {
                    node.insert("@context".to_string(), context.clone());
                }
                Value::Object(node)
            }
            Err(e) => {
                let iri = self.table.insert(RichValue::Native(native.clone()));
                self.failed.insert(
                    iri.clone(),
                    FailedNode {
                        key: key.to_string(),
                        node_type: node_type.id().to_string(),
                        native: native.clone(),
                        reason: e.to_string(),
                    },
                );
                Value::String(iri)
            }
        }
    }

    /// Keyword values are copied, with natives left to the table.
    fn park(&mut self, value: &RichValue) -> Value {
        match value.to_json() {
            Some(json) => json,
            None => match value {
                RichValue::Array(items) => Value::Array(items.iter().map(|item| self.park(item)).collect()),
                RichValue::Object(map) => Value::Object(
                    map.iter()
                        .map(|(key, value)| (key.clone(), self.park(value)))
                        .collect(),
                ),
                other => Value::String(self.table.insert(other.clone())),
            },
        }
    }

    fn transform_element(&mut self, element: &Value, term: &str) -> Value {
        match element {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.transform_element(item, term))
                    .collect(),
            ),
            Value::Object(map) if map.contains_key("@value") => self.transform_literal(map, term),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| {
                        let value = match key.as_str() {
                            "@list" | "@set" | "@graph" => self.transform_element(value, term),
                            k if k.starts_with('@') => value.clone(),
                            _ => self.transform_element(value, key),
                        };
                        (key.clone(), value)
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn transform_literal(&mut self, literal: &Map<String, Value>, term: &str) -> Value {
        let raw = match literal.get("@value") {
            Some(Value::Null) | None => return Value::Object(literal.clone()),
            Some(raw) => raw,
        };
        if let Some(failed) = raw.as_str().and_then(|iri| self.failed.remove(iri)) {
            self.errors.record(
                term,
                Some(&failed.node_type),
                RichValue::Native(failed.native),
                Some(failed.reason),
            );
            return Value::Object(literal.clone());
        }
        let value = match raw.as_str().and_then(|iri| self.table.get(iri)) {
            Some(parked) => parked.clone(),
            None => RichValue::from(raw),
        };
        let type_iri = literal.get("@type").and_then(Value::as_str);

        let Some(value_type) = type_iri.and_then(|iri| self.registry.value_type(iri)) else {
            let mut result = literal.clone();
            match value.to_json() {
                Some(json) => {
                    result.insert("@value".to_string(), json);
                }
                None => self.errors.record(
                    term,
                    type_iri,
                    value,
                    Some("no value type to dump this value".to_string()),
                ),
            }
            return Value::Object(result);
        };

        if !value_type.validate_dump(&value, self.extra) {
            self.errors.record(term, type_iri, value, None);
            return Value::Object(literal.clone());
        }

        match value_type.dump(&value, self.extra) {
            Ok(dumped) => {
                trace!(term, type_iri, %dumped, "dumped value");
                let mut result = literal.clone();
                result.insert("@value".to_string(), dumped);
                Value::Object(result)
            }
            Err(e) => {
                self.errors.record(term, type_iri, value, Some(e.to_string()));
                Value::Object(literal.clone())
            }
        }
    }
}
