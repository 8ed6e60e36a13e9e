//! Per-call arena for values that cannot travel through plain JSON.

use serde_json::{Map, Value, json};

use crate::iri::{OBJECT_PREFIX, is_object_iri};
use crate::rich::{RichMap, RichValue};

/// Holds rich values while their JSON stand-ins go through expansion or
/// compaction. A value is referenced by a synthetic IRI ending in its index.
#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: Vec<RichValue>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` and return its synthetic IRI.
    pub fn insert(&mut self, value: RichValue) -> String {
        let iri = format!("{OBJECT_PREFIX}{}", self.objects.len());
        self.objects.push(value);
        iri
    }

    pub fn get(&self, iri: &str) -> Option<&RichValue> {
        if !is_object_iri(iri) {
            return None;
        }
        let index: usize = iri.strip_prefix(OBJECT_PREFIX)?.parse().ok()?;
        self.objects.get(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The value object standing in for a stored node.
    pub fn placeholder(iri: &str) -> Value {
        json!({ "@value": iri })
    }

    /// Copy `value` into a rich tree, swapping every synthetic IRI for the
    /// value it references.
    ///
    /// A synthetic IRI is recognised as a bare string or as the `@value` of
    /// a value object that compaction left in expanded form.
    pub fn realize(&self, value: &Value) -> RichValue {
        match value {
            Value::String(s) => match self.get(s) {
                Some(object) => object.clone(),
                None => RichValue::String(s.clone()),
            },
            Value::Array(items) => RichValue::Array(items.iter().map(|item| self.realize(item)).collect()),
            Value::Object(map) => match self.referenced(map) {
                Some(object) => object.clone(),
                None => RichValue::Object(self.realize_map(map)),
            },
            other => RichValue::from(other),
        }
    }

    pub fn realize_map(&self, map: &Map<String, Value>) -> RichMap {
        map.iter()
            .map(|(key, value)| (key.clone(), self.realize(value)))
            .collect()
    }

    fn referenced(&self, map: &Map<String, Value>) -> Option<&RichValue> {
        let only_value_keys = map
            .keys()
            .all(|key| matches!(key.as_str(), "@value" | "@type" | "@language"));
        if !only_value_keys {
            return None;
        }
        map.get("@value").and_then(Value::as_str).and_then(|iri| self.get(iri))
    }
}
