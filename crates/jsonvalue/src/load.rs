//! Expanded JSON-LD to rich values.

use jsonvalue_ld::JsonLdProcessor;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::collector::ErrorCollector;
use crate::error::{JsonValueError, Result};
use crate::iri::is_object_iri;
use crate::registry::TypeRegistry;
use crate::rich::RichValue;
use crate::table::ObjectTable;
use crate::types::{Extra, NodeType};

/// Converts typed literals and typed nodes of an expanded document.
///
/// [`transform`](Self::transform) leaves JSON-LD behind in which every value
/// that is not plain JSON is replaced by a synthetic IRI. After compaction,
/// the returned [`ObjectTable`] realizes them.
pub struct LoadTransformer<'a> {
    registry: &'a TypeRegistry,
    processor: &'a dyn JsonLdProcessor,
    reject_unknown: bool,
    extra: Extra<'a>,
    table: ObjectTable,
    errors: ErrorCollector,
}

impl<'a> LoadTransformer<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        processor: &'a dyn JsonLdProcessor,
        reject_unknown: bool,
        extra: Extra<'a>,
    ) -> Self {
        Self {
            registry,
            processor,
            reject_unknown,
            extra,
            table: ObjectTable::new(),
            errors: ErrorCollector::new(),
        }
    }

    /// Walk `expanded`, converting what the registry knows about.
    ///
    /// Field failures are recorded, not returned; only a failing JSON-LD
    /// processor aborts the walk.
    pub fn transform(&mut self, expanded: &Value) -> Result<Value> {
        self.transform_element(expanded, "")
    }

    /// The object table, or every recorded error sorted by term.
    pub fn finish(self) -> Result<ObjectTable> {
        tracing::debug!(
            objects = self.table.len(),
            errors = self.errors.len(),
            "load transform finished"
        );
        self.errors.finish(JsonValueError::Load)?;
        Ok(self.table)
    }

    fn transform_element(&mut self, element: &Value, term: &str) -> Result<Value> {
        match element {
            Value::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for item in items {
                    result.push(self.transform_element(item, term)?);
                }
                Ok(Value::Array(result))
            }
            Value::Object(map) if map.contains_key("@value") => Ok(self.transform_literal(map, term)),
            Value::Object(map) => self.transform_node(map, term),
            other => Ok(other.clone()),
        }
    }

    fn transform_literal(&mut self, literal: &Map<String, Value>, term: &str) -> Value {
        let value = match literal.get("@value") {
            Some(Value::Null) | None => return Value::Object(literal.clone()),
            Some(value) => value,
        };
        let type_iri = literal.get("@type").and_then(Value::as_str);

        let Some(value_type) = type_iri.and_then(|iri| self.registry.value_type(iri)) else {
            if self.reject_unknown {
                self.errors.record(term, type_iri, RichValue::from(value), None);
                return Value::Object(literal.clone());
            }
            let mut result = literal.clone();
            if let Value::String(s) = value
                && is_object_iri(s)
            {
                result.insert("@value".to_string(), self.stand_in(RichValue::String(s.clone())));
            }
            return Value::Object(result);
        };

        if !value_type.validate_load(value, self.extra) {
            self.errors.record(term, type_iri, RichValue::from(value), None);
            return Value::Object(literal.clone());
        }

        match value_type.load(value, self.extra) {
            Ok(loaded) => {
                trace!(term, type_iri, %loaded, "loaded value");
                let mut result = literal.clone();
                result.insert("@value".to_string(), self.stand_in(loaded));
                Value::Object(result)
            }
            Err(e) => {
                self.errors.record(term, type_iri, RichValue::from(value), Some(e.to_string()));
                Value::Object(literal.clone())
            }
        }
    }

    /// Scalars go back into the literal as they are, anything else through the table.
    /// So do strings that read as synthetic IRIs, or realizing would swap them.
    fn stand_in(&mut self, loaded: RichValue) -> Value {
        match loaded {
            RichValue::Bool(b) => Value::Bool(b),
            RichValue::Number(n) => Value::Number(n),
            RichValue::String(s) if !is_object_iri(&s) => Value::String(s),
            other => Value::String(self.table.insert(other)),
        }
    }

    fn transform_node(&mut self, node: &Map<String, Value>, term: &str) -> Result<Value> {
        let mut fields = Map::new();
        for (key, value) in node {
            let value = match key.as_str() {
                "@list" | "@set" | "@graph" => self.transform_element(value, term)?,
                k if k.starts_with('@') => value.clone(),
                _ => self.transform_element(value, key)?,
            };
            fields.insert(key.clone(), value);
        }

        let types: Vec<&str> = match node.get("@type") {
            Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(t)) => vec![t.as_str()],
            _ => Vec::new(),
        };
        let Some(node_type) = types.first().and_then(|iri| self.registry.node_type(iri)) else {
            return Ok(Value::Object(fields));
        };
        if types.len() > 1 {
            warn!(term, types = ?types, used = types[0], "node has several types, using the first");
        }

        self.load_node(node_type, fields, term)
    }

    fn load_node(&mut self, node_type: &dyn NodeType, node: Map<String, Value>, term: &str) -> Result<Value> {
        let mut body = node.clone();
        body.remove("@type");

        let compacted = self
            .processor
            .compact(&Value::Array(vec![Value::Object(body)]), node_type.load_context())?;
        let mut compacted = match compacted {
            Value::Object(map) => map,
            other => {
                return Err(JsonValueError::invalid_document(format!(
                    "compacted node is not an object: {other}"
                )));
            }
        };
        compacted.remove("@context");
        let fields = self.table.realize_map(&compacted);

        match node_type.load(&fields, self.extra) {
            Ok(Some(object)) => {
                trace!(term, node_type = node_type.id(), "loaded node");
                let iri = self.table.insert(RichValue::Native(object));
                Ok(ObjectTable::placeholder(&iri))
            }
            Ok(None) => Ok(Value::Object(node)),
            Err(e) => {
                self.errors.record(
                    term,
                    Some(node_type.id()),
                    RichValue::Object(fields),
                    Some(e.to_string()),
                );
                Ok(Value::Object(node))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::rich::RichMap;
    use crate::schemaorg;
    use crate::types::CustomNodeType;
    use chrono::NaiveDate;
    use jsonvalue_ld::Processor;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_value_vocabulary(schemaorg::data_type_vocabulary());
        registry
            .register_node_type(
                "http://example.com/Point",
                CustomNodeType::new(
                    json!({"x": "http://example.com/x", "y": "http://example.com/y"}),
                    |fields: &RichMap, _| {
                        let coord = |name: &str| {
                            fields
                                .get(name)
                                .and_then(RichValue::as_number)
                                .and_then(serde_json::Number::as_i64)
                                .ok_or_else(|| ConvertError::new(format!("missing {name}")))
                        };
                        Ok(Point { x: coord("x")?, y: coord("y")? })
                    },
                    |p: &Point, _| {
                        RichMap::from([
                            ("x".to_string(), RichValue::from(p.x)),
                            ("y".to_string(), RichValue::from(p.y)),
                        ])
                    },
                ),
            )
            .unwrap();
        registry
    }

    #[test]
    fn typed_literals_are_converted() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        let expanded = json!([{
            "http://example.com/when": [{"@value": "2010-01-01", "@type": "http://schema.org/Date"}],
            "http://example.com/ok": [{"@value": true, "@type": "http://schema.org/Boolean"}],
            "http://example.com/other": [{"@value": "x", "@type": "http://example.com/unknown"}]
        }]);
        let result = loader.transform(&expanded).unwrap();
        let table = loader.finish().unwrap();

        let node = &result[0];
        let when = node["http://example.com/when"][0]["@value"].as_str().unwrap();
        assert_eq!(
            table.get(when),
            Some(&RichValue::native(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()))
        );
        assert_eq!(node["http://example.com/ok"][0]["@value"], json!(true));
        assert_eq!(node["http://example.com/other"], expanded[0]["http://example.com/other"]);
    }

    #[test]
    fn every_failure_is_recorded() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        loader
            .transform(&json!([{
                "http://example.com/z": [{"@value": "nope", "@type": "http://schema.org/Boolean"}],
                "http://example.com/a": [{"@value": "2011-14-01", "@type": "http://schema.org/Date"}]
            }]))
            .unwrap();
        let errors = match loader.finish() {
            Err(JsonValueError::Load(errors)) => errors,
            other => panic!("expected load error, got {other:?}"),
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].term, "http://example.com/a");
        assert_eq!(errors[0].type_iri.as_deref(), Some("http://schema.org/Date"));
        assert!(errors[0].reason.is_some());
        assert_eq!(errors[1].term, "http://example.com/z");
        assert_eq!(errors[1].value, RichValue::from("nope"));
        assert!(errors[1].reason.is_none());
    }

    #[test]
    fn reject_unknown_records_missing_and_unregistered_types() {
        let registry = TypeRegistry::new();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, true, Extra::none());

        loader
            .transform(&json!([{
                "http://example.com/a": [{"@value": "x"}],
                "http://example.com/b": [{"@value": "y", "@type": "http://example.com/t"}],
                "http://example.com/c": [{"@value": null, "@type": "http://example.com/t"}]
            }]))
            .unwrap();
        let err = loader.finish().unwrap_err();
        let errors = err.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].type_iri, None);
        assert_eq!(errors[1].type_iri.as_deref(), Some("http://example.com/t"));
    }

    #[test]
    fn registered_nodes_become_placeholders() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        let result = loader
            .transform(&json!([{
                "http://example.com/at": [{
                    "@type": ["http://example.com/Point"],
                    "http://example.com/x": [{"@value": 1}],
                    "http://example.com/y": [{"@value": 2}]
                }]
            }]))
            .unwrap();
        let table = loader.finish().unwrap();

        let placeholder = &result[0]["http://example.com/at"][0];
        assert_eq!(placeholder, &json!({"@value": "http://jsonvalue.org/internal/object/0"}));
        assert_eq!(table.realize(placeholder), RichValue::native(Point { x: 1, y: 2 }));
    }

    #[test]
    fn failing_node_load_is_recorded_and_node_kept() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        let node = json!({
            "@type": ["http://example.com/Point"],
            "http://example.com/x": [{"@value": 1}]
        });
        let result = loader
            .transform(&json!([{"http://example.com/at": [node.clone()]}]))
            .unwrap();
        assert_eq!(result[0]["http://example.com/at"][0], node);

        let err = loader.finish().unwrap_err();
        assert_eq!(err.errors()[0].term, "http://example.com/at");
        assert_eq!(err.errors()[0].type_iri.as_deref(), Some("http://example.com/Point"));
        assert_eq!(err.errors()[0].reason.as_deref(), Some("missing y"));
    }

    #[test]
    fn unregistered_node_types_are_walked() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        let result = loader
            .transform(&json!([{
                "@type": ["http://example.com/nanah/type"],
                "http://example.com/b": [{"@value": "2011-01-01", "@type": "http://schema.org/Date"}]
            }]))
            .unwrap();
        let table = loader.finish().unwrap();

        assert_eq!(result[0]["@type"], json!(["http://example.com/nanah/type"]));
        assert_eq!(table.len(), 1);
    }

    fn point_node(types: Value) -> Value {
        json!([{
            "@type": types,
            "http://example.com/x": [{"@value": 3}],
            "http://example.com/y": [{"@value": 4}]
        }])
    }

    #[test]
    fn first_type_decides_the_node_type() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        let result = loader
            .transform(&point_node(json!(["http://example.com/Point", "http://example.com/Shape"])))
            .unwrap();
        let table = loader.finish().unwrap();
        assert_eq!(table.realize(&result[0]), RichValue::native(Point { x: 3, y: 4 }));
    }

    #[test]
    fn registered_type_in_second_place_is_ignored() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        let node = point_node(json!(["http://example.com/Shape", "http://example.com/Point"]));
        let result = loader.transform(&node).unwrap();
        let table = loader.finish().unwrap();
        assert_eq!(result, node);
        assert!(table.is_empty());
    }

    #[test]
    fn strings_shaped_like_object_iris_survive_realize() {
        let registry = registry();
        let processor = Processor::new();
        let mut loader = LoadTransformer::new(&registry, &processor, false, Extra::none());

        let lookalike = "http://jsonvalue.org/internal/object/0";
        let result = loader
            .transform(&json!([{
                "http://example.com/when": [{"@value": "2010-01-01", "@type": "http://schema.org/Date"}],
                "http://example.com/name": [{"@value": lookalike}],
                "http://example.com/label": [{"@value": lookalike, "@type": "http://schema.org/Text"}]
            }]))
            .unwrap();
        let table = loader.finish().unwrap();

        let realized = table.realize(&result[0]);
        let first = |key: &str| realized.get(key).and_then(RichValue::as_array).map(|items| items[0].clone());
        assert_eq!(
            first("http://example.com/when"),
            Some(RichValue::native(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()))
        );
        assert_eq!(first("http://example.com/name"), Some(RichValue::from(lookalike)));
        assert_eq!(first("http://example.com/label"), Some(RichValue::from(lookalike)));
    }
}
