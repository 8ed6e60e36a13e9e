/*!
 * jsonvalue
 *
 * Loads JSON-LD documents into rich values (dates, numbers, user types) and
 * dumps them back. Conversion is driven by a registry of value types, for
 * typed literals, and node types, for whole nodes.
 */

use std::io::{Read, Write};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::debug;

pub mod collector;
pub mod config;
pub mod context;
pub mod dump;
pub mod error;
pub mod iri;
pub mod load;
pub mod registry;
pub mod rich;
pub mod schemaorg;
pub mod table;
pub mod types;

pub use collector::ErrorCollector;
pub use config::{DumpOptions, LoadOptions};
pub use context::ContextBuilder;
pub use dump::DumpTransformer;
pub use error::{ConversionError, ConvertError, JsonValueError, Result};
pub use load::LoadTransformer;
pub use registry::TypeRegistry;
pub use rich::{Native, NativeObject, RichMap, RichValue};
pub use table::ObjectTable;
pub use types::{CustomNodeType, CustomValueType, Extra, NodeType, ValueType};

// Re-exported so callers can plug in their own processor
pub use jsonvalue_ld as ld;
use jsonvalue_ld::{JsonLdProcessor, Processor};

/// Converts between plain JSON-LD documents and rich values.
///
/// Register types first, then share the instance (it is `Send + Sync`) for
/// any number of concurrent calls.
///
/// Example:
/// ```
/// use jsonvalue::{JsonValue, LoadOptions, DumpOptions, schemaorg};
/// use serde_json::json;
///
/// let mut jv = JsonValue::new();
/// jv.register_value_type("http://example.com/date", schemaorg::Date);
///
/// let doc = json!({
///     "@context": {"foo": {"@id": "http://example.com/foo", "@type": "http://example.com/date"}},
///     "foo": "2010-01-01"
/// });
/// let values = jv.load_objects(&doc, &LoadOptions::new()).unwrap();
/// let date = values.get("foo").and_then(|v| v.downcast_ref::<chrono::NaiveDate>());
/// assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2010, 1, 1).as_ref());
///
/// assert_eq!(jv.dump_objects(&values, &DumpOptions::new()).unwrap(), doc);
/// ```
#[derive(Clone)]
pub struct JsonValue {
    registry: TypeRegistry,
    processor: Arc<dyn JsonLdProcessor>,
}

impl Default for JsonValue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JsonValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonValue")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl JsonValue {
    /// Uses the bundled JSON-LD processor, which resolves no remote contexts.
    pub fn new() -> Self {
        Self::with_processor(Processor::new())
    }

    pub fn with_processor(processor: impl JsonLdProcessor + 'static) -> Self {
        Self {
            registry: TypeRegistry::new(),
            processor: Arc::new(processor),
        }
    }

    /// Start from an already populated registry.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn register_value_type(&mut self, iri: impl Into<String>, value_type: impl ValueType + 'static) {
        self.registry.register_value_type(iri, value_type);
    }

    pub fn register_node_type(&mut self, iri: impl Into<String>, node_type: impl NodeType + 'static) -> Result<()> {
        self.registry.register_node_type(iri, node_type)
    }

    pub fn register_value_vocabulary(&mut self, vocabulary: impl IntoIterator<Item = Arc<dyn ValueType>>) {
        self.registry.register_value_vocabulary(vocabulary);
    }

    /// Load `document` into a rich value.
    ///
    /// The document may be a node, an array or a scalar. Its own `@context`
    /// is put back into an object result.
    pub fn load_objects(&self, document: &Value, options: &LoadOptions<'_>) -> Result<RichValue> {
        let (body, own_context) = split_document(document);
        let context = options
            .context()
            .or(own_context)
            .cloned()
            .unwrap_or_else(|| json!({}));

        let expanded = self.processor.expand(&wrap(body), Some(&context))?;

        let mut loader = LoadTransformer::new(
            &self.registry,
            self.processor.as_ref(),
            options.reject_unknown(),
            options.extra(),
        );
        let transformed = loader.transform(&expanded)?;
        let table = loader.finish()?;

        let compacted = self.processor.compact(&transformed, &context)?;
        let mut result = match compacted.get(iri::ROOT) {
            Some(root) => table.realize(root),
            None => RichValue::Object(RichMap::new()),
        };
        debug!(objects = table.len(), "loaded document");

        if let (Some(own_context), RichValue::Object(map)) = (own_context, &mut result) {
            map.insert("@context".to_string(), RichValue::from(own_context));
        }
        Ok(result)
    }

    /// Dump `value` to a plain JSON-LD document.
    ///
    /// Natives with a registered node type become nodes, natives under a
    /// typed term go through its value type. Any other native is an error.
    pub fn dump_objects(&self, value: &RichValue, options: &DumpOptions<'_>) -> Result<Value> {
        let (body, own_context) = split_rich(value)?;
        let context = options
            .context()
            .cloned()
            .or_else(|| own_context.clone())
            .unwrap_or_else(|| json!({}));

        let mut dumper = DumpTransformer::new(&self.registry, options.extra());
        let dumped = dumper.dump(&body);

        let expanded = self.processor.expand(&wrap(dumped), Some(&context))?;
        let transformed = dumper.transform(&expanded);
        dumper.finish()?;

        let compacted = self.processor.compact(&transformed, &context)?;
        let mut result = compacted.get(iri::ROOT).cloned().unwrap_or_else(|| json!({}));
        debug!("dumped document");

        if let (Some(own_context), Value::Object(map)) = (own_context, &mut result) {
            map.insert("@context".to_string(), own_context);
        }
        Ok(result)
    }

    /// Parse JSON text and load it.
    pub fn loads(&self, text: &str, options: &LoadOptions<'_>) -> Result<RichValue> {
        let document: Value = serde_json::from_str(text)?;
        self.load_objects(&document, options)
    }

    pub fn load_reader(&self, reader: impl Read, options: &LoadOptions<'_>) -> Result<RichValue> {
        let document: Value = serde_json::from_reader(reader)?;
        self.load_objects(&document, options)
    }

    /// Dump `value` as JSON text.
    pub fn dumps(&self, value: &RichValue, options: &DumpOptions<'_>) -> Result<String> {
        Ok(serde_json::to_string(&self.dump_objects(value, options)?)?)
    }

    pub fn dump_writer(&self, writer: impl Write, value: &RichValue, options: &DumpOptions<'_>) -> Result<()> {
        serde_json::to_writer(writer, &self.dump_objects(value, options)?)?;
        Ok(())
    }
}

/// Wrap a body under the root property so any JSON value survives expansion.
fn wrap(body: Value) -> Value {
    let mut map = Map::new();
    map.insert(iri::ROOT.to_string(), body);
    Value::Object(map)
}

fn split_document(document: &Value) -> (Value, Option<&Value>) {
    match document {
        Value::Object(map) => match map.get("@context") {
            Some(context) => {
                let mut body = map.clone();
                body.remove("@context");
                (Value::Object(body), Some(context))
            }
            None => (document.clone(), None),
        },
        other => (other.clone(), None),
    }
}

fn split_rich(value: &RichValue) -> Result<(RichValue, Option<Value>)> {
    let RichValue::Object(map) = value else {
        return Ok((value.clone(), None));
    };
    let Some(context) = map.get("@context") else {
        return Ok((value.clone(), None));
    };
    let context = context
        .to_json()
        .ok_or_else(|| JsonValueError::invalid_document("@context holds a native value"))?;
    let mut body = map.clone();
    body.remove("@context");
    Ok((RichValue::Object(body), Some(context)))
}
