use serde_json::{Map, Value, json};

use crate::iri::internal_id;
use crate::types::ValueType;

/// Builds a context whose terms map to internal property IRIs typed with
/// registered value types.
///
/// Useful when documents are plain JSON and only need their values converted.
///
/// Example:
/// ```
/// use jsonvalue::{ContextBuilder, schemaorg};
///
/// let context = ContextBuilder::new()
///     .typed("born", &schemaorg::Date)
///     .iri("friend", "http://example.com/friend")
///     .build();
/// assert_eq!(context["born"]["@id"], "http://jsonvalue.org/internal/id/born");
/// assert_eq!(context["born"]["@type"], "http://schema.org/Date");
/// assert_eq!(context["friend"], "http://example.com/friend");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ContextBuilder {
    terms: Map<String, Value>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `term` to an internal IRI, typed with `value_type`.
    pub fn typed(mut self, term: &str, value_type: &dyn ValueType) -> Self {
        self.terms.insert(
            term.to_string(),
            json!({"@id": internal_id(term), "@type": value_type.id()}),
        );
        self
    }

    /// Map `term` to `iri` with no type.
    pub fn iri(mut self, term: &str, iri: &str) -> Self {
        self.terms.insert(term.to_string(), Value::String(iri.to_string()));
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.terms)
    }
}
