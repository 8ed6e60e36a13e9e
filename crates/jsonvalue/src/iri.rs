//! IRIs reserved for internal use.
//!
//! Everything under [`INTERNAL`] is minted by this crate and never appears in
//! documents produced by [`JsonValue::dump_objects`](crate::JsonValue::dump_objects).

pub const INTERNAL: &str = "http://jsonvalue.org/internal";

/// Prefix of the synthetic IRIs handed out by the object table.
pub const OBJECT_PREFIX: &str = "http://jsonvalue.org/internal/object/";

/// Prefix of property IRIs minted by [`ContextBuilder`](crate::ContextBuilder).
pub const ID_PREFIX: &str = "http://jsonvalue.org/internal/id/";

/// Prefix of the default node type IRIs of [`CustomNodeType`](crate::CustomNodeType).
pub const TYPE_PREFIX: &str = "http://jsonvalue.org/internal/type/";

/// The property a document body is wrapped in while it is expanded and compacted.
pub const ROOT: &str = "http://jsonvalue.org/internal/root";

/// Property IRI for `term` in the internal id namespace.
pub fn internal_id(term: &str) -> String {
    format!("{ID_PREFIX}{term}")
}

/// `true` if `value` is a synthetic object IRI.
pub fn is_object_iri(value: &str) -> bool {
    value
        .strip_prefix(OBJECT_PREFIX)
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}
