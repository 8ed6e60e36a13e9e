use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{JsonValueError, Result};
use crate::rich::Native;
use crate::types::{NodeType, ValueType};

/// Maps IRIs to value types and node types, and native types to node types.
///
/// Built once with `&mut` access, then shared read-only (by reference or
/// `Arc`) across any number of concurrent transforms.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    value_types: HashMap<String, Arc<dyn ValueType>>,
    node_types: HashMap<String, Arc<dyn NodeType>>,
    native_types: HashMap<TypeId, Arc<dyn NodeType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value_type` for literals typed `iri`. A later registration
    /// for the same IRI replaces the earlier one.
    pub fn register_value_type(&mut self, iri: impl Into<String>, value_type: impl ValueType + 'static) {
        self.insert_value_type(iri.into(), Arc::new(value_type));
    }

    /// Register every type in `vocabulary` under its own [`ValueType::id`].
    pub fn register_value_vocabulary(
        &mut self,
        vocabulary: impl IntoIterator<Item = Arc<dyn ValueType>>,
    ) {
        for value_type in vocabulary {
            self.insert_value_type(value_type.id().to_string(), value_type);
        }
    }

    fn insert_value_type(&mut self, iri: String, value_type: Arc<dyn ValueType>) {
        if self.value_types.insert(iri.clone(), value_type).is_some() {
            debug!(iri = %iri, "replaced value type");
        }
    }

    /// Register `node_type` for nodes typed `iri`, and index it by its native type.
    ///
    /// Fails if another node type already produces the same native type. The
    /// registry is unchanged in that case.
    pub fn register_node_type(&mut self, iri: impl Into<String>, node_type: impl NodeType + 'static) -> Result<()> {
        let iri = iri.into();
        let native_type = node_type.native_type();

        if let Some(existing) = self.native_types.get(&native_type)
            && self.node_types.get(&iri).is_none_or(|current| !Arc::ptr_eq(current, existing))
        {
            return Err(JsonValueError::DuplicateNodeType(
                node_type.native_type_name().to_string(),
            ));
        }

        let node_type: Arc<dyn NodeType> = Arc::new(node_type);
        if let Some(previous) = self.node_types.insert(iri.clone(), node_type.clone()) {
            self.native_types.remove(&previous.native_type());
            debug!(iri = %iri, "replaced node type");
        }
        self.native_types.insert(native_type, node_type);
        Ok(())
    }

    pub fn can_load_value(&self, iri: &str) -> bool {
        self.value_types.contains_key(iri)
    }

    pub fn can_load_node(&self, iri: &str) -> bool {
        self.node_types.contains_key(iri)
    }

    /// `true` if a node type is registered for the runtime type of `object`.
    pub fn can_dump_node(&self, object: &Native) -> bool {
        self.native_types.contains_key(&object.native_type())
    }

    pub fn value_type(&self, iri: &str) -> Option<&dyn ValueType> {
        self.value_types.get(iri).map(Arc::as_ref)
    }

    pub fn node_type(&self, iri: &str) -> Option<&dyn NodeType> {
        self.node_types.get(iri).map(Arc::as_ref)
    }

    /// The node type that dumps `object`.
    pub fn node_type_for(&self, object: &Native) -> Option<&dyn NodeType> {
        self.native_types.get(&object.native_type()).map(Arc::as_ref)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value_types: Vec<&String> = self.value_types.keys().collect();
        value_types.sort();
        let mut node_types: Vec<&String> = self.node_types.keys().collect();
        node_types.sort();
        f.debug_struct("TypeRegistry")
            .field("value_types", &value_types)
            .field("node_types", &node_types)
            .finish()
    }
}
