//! Converter traits and closure-based converters.

use std::any::{Any, TypeId};
use std::fmt;

use serde_json::Value;

use crate::error::ConvertError;
use crate::iri::TYPE_PREFIX;
use crate::rich::{Native, NativeObject, RichMap, RichValue};

/// Caller data handed unchanged to every converter during one call.
#[derive(Clone, Copy, Default)]
pub struct Extra<'a>(Option<&'a dyn Any>);

impl<'a> Extra<'a> {
    pub fn new(value: &'a dyn Any) -> Self {
        Self(Some(value))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// The caller data as `T`, if it is one.
    pub fn get<T: Any>(&self) -> Option<&'a T> {
        self.0.and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for Extra<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Extra(Some(..))"),
            None => f.write_str("Extra(None)"),
        }
    }
}

/// Converts typed literals to and from rich values.
///
/// The defaults accept any value and pass it through unchanged.
pub trait ValueType: Send + Sync {
    /// The datatype IRI this converter handles.
    fn id(&self) -> &str;

    fn validate_load(&self, _value: &Value, _extra: Extra<'_>) -> bool {
        true
    }

    fn load(&self, value: &Value, _extra: Extra<'_>) -> Result<RichValue, ConvertError> {
        Ok(RichValue::from(value))
    }

    fn validate_dump(&self, _value: &RichValue, _extra: Extra<'_>) -> bool {
        true
    }

    fn dump(&self, value: &RichValue, _extra: Extra<'_>) -> Result<Value, ConvertError> {
        value
            .to_json()
            .ok_or_else(|| ConvertError::new(format!("{value} has no JSON form")))
    }
}

/// Converts whole JSON-LD nodes to and from one native value.
pub trait NodeType: Send + Sync {
    /// The `@type` IRI of nodes this converter handles.
    fn id(&self) -> &str;

    /// The native type produced by [`NodeType::load`]. Dumping dispatches on it.
    fn native_type(&self) -> TypeId;

    fn native_type_name(&self) -> &'static str;

    /// Context the node's own fields are compacted with before `load` sees them.
    fn load_context(&self) -> &Value;

    /// Build the native value. `Ok(None)` leaves the node as it is.
    fn load(&self, fields: &RichMap, extra: Extra<'_>) -> Result<Option<Native>, ConvertError>;

    /// Fields for `object`, keyed by terms of [`NodeType::load_context`].
    fn dump(&self, object: &Native, extra: Extra<'_>) -> Result<RichMap, ConvertError>;
}

type LoadValueFn<T> = dyn Fn(&Value, Extra<'_>) -> Result<T, ConvertError> + Send + Sync;
type DumpValueFn<T> = dyn Fn(&T, Extra<'_>) -> Result<Value, ConvertError> + Send + Sync;

/// A value type built from a pair of closures over a native type `T`.
///
/// Dumping accepts only natives of type `T`.
pub struct CustomValueType<T> {
    id: String,
    load: Box<LoadValueFn<T>>,
    dump: Box<DumpValueFn<T>>,
}

impl<T: NativeObject> CustomValueType<T> {
    pub fn new(
        id: impl Into<String>,
        load: impl Fn(&Value, Extra<'_>) -> Result<T, ConvertError> + Send + Sync + 'static,
        dump: impl Fn(&T, Extra<'_>) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            load: Box::new(load),
            dump: Box::new(dump),
        }
    }
}

impl<T: NativeObject> ValueType for CustomValueType<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self, value: &Value, extra: Extra<'_>) -> Result<RichValue, ConvertError> {
        (self.load)(value, extra).map(RichValue::native)
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        value.downcast_ref::<T>().is_some()
    }

    fn dump(&self, value: &RichValue, extra: Extra<'_>) -> Result<Value, ConvertError> {
        let native = value.downcast_ref::<T>().ok_or_else(|| {
            ConvertError::new(format!("expected {}", std::any::type_name::<T>()))
        })?;
        (self.dump)(native, extra)
    }
}

impl<T> fmt::Debug for CustomValueType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValueType").field("id", &self.id).finish()
    }
}

type LoadNodeFn<T> = dyn Fn(&RichMap, Extra<'_>) -> Result<T, ConvertError> + Send + Sync;
type DumpNodeFn<T> = dyn Fn(&T, Extra<'_>) -> RichMap + Send + Sync;

/// A node type built from a pair of closures over a native type `T`.
pub struct CustomNodeType<T> {
    id: String,
    load_context: Value,
    load: Box<LoadNodeFn<T>>,
    dump: Box<DumpNodeFn<T>>,
}

impl<T: NativeObject> CustomNodeType<T> {
    /// The IRI defaults to the internal type namespace plus the short type name,
    /// e.g. `http://jsonvalue.org/internal/type/User`.
    pub fn new(
        load_context: Value,
        load: impl Fn(&RichMap, Extra<'_>) -> Result<T, ConvertError> + Send + Sync + 'static,
        dump: impl Fn(&T, Extra<'_>) -> RichMap + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: format!("{TYPE_PREFIX}{}", short_type_name::<T>()),
            load_context,
            load: Box::new(load),
            dump: Box::new(dump),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl<T: NativeObject> NodeType for CustomNodeType<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn native_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn native_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn load_context(&self) -> &Value {
        &self.load_context
    }

    fn load(&self, fields: &RichMap, extra: Extra<'_>) -> Result<Option<Native>, ConvertError> {
        (self.load)(fields, extra).map(|object| Some(Native::new(object)))
    }

    fn dump(&self, object: &Native, extra: Extra<'_>) -> Result<RichMap, ConvertError> {
        let object = object.downcast_ref::<T>().ok_or_else(|| {
            ConvertError::new(format!("expected {}", std::any::type_name::<T>()))
        })?;
        Ok((self.dump)(object, extra))
    }
}

impl<T> fmt::Debug for CustomNodeType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomNodeType").field("id", &self.id).finish()
    }
}

/// `my_crate::model::User<u8>` -> `User`
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
