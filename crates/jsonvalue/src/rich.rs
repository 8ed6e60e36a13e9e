//! The rich value tree: JSON that may also carry native Rust values.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};

/// Fields of a rich object, keyed by term.
pub type RichMap = BTreeMap<String, RichValue>;

/// Capability every native value stored in a [`RichValue`] has.
///
/// Implemented for any `'static` type that is `Debug + PartialEq + Send + Sync`,
/// so dates, user structs and the like need no extra code.
pub trait NativeObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Dynamic equality: `false` when `other` is of a different type.
    fn eq_native(&self, other: &dyn NativeObject) -> bool;

    fn type_name(&self) -> &'static str;
}

impl<T> NativeObject for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_native(&self, other: &dyn NativeObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A shared handle to a native value.
#[derive(Clone)]
pub struct Native(Arc<dyn NativeObject>);

impl Native {
    pub fn new<T: NativeObject>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// `TypeId` of the concrete value, used to pick its node type.
    pub fn native_type(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_native(&*other.0)
    }
}

/// A JSON value that may also hold native values anywhere in the tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RichValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<RichValue>),
    Object(RichMap),
    Native(Native),
}

impl RichValue {
    /// Wrap a native value.
    pub fn native<T: NativeObject>(value: T) -> Self {
        Self::Native(Native::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `true` if no native value occurs anywhere in the tree.
    pub fn is_plain(&self) -> bool {
        match self {
            Self::Native(_) => false,
            Self::Array(items) => items.iter().all(Self::is_plain),
            Self::Object(map) => map.values().all(Self::is_plain),
            _ => true,
        }
    }

    /// Convert back to plain JSON. `None` if the tree holds a native value.
    pub fn to_json(&self) -> Option<Value> {
        Some(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            Self::Native(_) => return None,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<RichValue>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RichMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut RichMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&Native> {
        match self {
            Self::Native(native) => Some(native),
            _ => None,
        }
    }

    /// The native value as `T`, if this is a native of that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_native().and_then(Native::downcast_ref::<T>)
    }

    /// Field lookup on objects.
    pub fn get(&self, key: &str) -> Option<&RichValue> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl From<Value> for RichValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for RichValue {
    fn from(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<bool> for RichValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for RichValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for RichValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// Non-finite floats have no JSON form and become `Null`.
impl From<f64> for RichValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for RichValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for RichValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Native> for RichValue {
    fn from(value: Native) -> Self {
        Self::Native(value)
    }
}

impl From<Vec<RichValue>> for RichValue {
    fn from(value: Vec<RichValue>) -> Self {
        Self::Array(value)
    }
}

impl From<RichMap> for RichValue {
    fn from(value: RichMap) -> Self {
        Self::Object(value)
    }
}

impl<K: Into<String>> FromIterator<(K, RichValue)> for RichValue {
    fn from_iter<I: IntoIterator<Item = (K, RichValue)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// JSON text, with native values shown in their `Debug` form.
impl fmt::Display for RichValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{}", Value::String(s.clone())),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{value}", Value::String(key.clone()))?;
                }
                f.write_str("}")
            }
            Self::Native(native) => write!(f, "{native:?}"),
        }
    }
}

/// Serializes as JSON. Native values are written as their `Debug` string,
/// so error reports stay serializable.
impl Serialize for RichValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Self::Native(native) => serializer.serialize_str(&format!("{native:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn natives_compare_by_value() {
        let a = RichValue::native(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        let b = RichValue::native(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        let c = RichValue::native(NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, RichValue::native("2010-01-01".to_string()));
    }

    #[test]
    fn json_conversion() {
        let value = json!({"a": [1, true, null], "b": {"c": "d"}});
        let rich = RichValue::from(value.clone());
        assert!(rich.is_plain());
        assert_eq!(rich.to_json(), Some(value));

        let mut with_native = rich.clone();
        with_native
            .as_object_mut()
            .unwrap()
            .insert("when".into(), RichValue::native(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()));
        assert!(!with_native.is_plain());
        assert_eq!(with_native.to_json(), None);
    }

    #[test]
    fn downcast_and_type() {
        let date = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let rich = RichValue::native(date);
        assert_eq!(rich.downcast_ref::<NaiveDate>(), Some(&date));
        assert!(rich.downcast_ref::<String>().is_none());

        let native = rich.as_native().unwrap();
        assert_eq!(native.native_type(), TypeId::of::<NaiveDate>());
        assert!(native.type_name().ends_with("NaiveDate"));
    }

    #[test]
    fn display_and_serialize() {
        let rich: RichValue = [
            ("a", RichValue::from("x")),
            ("b", RichValue::native(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap())),
        ]
        .into_iter()
        .collect();
        assert_eq!(rich.to_string(), r#"{"a":"x","b":2010-01-01}"#);
        assert_eq!(
            serde_json::to_value(&rich).unwrap(),
            json!({"a": "x", "b": "2010-01-01"})
        );
    }
}
