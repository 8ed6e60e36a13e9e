/*!
 * Per-call options for loading and dumping
 */

use std::any::Any;

use serde_json::Value;

use crate::types::Extra;

/// Options for [`JsonValue::load_objects`](crate::JsonValue::load_objects).
///
/// Example:
/// ```
/// use jsonvalue::config::LoadOptions;
/// use serde_json::json;
///
/// let context = json!({"foo": "http://example.com/foo"});
/// let request = String::from("my request");
/// let options = LoadOptions::new()
///     .with_context(&context)
///     .with_reject_unknown(true)
///     .with_extra(&request);
/// assert!(options.reject_unknown());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions<'a> {
    context: Option<&'a Value>,
    reject_unknown: bool,
    extra: Extra<'a>,
}

impl<'a> LoadOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context to expand and compact with.
    /// Default: the document's own `@context`, else an empty context
    pub fn with_context(mut self, context: &'a Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Treat literals whose type is missing or unregistered as errors
    /// Default: false
    pub fn with_reject_unknown(mut self, reject_unknown: bool) -> Self {
        self.reject_unknown = reject_unknown;
        self
    }

    /// Caller data passed to every converter
    pub fn with_extra(mut self, extra: &'a dyn Any) -> Self {
        self.extra = Extra::new(extra);
        self
    }

    pub fn context(&self) -> Option<&'a Value> {
        self.context
    }

    pub fn reject_unknown(&self) -> bool {
        self.reject_unknown
    }

    pub fn extra(&self) -> Extra<'a> {
        self.extra
    }
}

/// Options for [`JsonValue::dump_objects`](crate::JsonValue::dump_objects).
///
/// Example:
/// ```
/// use jsonvalue::config::DumpOptions;
/// use serde_json::json;
///
/// let context = json!({"foo": "http://example.com/foo"});
/// let options = DumpOptions::new().with_context(&context);
/// assert_eq!(options.context(), Some(&context));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct DumpOptions<'a> {
    context: Option<&'a Value>,
    extra: Extra<'a>,
}

impl<'a> DumpOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context to expand and compact with.
    /// Default: the value's own `@context`, else an empty context
    pub fn with_context(mut self, context: &'a Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Caller data passed to every converter
    pub fn with_extra(mut self, extra: &'a dyn Any) -> Self {
        self.extra = Extra::new(extra);
        self
    }

    pub fn context(&self) -> Option<&'a Value> {
        self.context
    }

    pub fn extra(&self) -> Extra<'a> {
        self.extra
    }
}
