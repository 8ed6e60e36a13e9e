use std::collections::HashMap;

use serde_json::Value;

/// Resolves remote `@context` URLs to context documents.
///
/// Implementations return the whole context document (`{"@context": ...}`),
/// or `None` if the URL is unknown. Nothing here touches the network.
pub trait ContextLoader: Send + Sync {
    fn load_context(&self, url: &str) -> Option<&Value>;
}

/// In-memory loader holding pre-registered context documents by URL.
#[derive(Clone, Debug, Default)]
pub struct StaticLoader {
    documents: HashMap<String, Value>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context document under `url`.
    ///
    /// A bare context object (without a wrapping `@context` key) is wrapped
    /// so lookups always return a full context document.
    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        let document = match document {
            Value::Object(ref map) if map.contains_key("@context") => document,
            other => serde_json::json!({ "@context": other }),
        };
        self.documents.insert(url.into(), document);
    }

    /// Builder-style variant of [`StaticLoader::insert`].
    pub fn with_context(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ContextLoader for StaticLoader {
    fn load_context(&self, url: &str) -> Option<&Value> {
        self.documents.get(url)
    }
}

/// Loader that knows no URLs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLoader;

impl ContextLoader for NoLoader {
    fn load_context(&self, _url: &str) -> Option<&Value> {
        None
    }
}
