//! JSON-LD processing for jsonvalue
//!
//! Provides the expansion and compaction algorithms the jsonvalue transform
//! engine runs documents through:
//! - Context processing (terms, type coercion, containers, scoped contexts)
//! - Expansion of compact documents to IRI-keyed form
//! - Compaction of expanded structures against a context
//!
//! The engine only depends on the [`JsonLdProcessor`] trait, so any other
//! processor can be plugged in instead of the bundled [`Processor`].

pub mod compact;
pub mod context;
pub mod error;
pub mod expand;
pub mod loader;

use serde_json::Value;

pub use context::{ContainerType, Context, TermDefinition};
pub use error::{LdError, Result};
pub use loader::{ContextLoader, NoLoader, StaticLoader};

/// The JSON-LD operations a transform needs.
///
/// Both operations work on plain JSON only: anything that must survive them
/// has to be representable as JSON-LD values.
pub trait JsonLdProcessor: Send + Sync {
    /// Expand `document`. `expand_context` is applied before the document's
    /// own `@context`.
    fn expand(&self, document: &Value, expand_context: Option<&Value>) -> Result<Value>;

    /// Compact an expanded structure against `context`.
    fn compact(&self, expanded: &Value, context: &Value) -> Result<Value>;
}

/// The bundled processor. Remote context URLs are resolved through its
/// [`StaticLoader`] only.
#[derive(Clone, Debug, Default)]
pub struct Processor {
    loader: StaticLoader,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `loader` to resolve `@context` URLs.
    pub fn with_loader(loader: StaticLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &StaticLoader {
        &self.loader
    }
}

impl JsonLdProcessor for Processor {
    fn expand(&self, document: &Value, expand_context: Option<&Value>) -> Result<Value> {
        let expanded = expand::expand_document(document, expand_context, &self.loader)?;
        tracing::debug!(expanded = %expanded, "JSON-LD expanded form");
        Ok(expanded)
    }

    fn compact(&self, expanded: &Value, context: &Value) -> Result<Value> {
        let compacted = compact::compact_document(expanded, context, &self.loader)?;
        tracing::debug!(compacted = %compacted, "JSON-LD compacted form");
        Ok(compacted)
    }
}
