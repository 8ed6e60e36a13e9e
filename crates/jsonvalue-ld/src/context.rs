use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{LdError, Result};
use crate::loader::ContextLoader;

/// Limit for nested remote contexts and for terms defined through other terms.
const MAX_DEPTH: usize = 8;

/// An active context: term definitions plus the context-wide keywords.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub terms: HashMap<String, TermDefinition>,
    pub vocab: Option<String>,
    pub base: Option<String>,
    pub default_language: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TermDefinition {
    /// Empty for a term mapped to `null`.
    pub iri: String,
    /// `@type` coercion: a datatype IRI, `@id` or `@vocab`.
    pub type_mapping: Option<String>,
    pub container: Option<ContainerType>,
    /// Scoped context applied below this term.
    pub context: Option<Value>,
    pub protected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerType {
    Set,
    List,
    Graph,
}

impl ContainerType {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "@set" => Some(Self::Set),
            "@list" => Some(Self::List),
            "@graph" => Some(Self::Graph),
            _ => None,
        }
    }
}

impl TermDefinition {
    fn unmapped() -> Self {
        Self::mapped(String::new(), false)
    }

    fn mapped(iri: String, protected: bool) -> Self {
        Self {
            iri,
            type_mapping: None,
            container: None,
            context: None,
            protected,
        }
    }

    pub fn is_null(&self) -> bool {
        self.iri.is_empty()
    }

    /// Whether `other` may replace this definition.
    fn allows(&self, other: &TermDefinition) -> bool {
        !self.protected || (self.iri == other.iri && self.type_mapping == other.type_mapping)
    }
}

impl Context {
    pub fn from_value(value: &Value, loader: &dyn ContextLoader) -> Result<Context> {
        let mut context = Context::default();
        context.process(value, loader)?;
        Ok(context)
    }

    /// Merge a `@context` value into this context.
    ///
    /// Accepts an object, a URL resolved through `loader`, `null` (which
    /// clears everything) or an array of those, applied in order.
    pub fn process(&mut self, value: &Value, loader: &dyn ContextLoader) -> Result<()> {
        self.merge(value, loader, 0)
    }

    fn merge(&mut self, value: &Value, loader: &dyn ContextLoader, remote_depth: usize) -> Result<()> {
        match value {
            Value::Null => *self = Context::default(),
            Value::Object(local) => self.merge_local(local)?,
            Value::String(url) => self.merge_remote(url, loader, remote_depth)?,
            Value::Array(contexts) => {
                for context in contexts {
                    self.merge(context, loader, remote_depth)?;
                }
            }
            other => return Err(LdError::context(format!("invalid @context value: {other}"))),
        }
        Ok(())
    }

    fn merge_remote(&mut self, url: &str, loader: &dyn ContextLoader, remote_depth: usize) -> Result<()> {
        if remote_depth >= MAX_DEPTH {
            return Err(LdError::context(format!("too many nested remote contexts at {url}")));
        }
        let document = loader
            .load_context(url)
            .ok_or_else(|| LdError::context(format!("no context loaded for {url}")))?;
        let inner = document
            .get("@context")
            .ok_or_else(|| LdError::context(format!("{url} is not a context document")))?;
        tracing::trace!(url, "merging remote context");
        self.merge(inner, loader, remote_depth + 1)
    }

    fn merge_local(&mut self, local: &Map<String, Value>) -> Result<()> {
        for (keyword, slot) in [
            ("@vocab", &mut self.vocab),
            ("@base", &mut self.base),
            ("@language", &mut self.default_language),
        ] {
            if let Some(value) = local.get(keyword) {
                *slot = value.as_str().map(str::to_string);
            }
        }
        let protected = local.get("@protected").and_then(Value::as_bool).unwrap_or(false);

        let resolver = Resolver { active: &*self, local };
        let definitions = local
            .iter()
            .filter(|(term, _)| !term.starts_with('@'))
            .map(|(term, value)| resolver.define(term, value, protected).map(|def| (term, def)))
            .collect::<Result<Vec<_>>>()?;

        for (term, definition) in definitions {
            if let Some(existing) = self.terms.get(term)
                && !existing.allows(&definition)
            {
                return Err(LdError::context(format!("protected term {term:?} cannot be redefined")));
            }
            self.terms.insert(term.clone(), definition);
        }
        Ok(())
    }

    /// Expand a term, compact IRI or vocab-relative name to an absolute IRI.
    /// `None` for names the context leaves unmapped.
    pub fn expand_iri(&self, value: &str) -> Option<String> {
        if value.starts_with('@') || is_absolute_iri(value) {
            return Some(value.to_string());
        }
        if let Some(definition) = self.terms.get(value) {
            return (!definition.is_null()).then(|| definition.iri.clone());
        }
        if let Some((prefix, suffix)) = split_compact_iri(value) {
            if let Some(definition) = self.terms.get(prefix) {
                return Some(format!("{}{suffix}", definition.iri));
            }
            if is_scheme(prefix) {
                return Some(value.to_string());
            }
        }
        self.vocab.as_ref().map(|vocab| format!("{vocab}{value}"))
    }

    pub fn get_term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// A copy of this context with `scoped` merged on top.
    pub fn with_scoped_context(&self, scoped: &Value, loader: &dyn ContextLoader) -> Result<Context> {
        let mut child = self.clone();
        child.process(scoped, loader)?;
        Ok(child)
    }

    /// Terms mapped to `iri`, shortest first, ties broken alphabetically.
    pub fn terms_for_iri(&self, iri: &str) -> Vec<(&str, &TermDefinition)> {
        let mut found: Vec<_> = self
            .terms
            .iter()
            .filter_map(|(term, def)| (def.iri == iri).then_some((term.as_str(), def)))
            .collect();
        found.sort_by_key(|(term, _)| (term.len(), *term));
        found
    }

    /// The term aliasing `keyword` (`"id"` for `@id`), else the keyword.
    pub fn keyword_alias(&self, keyword: &str) -> String {
        match self.terms_for_iri(keyword).first() {
            Some((term, _)) => term.to_string(),
            None => keyword.to_string(),
        }
    }

    /// Shortest name for an IRI in key or `@type` position.
    ///
    /// In order: a term with no coercion, a suffix of `@vocab`, a
    /// `prefix:suffix` compact IRI, the IRI unchanged.
    pub fn compact_vocab_iri(&self, iri: &str) -> String {
        let plain_term = self
            .terms_for_iri(iri)
            .into_iter()
            .find(|(_, def)| def.type_mapping.is_none() && def.container.is_none());
        if let Some((term, _)) = plain_term {
            return term.to_string();
        }

        if let Some(suffix) = self.vocab.as_deref().and_then(|vocab| iri.strip_prefix(vocab))
            && !suffix.is_empty()
            && !suffix.contains(':')
            && !self.terms.contains_key(suffix)
        {
            return suffix.to_string();
        }

        self.terms
            .iter()
            .filter(|(term, def)| is_prefix_term(term, def))
            .filter_map(|(term, def)| {
                let suffix = iri.strip_prefix(def.iri.as_str())?;
                (!suffix.is_empty()).then(|| format!("{term}:{suffix}"))
            })
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .unwrap_or_else(|| iri.to_string())
    }
}

fn is_prefix_term(term: &str, def: &TermDefinition) -> bool {
    !def.is_null()
        && def.type_mapping.is_none()
        && !term.contains(':')
        && (def.iri.ends_with('/') || def.iri.ends_with('#'))
}

/// Resolves IRIs while one local context is being merged.
///
/// Definitions in `local` win over `active`, so terms in the same object may
/// refer to each other in any order.
struct Resolver<'c> {
    active: &'c Context,
    local: &'c Map<String, Value>,
}

impl Resolver<'_> {
    fn define(&self, term: &str, value: &Value, protected: bool) -> Result<TermDefinition> {
        let expanded = match value {
            Value::Null => return Ok(TermDefinition::unmapped()),
            Value::String(iri) => return Ok(TermDefinition::mapped(self.resolve(iri, 0), protected)),
            Value::Object(expanded) => expanded,
            other => {
                return Err(LdError::context(format!("invalid definition for term {term:?}: {other}")));
            }
        };

        let id = expanded.get("@id").and_then(Value::as_str).unwrap_or(term);
        let mut definition = TermDefinition::mapped(self.resolve(id, 0), protected);
        definition.type_mapping = expanded
            .get("@type")
            .and_then(Value::as_str)
            .map(|datatype| {
                if datatype.starts_with('@') {
                    datatype.to_string()
                } else {
                    self.resolve(datatype, 0)
                }
            });
        definition.container = expanded
            .get("@container")
            .and_then(Value::as_str)
            .and_then(ContainerType::from_keyword);
        definition.context = expanded.get("@context").cloned();
        if let Some(flag) = expanded.get("@protected").and_then(Value::as_bool) {
            definition.protected = flag;
        }
        Ok(definition)
    }

    fn resolve(&self, value: &str, depth: usize) -> String {
        if value.starts_with('@') || is_absolute_iri(value) {
            return value.to_string();
        }
        if let Some(iri) = self.term_iri(value, depth) {
            return iri;
        }
        if let Some((prefix, suffix)) = split_compact_iri(value) {
            if let Some(iri) = self.term_iri(prefix, depth) {
                return format!("{iri}{suffix}");
            }
            if is_scheme(prefix) {
                return value.to_string();
            }
        }
        let vocab = self
            .local
            .get("@vocab")
            .and_then(Value::as_str)
            .or(self.active.vocab.as_deref());
        match vocab {
            Some(vocab) => format!("{vocab}{value}"),
            None => value.to_string(),
        }
    }

    fn term_iri(&self, term: &str, depth: usize) -> Option<String> {
        let local_id = match self.local.get(term) {
            Some(Value::String(id)) => Some(id.as_str()),
            Some(Value::Object(def)) => def.get("@id").and_then(Value::as_str),
            _ => None,
        };
        if depth < MAX_DEPTH
            && let Some(id) = local_id.filter(|id| *id != term)
        {
            return Some(self.resolve(id, depth + 1));
        }
        self.active.terms.get(term).map(|def| def.iri.clone())
    }
}

fn split_compact_iri(value: &str) -> Option<(&str, &str)> {
    value.split_once(':')
}

fn is_scheme(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Whether `value` has an IRI scheme: `scheme://…`, or one of the
/// registered schemes that have no authority part (`urn:`, `mailto:`, …).
pub fn is_absolute_iri(value: &str) -> bool {
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    if !scheme.starts_with(|c: char| c.is_ascii_alphabetic()) || !is_scheme(scheme) {
        return false;
    }
    rest.starts_with("//")
        || matches!(
            scheme,
            "urn" | "did" | "tel" | "mailto" | "data" | "blob" | "cid" | "mid" | "tag"
        )
}
