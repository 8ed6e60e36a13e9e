use serde_json::{Map, Value, json};

use crate::context::{ContainerType, Context, TermDefinition, is_absolute_iri};
use crate::error::{LdError, Result};
use crate::loader::ContextLoader;

/// Expand a document so every key is an absolute IRI and every property
/// value is an array of node, value or list objects.
///
/// `expand_context` (a bare context or a `{"@context": …}` document) is
/// applied before the document's own `@context`. The result is always an
/// array; a top-level `@graph` is unwrapped and empty top-level nodes dropped.
pub fn expand_document(
    document: &Value,
    expand_context: Option<&Value>,
    loader: &dyn ContextLoader,
) -> Result<Value> {
    let mut active = Context::default();
    if let Some(context) = expand_context {
        active.process(context.get("@context").unwrap_or(context), loader)?;
    }

    let expander = Expander { loader };
    let mut items = Vec::new();
    expander.element(document, &active, &mut items)?;

    if let [Value::Object(only)] = items.as_slice()
        && only.len() == 1
        && let Some(Value::Array(graph)) = only.get("@graph")
    {
        items = graph.clone();
    }
    items.retain(|item| item.as_object().is_none_or(|node| !node.is_empty()));
    Ok(Value::Array(items))
}

struct Expander<'l> {
    loader: &'l dyn ContextLoader,
}

impl Expander<'_> {
    /// Top-level and `@graph` content: only node objects survive.
    fn element(&self, element: &Value, active: &Context, out: &mut Vec<Value>) -> Result<()> {
        match element {
            Value::Array(items) => {
                for item in items {
                    self.element(item, active, out)?;
                }
            }
            Value::Object(map) => push_expanded(self.object(map, active)?, out),
            _ => {}
        }
        Ok(())
    }

    fn object(&self, map: &Map<String, Value>, parent: &Context) -> Result<Value> {
        let local;
        let active = match map.get("@context") {
            Some(context) => {
                local = parent.with_scoped_context(context, self.loader)?;
                &local
            }
            None => parent,
        };

        if map.contains_key("@value") {
            return value_object(map, active);
        }
        if let Some(list) = map.get("@list") {
            return Ok(json!({"@list": self.values(list, None, active)?}));
        }
        if let Some(set) = map.get("@set") {
            return Ok(Value::Array(self.values(set, None, active)?));
        }

        let typed;
        let active = match self.type_scope(map, active)? {
            Some(scope) => {
                typed = scope;
                &typed
            }
            None => active,
        };

        let mut node = Map::new();
        for (key, value) in map {
            if key == "@context" {
                continue;
            }
            match keyword_of(key, active) {
                Some("@id") => {
                    if let Some(id) = value.as_str() {
                        node.insert("@id".to_string(), Value::String(id.to_string()));
                    }
                }
                Some("@type") => {
                    node.insert("@type".to_string(), type_values(value, active)?);
                }
                Some("@graph") => {
                    let mut graph = Vec::new();
                    self.element(value, active, &mut graph)?;
                    node.insert("@graph".to_string(), Value::Array(graph));
                }
                Some(_) => {}
                None => self.property(key, value, active, &mut node)?,
            }
        }
        Ok(Value::Object(node))
    }

    fn property(&self, key: &str, value: &Value, active: &Context, node: &mut Map<String, Value>) -> Result<()> {
        let Some(iri) = active.expand_iri(key).filter(|iri| is_absolute_iri(iri)) else {
            tracing::trace!(key, "dropping unmapped property");
            return Ok(());
        };
        let definition = active.get_term(key);
        let coercion = definition.and_then(|def| def.type_mapping.as_deref());

        let scoped;
        let inner = match definition.and_then(|def| def.context.as_ref()) {
            Some(context) => {
                scoped = active.with_scoped_context(context, self.loader)?;
                &scoped
            }
            None => active,
        };

        let mut values = self.values(value, coercion, inner)?;
        if is_list(definition) && !value.is_null() {
            values = vec![json!({"@list": values})];
        }
        if values.is_empty() && !value.is_array() {
            return Ok(());
        }
        match node.get_mut(&iri) {
            Some(Value::Array(existing)) => existing.extend(values),
            _ => {
                node.insert(iri, Value::Array(values));
            }
        }
        Ok(())
    }

    /// Expand a property value (or `@list`/`@set` content) into its items.
    fn values(&self, value: &Value, coercion: Option<&str>, active: &Context) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        match value {
            Value::Array(items) => {
                for item in items {
                    out.extend(self.values(item, coercion, active)?);
                }
            }
            Value::Object(map) => push_expanded(self.object(map, active)?, &mut out),
            Value::Null => {}
            scalar => out.push(literal(scalar, coercion, active)),
        }
        Ok(out)
    }

    /// The context after applying the scoped contexts of this node's types,
    /// in lexicographical order of the type terms. `None` if no type has one.
    fn type_scope(&self, map: &Map<String, Value>, active: &Context) -> Result<Option<Context>> {
        let types = map
            .iter()
            .find(|(key, _)| keyword_of(key, active) == Some("@type"))
            .map(|(_, value)| value);
        let mut names: Vec<&str> = match types {
            Some(Value::String(name)) => vec![name.as_str()],
            Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
            _ => return Ok(None),
        };
        names.sort_unstable();

        let mut scoped: Option<Context> = None;
        for scope in names
            .iter()
            .filter_map(|name| active.get_term(name).and_then(|def| def.context.as_ref()))
        {
            scoped
                .get_or_insert_with(|| active.clone())
                .process(scope, self.loader)?;
        }
        Ok(scoped)
    }
}

/// Append an expanded value, flattening arrays and skipping nulls.
fn push_expanded(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Null => {}
        Value::Array(items) => out.extend(items),
        other => out.push(other),
    }
}

/// `key` itself when it is a keyword, or the keyword it aliases.
fn keyword_of<'a>(key: &'a str, active: &'a Context) -> Option<&'a str> {
    if key.starts_with('@') {
        return Some(key);
    }
    active
        .get_term(key)
        .map(|def| def.iri.as_str())
        .filter(|iri| iri.starts_with('@'))
}

fn is_list(definition: Option<&TermDefinition>) -> bool {
    definition.is_some_and(|def| def.container == Some(ContainerType::List))
}

fn type_values(value: &Value, active: &Context) -> Result<Value> {
    let names: Vec<&str> = match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        other => return Err(LdError::expansion(format!("invalid @type value: {other}"))),
    };
    Ok(Value::Array(
        names
            .into_iter()
            .map(|name| Value::String(type_iri(name, active)))
            .collect(),
    ))
}

fn type_iri(name: &str, active: &Context) -> String {
    if is_absolute_iri(name) {
        return name.to_string();
    }
    match active.get_term(name) {
        Some(def) if is_absolute_iri(&def.iri) => def.iri.clone(),
        _ => datatype_iri(name, active),
    }
}

fn datatype_iri(name: &str, active: &Context) -> String {
    active.expand_iri(name).unwrap_or_else(|| name.to_string())
}

fn value_object(map: &Map<String, Value>, active: &Context) -> Result<Value> {
    let value = match map.get("@value") {
        None | Some(Value::Null) => return Ok(Value::Null),
        Some(Value::Array(_) | Value::Object(_)) => {
            return Err(LdError::expansion("@value must be a scalar"));
        }
        Some(value) => value,
    };

    let mut result = Map::new();
    result.insert("@value".to_string(), value.clone());
    if let Some(datatype) = map.get("@type") {
        let datatype = datatype
            .as_str()
            .ok_or_else(|| LdError::expansion(format!("invalid value @type: {datatype}")))?;
        result.insert("@type".to_string(), Value::String(datatype_iri(datatype, active)));
    }
    if let Some(language) = map.get("@language") {
        result.insert("@language".to_string(), language.clone());
    }
    Ok(Value::Object(result))
}

/// A scalar property value with the term's coercion applied.
fn literal(scalar: &Value, coercion: Option<&str>, active: &Context) -> Value {
    match (scalar, coercion) {
        (Value::String(reference), Some("@id" | "@vocab")) => {
            json!({"@id": active.expand_iri(reference).unwrap_or_else(|| reference.clone())})
        }
        (_, Some(datatype)) if !datatype.starts_with('@') => {
            json!({"@value": scalar, "@type": datatype_iri(datatype, active)})
        }
        (Value::String(_), _) => match &active.default_language {
            Some(language) => json!({"@value": scalar, "@language": language}),
            None => json!({"@value": scalar}),
        },
        _ => json!({"@value": scalar}),
    }
}
