use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::context::{ContainerType, Context, TermDefinition};
use crate::error::{LdError, Result};
use crate::loader::ContextLoader;

/// Compact an expanded JSON-LD structure against `context_value`.
///
/// Terms are chosen per value: a term whose IRI and type mapping both match
/// lets the value collapse to its bare scalar; otherwise the value keeps its
/// expanded form under an uncoerced term or the (vocab-relative) IRI.
/// Single-item arrays are folded unless the term declares a container.
/// The result carries `@context` unless the context is empty.
pub fn compact_document(
    expanded: &Value,
    context_value: &Value,
    loader: &dyn ContextLoader,
) -> Result<Value> {
    let inner = context_value.get("@context").unwrap_or(context_value);
    let context = Context::from_value(inner, loader)?;

    let compacted = compact_element(expanded, &context, loader)?;

    let mut result = match compacted {
        Value::Array(mut items) => match items.len() {
            0 => Map::new(),
            1 => match items.remove(0) {
                Value::Object(map) => map,
                other => {
                    return Err(LdError::compaction(format!(
                        "top-level item is not a node: {other}"
                    )));
                }
            },
            _ => {
                let mut map = Map::new();
                map.insert(context.keyword_alias("@graph"), Value::Array(items));
                map
            }
        },
        Value::Object(map) => map,
        other => {
            return Err(LdError::compaction(format!(
                "expanded input must be an array or object, got: {other}"
            )));
        }
    };

    if !is_empty_context(inner) {
        result.insert("@context".to_string(), inner.clone());
    }

    Ok(Value::Object(result))
}

fn is_empty_context(context: &Value) -> bool {
    match context {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.iter().all(is_empty_context),
        _ => false,
    }
}

fn compact_element(element: &Value, context: &Context, loader: &dyn ContextLoader) -> Result<Value> {
    match element {
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                result.push(compact_element(item, context, loader)?);
            }
            Ok(Value::Array(result))
        }
        Value::Object(map) if map.contains_key("@value") => Ok(expanded_value_object(map, context)),
        Value::Object(map) => Ok(Value::Object(compact_node(map, context, loader)?)),
        other => Ok(other.clone()),
    }
}

/// Values collected for one output key, with the container of the chosen term.
struct Slot {
    values: Vec<Value>,
    container: Option<ContainerType>,
}

fn compact_node(
    node: &Map<String, Value>,
    active: &Context,
    loader: &dyn ContextLoader,
) -> Result<Map<String, Value>> {
    let mut result = Map::new();

    // Compact @type first: the compacted type terms may carry scoped contexts
    let mut context = active.clone();
    if let Some(types) = node.get("@type") {
        let mut compacted: Vec<String> = match types {
            Value::Array(items) => items
                .iter()
                .filter_map(|t| t.as_str())
                .map(|t| active.compact_vocab_iri(t))
                .collect(),
            Value::String(t) => vec![active.compact_vocab_iri(t)],
            _ => return Err(LdError::compaction(format!("invalid @type value: {types}"))),
        };

        let mut scoped_terms = compacted.clone();
        scoped_terms.sort_unstable();
        for term in &scoped_terms {
            if let Some(scoped) = active.get_term(term).and_then(|def| def.context.as_ref()) {
                context.process(scoped, loader)?;
            }
        }

        let value = if compacted.len() == 1 {
            Value::String(compacted.remove(0))
        } else {
            Value::Array(compacted.into_iter().map(Value::String).collect())
        };
        result.insert(active.keyword_alias("@type"), value);
    }

    let mut slots: BTreeMap<String, Slot> = BTreeMap::new();

    for (key, value) in node {
        match key.as_str() {
            "@type" => continue,
            "@id" => {
                result.insert(context.keyword_alias("@id"), value.clone());
                continue;
            }
            "@graph" => {
                let compacted = compact_element(value, &context, loader)?;
                result.insert(context.keyword_alias("@graph"), compacted);
                continue;
            }
            k if k.starts_with('@') => {
                result.insert(key.clone(), value.clone());
                continue;
            }
            _ => {}
        }

        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        if items.is_empty() {
            let term = fallback_term(key, &context);
            let container = context.get_term(&term).and_then(|def| def.container.clone());
            slots.entry(term).or_insert(Slot {
                values: Vec::new(),
                container,
            });
            continue;
        }

        for item in items {
            let (term, compacted, container) = compact_property_item(key, item, &context, loader)?;
            slots
                .entry(term)
                .or_insert_with(|| Slot {
                    values: Vec::new(),
                    container,
                })
                .values
                .push(compacted);
        }
    }

    for (term, mut slot) in slots {
        let value = match slot.container {
            Some(ContainerType::List) if slot.values.len() == 1 => slot.values.remove(0),
            Some(ContainerType::List) | Some(ContainerType::Set) => Value::Array(slot.values),
            _ if slot.values.len() == 1 => slot.values.remove(0),
            _ => Value::Array(slot.values),
        };
        result.insert(term, value);
    }

    Ok(result)
}

/// Choose the output term for one expanded value of property `iri`, and compact the value.
fn compact_property_item(
    iri: &str,
    item: &Value,
    context: &Context,
    loader: &dyn ContextLoader,
) -> Result<(String, Value, Option<ContainerType>)> {
    let candidates: Vec<(&str, &TermDefinition)> = context
        .terms_for_iri(iri)
        .into_iter()
        .filter(|(_, def)| !def.is_null())
        .collect();

    let Some(map) = item.as_object() else {
        return Ok((fallback_term(iri, context), item.clone(), None));
    };

    // Value objects
    if let Some(scalar) = map.get("@value") {
        if let Some(term) = select_value_term(map, &candidates, context) {
            let container = term_container(context, term);
            return Ok((term.to_string(), scalar.clone(), container));
        }
        let term = fallback_term(iri, context);
        let plain = !map.contains_key("@type")
            && map.get("@language").and_then(Value::as_str) == context.default_language.as_deref();
        // A plain value under a key with no term definition needs no expanded form
        if plain && context.get_term(&term).is_none() {
            return Ok((term, scalar.clone(), None));
        }
        return Ok((term, expanded_value_object(map, context), None));
    }

    // List objects
    if let Some(list) = map.get("@list") {
        let members = list.as_array().map(Vec::as_slice).unwrap_or_default();
        if let Some((term, def)) = candidates
            .iter()
            .find(|(_, def)| def.container == Some(ContainerType::List))
        {
            let mut compacted = Vec::with_capacity(members.len());
            for member in members {
                compacted.push(compact_list_member(member, def, context, loader)?);
            }
            return Ok((
                term.to_string(),
                Value::Array(compacted),
                Some(ContainerType::List),
            ));
        }
        let mut compacted = Vec::with_capacity(members.len());
        for member in members {
            compacted.push(compact_element(member, context, loader)?);
        }
        let mut wrapper = Map::new();
        wrapper.insert("@list".to_string(), Value::Array(compacted));
        return Ok((fallback_term(iri, context), Value::Object(wrapper), None));
    }

    // Node references may collapse to a bare IRI under an @id-coerced term
    if map.len() == 1
        && let Some(id) = map.get("@id")
        && let Some((term, def)) = candidates.iter().find(|(_, def)| {
            matches!(def.type_mapping.as_deref(), Some("@id") | Some("@vocab"))
                && def.container != Some(ContainerType::List)
        })
    {
        return Ok((term.to_string(), id.clone(), def.container.clone()));
    }

    // Node objects
    let selected = candidates.iter().find(|(_, def)| {
        def.type_mapping.is_none() && def.container != Some(ContainerType::List)
    });
    let (term, container, scoped) = match selected {
        Some((term, def)) => (term.to_string(), def.container.clone(), def.context.as_ref()),
        None => (fallback_term(iri, context), None, None),
    };
    let node_context = match scoped {
        Some(scoped) => context.with_scoped_context(scoped, loader)?,
        None => context.clone(),
    };
    let compacted = compact_node(map, &node_context, loader)?;
    Ok((term, Value::Object(compacted), container))
}

/// A term that lets the value object collapse to its bare `@value`.
fn select_value_term<'a>(
    map: &Map<String, Value>,
    candidates: &[(&'a str, &TermDefinition)],
    context: &Context,
) -> Option<&'a str> {
    let value_type = map.get("@type").and_then(Value::as_str);
    let language = map.get("@language").and_then(Value::as_str);

    candidates
        .iter()
        .filter(|(_, def)| def.container != Some(ContainerType::List))
        .find(|(_, def)| match (value_type, language) {
            (Some(t), _) => def.type_mapping.as_deref() == Some(t),
            (None, lang) => {
                def.type_mapping.is_none() && lang == context.default_language.as_deref()
            }
        })
        .map(|(term, _)| *term)
}

fn compact_list_member(
    member: &Value,
    def: &TermDefinition,
    context: &Context,
    loader: &dyn ContextLoader,
) -> Result<Value> {
    let Some(map) = member.as_object() else {
        return Ok(member.clone());
    };
    if let Some(scalar) = map.get("@value") {
        let value_type = map.get("@type").and_then(Value::as_str);
        let language = map.get("@language").and_then(Value::as_str);
        let bare = match value_type {
            Some(t) => def.type_mapping.as_deref() == Some(t),
            None => def.type_mapping.is_none() && language == context.default_language.as_deref(),
        };
        if bare {
            return Ok(scalar.clone());
        }
        return Ok(expanded_value_object(map, context));
    }
    if map.len() == 1
        && let Some(id) = map.get("@id")
        && matches!(def.type_mapping.as_deref(), Some("@id") | Some("@vocab"))
    {
        return Ok(id.clone());
    }
    Ok(Value::Object(compact_node(map, context, loader)?))
}

/// Keep a value object in expanded form, compacting only its datatype IRI.
fn expanded_value_object(map: &Map<String, Value>, context: &Context) -> Value {
    let mut result = Map::new();
    for (key, value) in map {
        let value = match (key.as_str(), value) {
            ("@type", Value::String(t)) => Value::String(context.compact_vocab_iri(t)),
            _ => value.clone(),
        };
        result.insert(key.clone(), value);
    }
    Value::Object(result)
}

fn fallback_term(iri: &str, context: &Context) -> String {
    context
        .terms_for_iri(iri)
        .into_iter()
        .find(|(_, def)| {
            !def.is_null() && def.type_mapping.is_none() && def.container != Some(ContainerType::List)
        })
        .map(|(term, _)| term.to_string())
        .unwrap_or_else(|| context.compact_vocab_iri(iri))
}

fn term_container(context: &Context, term: &str) -> Option<ContainerType> {
    context.get_term(term).and_then(|def| def.container.clone())
}
