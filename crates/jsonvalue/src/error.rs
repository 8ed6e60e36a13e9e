use std::fmt;

use jsonvalue_ld::LdError;
use serde::Serialize;

use crate::rich::RichValue;

/// A single field that failed to load or dump.
#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
#[error("{term} ({}): {value}{}", .type_iri.as_deref().unwrap_or("no type"), reason_suffix(.reason))]
pub struct ConversionError {
    /// Expanded property IRI the value was found under.
    pub term: String,
    /// The value type or node type involved, if any.
    #[serde(rename = "type")]
    pub type_iri: Option<String>,
    /// The offending value.
    pub value: RichValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|reason| format!(" ({reason})"))
        .unwrap_or_default()
}

/// What a converter returns when it cannot handle a value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ConvertError(pub String);

impl ConvertError {
    pub fn new(msg: impl fmt::Display) -> Self {
        Self(msg.to_string())
    }
}

/// Errors returned by [`JsonValue`](crate::JsonValue) operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonValueError {
    #[error("Load failed with {} error(s): {}", .0.len(), ErrorList(.0))]
    Load(Vec<ConversionError>),

    #[error("Dump failed with {} error(s): {}", .0.len(), ErrorList(.0))]
    Dump(Vec<ConversionError>),

    #[error("A node type is already registered for native type {0}")]
    DuplicateNodeType(String),

    #[error("JSON-LD processing error: {0}")]
    Processor(#[from] LdError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type alias for jsonvalue operations.
pub type Result<T> = std::result::Result<T, JsonValueError>;

impl JsonValueError {
    pub fn invalid_document(msg: impl fmt::Display) -> Self {
        Self::InvalidDocument(msg.to_string())
    }

    /// The field errors of a `Load` or `Dump` failure, empty otherwise.
    pub fn errors(&self) -> &[ConversionError] {
        match self {
            Self::Load(errors) | Self::Dump(errors) => errors,
            _ => &[],
        }
    }
}

struct ErrorList<'a>(&'a [ConversionError]);

impl fmt::Display for ErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}
