use crate::error::{ConversionError, JsonValueError, Result};
use crate::rich::RichValue;

/// Collects field errors during one traversal.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<ConversionError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        term: &str,
        type_iri: Option<&str>,
        value: RichValue,
        reason: Option<String>,
    ) {
        tracing::trace!(term, type_iri, %value, "conversion failed");
        self.errors.push(ConversionError {
            term: term.to_string(),
            type_iri: type_iri.map(str::to_string),
            value,
            reason,
        });
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The errors ordered by term. Errors sharing a term keep their
    /// traversal order.
    pub fn into_sorted(mut self) -> Vec<ConversionError> {
        self.errors.sort_by(|a, b| a.term.cmp(&b.term));
        self.errors
    }

    /// `Ok` if nothing was recorded, else the sorted errors wrapped by `kind`,
    /// e.g. `JsonValueError::Load`.
    pub fn finish(self, kind: fn(Vec<ConversionError>) -> JsonValueError) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        Err(kind(self.into_sorted()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_by_term_and_stable() {
        let mut errors = ErrorCollector::new();
        errors.record("http://example.com/b", None, RichValue::from("first b"), None);
        errors.record("http://example.com/a", Some("http://schema.org/Text"), RichValue::from(1i64), None);
        errors.record("http://example.com/b", None, RichValue::from("second b"), None);
        assert_eq!(errors.len(), 3);

        let sorted = errors.into_sorted();
        let terms: Vec<&str> = sorted.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(
            terms,
            ["http://example.com/a", "http://example.com/b", "http://example.com/b"]
        );
        assert_eq!(sorted[1].value, RichValue::from("first b"));
        assert_eq!(sorted[2].value, RichValue::from("second b"));
    }

    #[test]
    fn finish() {
        assert!(ErrorCollector::new().finish(JsonValueError::Load).is_ok());

        let mut errors = ErrorCollector::new();
        errors.record("http://example.com/a", None, RichValue::Null, Some("bad".into()));
        let err = errors.finish(JsonValueError::Dump).unwrap_err();
        assert!(matches!(&err, JsonValueError::Dump(list) if list.len() == 1));
    }
}
