//! Value types for the schema.org data types.
//!
//! Dates and times load as `chrono` values, everything else stays plain JSON.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use crate::error::ConvertError;
use crate::rich::RichValue;
use crate::types::{Extra, ValueType};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Any schema.org data type. Accepts every value unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct DataType;

impl ValueType for DataType {
    fn id(&self) -> &str {
        "http://schema.org/DataType"
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Boolean;

impl ValueType for Boolean {
    fn id(&self) -> &str {
        "http://schema.org/Boolean"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_boolean()
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        matches!(value, RichValue::Bool(_))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Number;

impl ValueType for Number {
    fn id(&self) -> &str {
        "http://schema.org/Number"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_number()
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        matches!(value, RichValue::Number(_))
    }
}

/// A number that always loads as a float.
#[derive(Clone, Copy, Debug, Default)]
pub struct Float;

impl ValueType for Float {
    fn id(&self) -> &str {
        "http://schema.org/Float"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_number()
    }

    fn load(&self, value: &Value, _extra: Extra<'_>) -> Result<RichValue, ConvertError> {
        value
            .as_f64()
            .map(RichValue::from)
            .ok_or_else(|| ConvertError::new(format!("not a number: {value}")))
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        matches!(value, RichValue::Number(_))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Integer;

impl ValueType for Integer {
    fn id(&self) -> &str {
        "http://schema.org/Integer"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_i64() || value.is_u64()
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        value.as_number().is_some_and(|n| n.is_i64() || n.is_u64())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Text;

impl ValueType for Text {
    fn id(&self) -> &str {
        "http://schema.org/Text"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_string()
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        matches!(value, RichValue::String(_))
    }
}

/// Text holding a URL. The URL itself is not checked.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default)]
pub struct URL;

impl ValueType for URL {
    fn id(&self) -> &str {
        "http://schema.org/URL"
    }

    fn validate_load(&self, value: &Value, extra: Extra<'_>) -> bool {
        Text.validate_load(value, extra)
    }

    fn validate_dump(&self, value: &RichValue, extra: Extra<'_>) -> bool {
        Text.validate_dump(value, extra)
    }
}

/// `YYYY-MM-DD` as [`NaiveDate`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Date;

impl ValueType for Date {
    fn id(&self) -> &str {
        "http://schema.org/Date"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_string()
    }

    fn load(&self, value: &Value, _extra: Extra<'_>) -> Result<RichValue, ConvertError> {
        let text = expect_str(value)?;
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(RichValue::native)
            .map_err(|e| ConvertError::new(format!("invalid date {text:?}: {e}")))
    }

    // rejects datetimes
    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        value.downcast_ref::<NaiveDate>().is_some()
    }

    fn dump(&self, value: &RichValue, _extra: Extra<'_>) -> Result<Value, ConvertError> {
        value
            .downcast_ref::<NaiveDate>()
            .map(|date| Value::String(date.format(DATE_FORMAT).to_string()))
            .ok_or_else(|| ConvertError::new(format!("not a date: {value}")))
    }
}

/// Date and time, with or without a UTC offset.
///
/// Loads as [`NaiveDateTime`] when there is no offset and as
/// `chrono::DateTime<FixedOffset>` otherwise. A bare date is rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateTime;

impl ValueType for DateTime {
    fn id(&self) -> &str {
        "http://schema.org/DateTime"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_string()
    }

    fn load(&self, value: &Value, _extra: Extra<'_>) -> Result<RichValue, ConvertError> {
        let text = expect_str(value)?;
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
            return Ok(RichValue::native(naive));
        }
        chrono::DateTime::<FixedOffset>::parse_from_rfc3339(text)
            .map(RichValue::native)
            .map_err(|e| ConvertError::new(format!("invalid datetime {text:?}: {e}")))
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        value.downcast_ref::<NaiveDateTime>().is_some()
            || value.downcast_ref::<chrono::DateTime<FixedOffset>>().is_some()
            || value.downcast_ref::<chrono::DateTime<Utc>>().is_some()
    }

    fn dump(&self, value: &RichValue, _extra: Extra<'_>) -> Result<Value, ConvertError> {
        let text = if let Some(naive) = value.downcast_ref::<NaiveDateTime>() {
            naive.format(DATETIME_FORMAT).to_string()
        } else if let Some(offset) = value.downcast_ref::<chrono::DateTime<FixedOffset>>() {
            offset.to_rfc3339()
        } else if let Some(utc) = value.downcast_ref::<chrono::DateTime<Utc>>() {
            utc.to_rfc3339()
        } else {
            return Err(ConvertError::new(format!("not a datetime: {value}")));
        };
        Ok(Value::String(text))
    }
}

/// `HH:MM:SS[.fff]` as [`NaiveTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Time;

impl ValueType for Time {
    fn id(&self) -> &str {
        "http://schema.org/Time"
    }

    fn validate_load(&self, value: &Value, _extra: Extra<'_>) -> bool {
        value.is_string()
    }

    fn load(&self, value: &Value, _extra: Extra<'_>) -> Result<RichValue, ConvertError> {
        let text = expect_str(value)?;
        NaiveTime::parse_from_str(text, TIME_FORMAT)
            .map(RichValue::native)
            .map_err(|e| ConvertError::new(format!("invalid time {text:?}: {e}")))
    }

    fn validate_dump(&self, value: &RichValue, _extra: Extra<'_>) -> bool {
        value.downcast_ref::<NaiveTime>().is_some()
    }

    fn dump(&self, value: &RichValue, _extra: Extra<'_>) -> Result<Value, ConvertError> {
        value
            .downcast_ref::<NaiveTime>()
            .map(|time| Value::String(time.format(TIME_FORMAT).to_string()))
            .ok_or_else(|| ConvertError::new(format!("not a time: {value}")))
    }
}

fn expect_str(value: &Value) -> Result<&str, ConvertError> {
    value
        .as_str()
        .ok_or_else(|| ConvertError::new(format!("expected a string, got {value}")))
}

/// Every schema.org data type, for
/// [`TypeRegistry::register_value_vocabulary`](crate::TypeRegistry::register_value_vocabulary).
pub fn data_type_vocabulary() -> Vec<Arc<dyn ValueType>> {
    vec![
        Arc::new(DataType),
        Arc::new(Boolean),
        Arc::new(Number),
        Arc::new(Float),
        Arc::new(Integer),
        Arc::new(Text),
        Arc::new(URL),
        Arc::new(Date),
        Arc::new(DateTime),
        Arc::new(Time),
    ]
}
