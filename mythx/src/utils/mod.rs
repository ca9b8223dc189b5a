//! Collection of small helpers shared by the models and the API layer.
//!
//! Timestamp handling follows the API's millisecond ISO-8601 format, and
//! validator errors are flattened into a single `field: message` string.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

pub mod jwt;

/// Formats a timestamp the way the API emits it, e.g. `2019-01-10T01:29:38.410Z`.
///
/// Instants with sub-millisecond digits keep them, so parsing the output
/// always yields the same instant.
pub fn serialize_api_timestamp(ts: &DateTime<Utc>) -> String {
    let format = if ts.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else {
        SecondsFormat::AutoSi
    };
    ts.to_rfc3339_opts(format, true)
}

/// Parses an API timestamp.
///
/// Accepts RFC 3339 strings with any offset as well as offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` strings, which are taken to be UTC.
pub fn deserialize_api_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("Invalid timestamp '{}': {}", raw, e))
}

/// serde adapter for required timestamp fields.
pub mod api_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::serialize_api_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::deserialize_api_timestamp(&raw).map_err(D::Error::custom)
    }
}

/// serde adapter for nullable timestamp fields.
pub mod api_timestamp_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&super::serialize_api_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::deserialize_api_timestamp(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

/// Formats validator errors into `field: message` pairs joined by `", "`.
///
/// Fields are sorted so the message is stable across runs.
pub fn validation_errors_to_message(errors: &validator::ValidationErrors) -> String {
    let mut field_errors: Vec<_> = errors.field_errors().into_iter().collect();
    field_errors.sort_by(|(a, _), (b, _)| a.cmp(b));

    let error_messages: Vec<String> = field_errors
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error.message.as_ref().unwrap_or(&"Invalid value".into()).to_string();
                // Struct-level checks are reported under `__all__`.
                if field == "__all__" {
                    message
                } else {
                    format!("{}: {}", field, message)
                }
            })
        })
        .collect();
    error_messages.join(", ")
}

/// Drops every `null` entry from a JSON object, recursing into nested objects.
pub fn strip_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, value| !value.is_null());
    for value in map.values_mut() {
        if let Value::Object(inner) = value {
            strip_nulls(inner);
        }
    }
}

/// Renders a JSON scalar as a query string value. Strings are used verbatim.
pub fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
