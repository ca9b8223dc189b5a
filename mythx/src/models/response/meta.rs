use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use super::ApiResponse;
use crate::errors::{MythXError, MythXResult};
use crate::models::{from_structured_value, to_structured_value};

/// The raw OpenAPI document, YAML or HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OASResponse {
    pub data: String,
}

impl OASResponse {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

impl ApiResponse for OASResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        value
            .get("data")
            .and_then(Value::as_str)
            .map(Self::new)
            .ok_or_else(|| MythXError::validation("data: expected a string"))
    }

    fn to_structured(&self) -> MythXResult<Value> {
        Ok(json!({ "data": self.data }))
    }

    /// The body is not JSON; it is kept verbatim.
    fn from_json(raw: &str) -> MythXResult<Self> {
        Ok(Self::new(raw))
    }

    fn to_json(&self) -> MythXResult<String> {
        Ok(self.data.clone())
    }
}

/// Version strings of the API and its analysis components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VersionResponse {
    #[serde(rename = "api")]
    pub api_version: String,

    #[serde(rename = "maru")]
    pub maru_version: String,

    #[serde(rename = "mythril")]
    pub mythril_version: String,

    #[serde(rename = "maestro")]
    pub maestro_version: String,

    #[serde(rename = "harvey")]
    pub harvey_version: String,

    #[serde(rename = "hash")]
    pub hashed_version: String,
}

impl ApiResponse for VersionResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oas_response_keeps_raw_text() {
        let raw = "openapi: 3.0.0\ninfo:\n  title: MythX API\n";
        let response = OASResponse::from_json(raw).unwrap();
        assert_eq!(response.data, raw);
        assert_eq!(response.to_json().unwrap(), raw);
        assert_eq!(response.to_structured().unwrap(), json!({ "data": raw }));
        assert!(OASResponse::from_structured(&json!({})).is_err());
    }

    #[test]
    fn test_version_response() {
        let structured = json!({
            "api": "v1.4.0",
            "maru": "0.3.4",
            "mythril": "0.20.0",
            "maestro": "1.2.11",
            "harvey": "0.0.11",
            "hash": "6e1a1a5e7c5c2b4e9f84b9e3ab9e2a71",
        });
        let response = VersionResponse::from_structured(&structured).unwrap();
        assert_eq!(response.api_version, "v1.4.0");
        assert_eq!(response.hashed_version, "6e1a1a5e7c5c2b4e9f84b9e3ab9e2a71");
        assert_eq!(response.to_structured().unwrap(), structured);
    }

    #[test]
    fn test_version_response_rejects_missing_component() {
        let err = VersionResponse::from_structured(&json!({"api": "v1.4.0"})).unwrap_err();
        assert!(matches!(err, MythXError::Validation { .. }));
    }
}
