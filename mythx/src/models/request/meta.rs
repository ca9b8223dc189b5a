use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use super::ApiRequest;
use crate::errors::{MythXError, MythXResult};
use crate::models::{from_structured_value, to_structured_value};

/// Rendering of the OpenAPI document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenApiMode {
    #[default]
    Yaml,
    Html,
}

impl FromStr for OpenApiMode {
    type Err = MythXError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" => Ok(Self::Yaml),
            "html" => Ok(Self::Html),
            _ => Err(MythXError::validation(format!(
                "mode: must be one of html, yaml (got '{}')",
                s
            ))),
        }
    }
}

impl fmt::Display for OpenApiMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// Fetch the API's OpenAPI document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OASRequest {
    #[serde(default)]
    pub mode: OpenApiMode,
}

impl OASRequest {
    /// Builds a request for `mode`, which must be `yaml` or `html`.
    pub fn new(mode: &str) -> MythXResult<Self> {
        Ok(Self {
            mode: mode.parse()?,
        })
    }

    pub fn with_mode(mode: OpenApiMode) -> Self {
        Self { mode }
    }
}

impl ApiRequest for OASRequest {
    fn endpoint(&self) -> String {
        match self.mode {
            OpenApiMode::Yaml => "openapi.yaml".to_string(),
            OpenApiMode::Html => "openapi".to_string(),
        }
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }

    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }
}

/// Fetch the version strings of the API and its analysis components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionRequest;

impl ApiRequest for VersionRequest {
    fn endpoint(&self) -> String {
        "version".to_string()
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn to_structured(&self) -> MythXResult<Value> {
        Ok(json!({}))
    }

    fn from_structured(value: &Value) -> MythXResult<Self> {
        if value.is_object() {
            Ok(Self)
        } else {
            Err(MythXError::validation("Version request must be an object"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oas_endpoints() {
        let yaml = OASRequest::new("yaml").unwrap();
        assert_eq!(yaml.endpoint(), "openapi.yaml");
        assert_eq!(yaml.method(), Method::GET);
        assert!(yaml.payload().unwrap().is_empty());
        assert!(yaml.parameters().unwrap().is_empty());

        let html = OASRequest::new("html").unwrap();
        assert_eq!(html.endpoint(), "openapi");
        assert_eq!(html.to_structured().unwrap(), json!({"mode": "html"}));
    }

    #[test]
    fn test_oas_rejects_unknown_mode() {
        assert!(matches!(
            OASRequest::new("xml"),
            Err(MythXError::Validation { .. })
        ));
        assert!(OASRequest::from_structured(&json!({"mode": "xml"})).is_err());
        assert_eq!(
            OASRequest::from_structured(&json!({})).unwrap(),
            OASRequest::default()
        );
    }

    #[test]
    fn test_version_request() {
        let req = VersionRequest;
        assert_eq!(req.endpoint(), "version");
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.to_json().unwrap(), "{}");
        assert_eq!(VersionRequest::from_json("{}").unwrap(), VersionRequest);
        assert!(VersionRequest::from_json("[]").is_err());
    }
}
