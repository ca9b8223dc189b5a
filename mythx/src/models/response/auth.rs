use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use super::ApiResponse;
use crate::errors::{MythXError, MythXResult};
use crate::models::{from_structured_value, parse_json, to_structured_value};

/// Token pair issued on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AuthLoginResponse {
    #[serde(rename = "access")]
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,

    #[serde(rename = "refresh")]
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

impl ApiResponse for AuthLoginResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }
}

/// Token pair issued on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AuthRefreshResponse {
    #[serde(rename = "access")]
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,

    #[serde(rename = "refresh")]
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

impl ApiResponse for AuthRefreshResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }
}

/// Acknowledgement of a logout. The body must be an empty object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthLogoutResponse;

impl ApiResponse for AuthLogoutResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        match value {
            Value::Object(map) if map.is_empty() => Ok(Self),
            other => Err(MythXError::decode(format!(
                "Expected an empty logout response but got {}",
                other
            ))),
        }
    }

    fn to_structured(&self) -> MythXResult<Value> {
        Ok(json!({}))
    }

    fn from_json(raw: &str) -> MythXResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self);
        }
        Self::from_structured(&parse_json(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response() {
        let response =
            AuthLoginResponse::from_json(r#"{"access": "acc", "refresh": "ref"}"#).unwrap();
        assert_eq!(response.access_token, "acc");
        assert_eq!(response.refresh_token, "ref");
        assert_eq!(
            response.to_structured().unwrap(),
            json!({"access": "acc", "refresh": "ref"})
        );
    }

    #[test]
    fn test_login_response_rejects_missing_token() {
        let err = AuthLoginResponse::from_structured(&json!({"access": "acc"})).unwrap_err();
        assert!(err.to_string().contains("refresh"));
        let err = AuthRefreshResponse::from_structured(&json!({"access": "", "refresh": "ref"}))
            .unwrap_err();
        assert!(err.to_string().contains("Access token is required"));
    }

    #[test]
    fn test_logout_response_is_strict() {
        assert_eq!(AuthLogoutResponse::from_json("{}").unwrap(), AuthLogoutResponse);
        assert_eq!(AuthLogoutResponse::from_json("").unwrap(), AuthLogoutResponse);
        assert!(matches!(
            AuthLogoutResponse::from_json(r#"{"status": "ok"}"#),
            Err(MythXError::Decode { .. })
        ));
        assert!(AuthLogoutResponse::from_json("[]").is_err());
        assert_eq!(AuthLogoutResponse.to_json().unwrap(), "{}");
    }
}
