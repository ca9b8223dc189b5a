use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use validator::Validate;

use super::{ApiRequest, into_object};
use crate::errors::MythXResult;
use crate::models::{from_structured_value, to_structured_value};

/// Log in with an Ethereum address and password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthLoginRequest {
    #[validate(length(min = 1, message = "Ethereum address is required"))]
    pub eth_address: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl AuthLoginRequest {
    pub fn new(eth_address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            eth_address: eth_address.into(),
            password: password.into(),
        }
    }
}

impl ApiRequest for AuthLoginRequest {
    fn endpoint(&self) -> String {
        "auth/login".to_string()
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn payload(&self) -> MythXResult<Map<String, Value>> {
        Ok(into_object(self.to_structured()?))
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }

    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }
}

/// Invalidate the current session, or every session of the user when
/// `global` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AuthLogoutRequest {
    #[serde(default)]
    pub global: bool,
}

impl AuthLogoutRequest {
    pub fn new(global: bool) -> Self {
        Self { global }
    }
}

impl ApiRequest for AuthLogoutRequest {
    fn endpoint(&self) -> String {
        "auth/logout".to_string()
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }

    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }
}

/// Exchange a refresh token for a new token pair.
///
/// The structured form uses `access`/`refresh` keys while the wire payload
/// uses `accessToken`/`refreshToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AuthRefreshRequest {
    #[serde(rename = "access")]
    pub access_token: String,

    #[serde(rename = "refresh")]
    pub refresh_token: String,
}

impl AuthRefreshRequest {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl ApiRequest for AuthRefreshRequest {
    fn endpoint(&self) -> String {
        "auth/refresh".to_string()
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn payload(&self) -> MythXResult<Map<String, Value>> {
        Ok(into_object(json!({
            "accessToken": self.access_token,
            "refreshToken": self.refresh_token,
        })))
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }

    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }
}
