//! Request models.
//!
//! A request knows its relative endpoint, its HTTP method and which of its
//! fields travel as query parameters, JSON payload or extra headers. The
//! [`crate::api::APIHandler`] turns it into a concrete HTTP call.

use std::collections::HashMap;

use reqwest::Method;
use serde_json::{Map, Value};

use crate::errors::MythXResult;
use crate::models::parse_json;

pub mod analysis;
pub mod auth;
pub mod meta;

pub use analysis::{
    AnalysisListRequest, AnalysisStatusRequest, AnalysisSubmissionRequest, DetectedIssuesRequest,
};
pub use auth::{AuthLoginRequest, AuthLogoutRequest, AuthRefreshRequest};
pub use meta::{OASRequest, OpenApiMode, VersionRequest};

/// Common behaviour of every request model.
pub trait ApiRequest: Sized {
    /// Endpoint path relative to the API base URL, without a leading slash.
    fn endpoint(&self) -> String;

    fn method(&self) -> Method;

    /// Request-specific headers. Auth headers are added by the client.
    fn headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Query parameters.
    fn parameters(&self) -> MythXResult<Map<String, Value>> {
        Ok(Map::new())
    }

    /// JSON body. Ignored for GET requests.
    fn payload(&self) -> MythXResult<Map<String, Value>> {
        Ok(Map::new())
    }

    /// Validated structured form.
    fn to_structured(&self) -> MythXResult<Value>;

    /// Builds and validates a request from its structured form.
    fn from_structured(value: &Value) -> MythXResult<Self>;

    fn to_json(&self) -> MythXResult<String> {
        Ok(self.to_structured()?.to_string())
    }

    fn from_json(raw: &str) -> MythXResult<Self> {
        Self::from_structured(&parse_json(raw)?)
    }
}

/// Unwraps the object inside a structured value produced by serde.
pub(crate) fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
