use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use validator::Validate;

use super::{ApiRequest, into_object};
use crate::errors::MythXResult;
use crate::models::{from_structured_value, to_structured_value};
use crate::utils::{api_timestamp_opt, strip_nulls};

/// Analysis modes accepted by the submission endpoint.
pub const ANALYSIS_MODES: [&str; 2] = ["quick", "full"];

fn default_analysis_mode() -> String {
    "quick".to_string()
}

fn validate_analysis_mode(mode: &str) -> Result<(), validator::ValidationError> {
    if ANALYSIS_MODES.contains(&mode) {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("invalid_analysis_mode");
        error.message =
            Some(format!("Analysis mode must be one of quick, full (got '{}')", mode).into());
        Err(error)
    }
}

fn validate_sources_not_empty(
    sources: &Map<String, Value>,
) -> Result<(), validator::ValidationError> {
    if sources.is_empty() {
        let mut error = validator::ValidationError::new("empty_sources");
        error.message = Some("Sources must not be empty when given".into());
        return Err(error);
    }
    Ok(())
}

fn validate_bytecode_or_sources(
    request: &AnalysisSubmissionRequest,
) -> Result<(), validator::ValidationError> {
    if request.bytecode.is_none() && request.sources.is_none() {
        let mut error = validator::ValidationError::new("missing_bytecode_or_sources");
        error.message = Some("Either bytecode or sources must be given".into());
        return Err(error);
    }
    Ok(())
}

/// Analysis ids are UUIDs. Anything else would be spliced into the URL path.
fn validate_analysis_uuid(uuid: &str) -> Result<(), validator::ValidationError> {
    uuid::Uuid::parse_str(uuid).map(|_| ()).map_err(|_| {
        let mut error = validator::ValidationError::new("invalid_uuid");
        error.message = Some(format!("Analysis UUID must be a valid UUID (got '{}')", uuid).into());
        error
    })
}

/// List the authenticated user's past analyses.
///
/// All three keys are required in the structured form, although both dates
/// may be `null`. Null entries are dropped from the query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisListRequest {
    #[validate(range(min = 0, message = "Offset must not be negative"))]
    pub offset: i64,

    #[serde(with = "api_timestamp_opt")]
    pub date_from: Option<DateTime<Utc>>,

    #[serde(with = "api_timestamp_opt")]
    pub date_to: Option<DateTime<Utc>>,
}

impl AnalysisListRequest {
    pub fn new(
        offset: i64,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            offset,
            date_from,
            date_to,
        }
    }
}

impl ApiRequest for AnalysisListRequest {
    fn endpoint(&self) -> String {
        "analyses".to_string()
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn parameters(&self) -> MythXResult<Map<String, Value>> {
        let mut params = into_object(self.to_structured()?);
        strip_nulls(&mut params);
        Ok(params)
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }

    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }
}

/// Submit a contract for analysis.
///
/// Absent fields are omitted from the structured form entirely. A submission
/// is only valid with a known analysis mode and with bytecode or sources.
/// Given sources and source lists must not be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_bytecode_or_sources"))]
pub struct AnalysisSubmissionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_bytecode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_source_map: Option<String>,

    /// Filename to `{source, ast, ...}` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_sources_not_empty"))]
    pub sources: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Source list must not be empty when given"))]
    pub source_list: Option<Vec<String>>,

    #[serde(rename = "version", default, skip_serializing_if = "Option::is_none")]
    pub solc_version: Option<String>,

    #[serde(default = "default_analysis_mode")]
    #[validate(custom(function = "validate_analysis_mode"))]
    pub analysis_mode: String,
}

impl Default for AnalysisSubmissionRequest {
    fn default() -> Self {
        Self {
            contract_name: None,
            bytecode: None,
            source_map: None,
            deployed_bytecode: None,
            deployed_source_map: None,
            sources: None,
            source_list: None,
            solc_version: None,
            analysis_mode: default_analysis_mode(),
        }
    }
}

impl AnalysisSubmissionRequest {
    /// Empty quick-mode submission. Set bytecode or sources before sending.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contract_name(mut self, name: impl Into<String>) -> Self {
        self.contract_name = Some(name.into());
        self
    }

    pub fn bytecode(mut self, bytecode: impl Into<String>) -> Self {
        self.bytecode = Some(bytecode.into());
        self
    }

    pub fn source_map(mut self, source_map: impl Into<String>) -> Self {
        self.source_map = Some(source_map.into());
        self
    }

    pub fn deployed_bytecode(mut self, bytecode: impl Into<String>) -> Self {
        self.deployed_bytecode = Some(bytecode.into());
        self
    }

    pub fn deployed_source_map(mut self, source_map: impl Into<String>) -> Self {
        self.deployed_source_map = Some(source_map.into());
        self
    }

    pub fn sources(mut self, sources: Map<String, Value>) -> Self {
        self.sources = (!sources.is_empty()).then_some(sources);
        self
    }

    pub fn source_list(mut self, source_list: Vec<String>) -> Self {
        self.source_list = (!source_list.is_empty()).then_some(source_list);
        self
    }

    pub fn solc_version(mut self, version: impl Into<String>) -> Self {
        self.solc_version = Some(version.into());
        self
    }

    pub fn analysis_mode(mut self, mode: impl Into<String>) -> Self {
        self.analysis_mode = mode.into();
        self
    }
}

impl ApiRequest for AnalysisSubmissionRequest {
    fn endpoint(&self) -> String {
        "analyses".to_string()
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn payload(&self) -> MythXResult<Map<String, Value>> {
        Ok(into_object(json!({ "data": self.to_structured()? })))
    }

    fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }

    fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }
}

/// Fetch the status of a single analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnalysisStatusRequest {
    #[validate(
        length(min = 1, message = "Analysis UUID is required"),
        custom(function = "validate_analysis_uuid")
    )]
    pub uuid: String,
}

impl AnalysisStatusRequest {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}

impl ApiRequest for AnalysisStatusRequest {
    fn endpoint(&self) -> String {
        format!("analyses/{}", self.uuid)
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

/// Fetch the detected issues of a finished analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DetectedIssuesRequest {
    #[validate(
        length(min = 1, message = "Analysis UUID is required"),
        custom(function = "validate_analysis_uuid")
    )]
    pub uuid: String,
}

impl DetectedIssuesRequest {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}

impl ApiRequest for DetectedIssuesRequest {
    fn endpoint(&self) -> String {
        format!("analyses/{}/issues", self.uuid)
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
