use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use super::ApiResponse;
use crate::errors::{MythXError, MythXResult};
use crate::models::{from_structured_value, impl_ordered_container, to_structured_value};
use crate::utils::api_timestamp;

/// Lifecycle state of an analysis job.
///
/// The service reports in-progress jobs as either `Running` or
/// `In Progress`; both parse to [`AnalysisStatus::InProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnalysisStatus {
    Queued,
    InProgress,
    Finished,
    Error,
}

impl AnalysisStatus {
    /// Whether the job reached a terminal state.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "running" | "in progress" => Ok(Self::InProgress),
            "finished" => Ok(Self::Finished),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown analysis status: {}", s)),
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "Queued"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Finished => write!(f, "Finished"),
            Self::Error => write!(f, "Error"),
        }
    }
}

impl TryFrom<String> for AnalysisStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<AnalysisStatus> for String {
    fn from(status: AnalysisStatus) -> Self {
        status.to_string()
    }
}

/// A single analysis job as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[validate(length(min = 1, message = "Analysis UUID is required"))]
    pub uuid: String,

    pub api_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mythril_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maestro_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvey_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maru_version: Option<String>,

    pub queue_time: u64,

    #[serde(default)]
    pub run_time: u64,

    pub status: AnalysisStatus,

    #[serde(with = "api_timestamp")]
    pub submitted_at: DateTime<Utc>,

    pub submitted_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Analysis {
    pub fn from_structured(value: &Value) -> MythXResult<Self> {
        from_structured_value(value)
    }

    pub fn to_structured(&self) -> MythXResult<Value> {
        to_structured_value(self)
    }
}

/// Response to an analysis submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSubmissionResponse {
    pub analysis: Analysis,
}

impl ApiResponse for AnalysisSubmissionResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        Ok(Self {
            analysis: Analysis::from_structured(value)?,
        })
    }

    fn to_structured(&self) -> MythXResult<Value> {
        self.analysis.to_structured()
    }
}

/// Response to an analysis status query.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisStatusResponse {
    pub analysis: Analysis,
}

impl AnalysisStatusResponse {
    pub fn status(&self) -> AnalysisStatus {
        self.analysis.status
    }
}

impl ApiResponse for AnalysisStatusResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        Ok(Self {
            analysis: Analysis::from_structured(value)?,
        })
    }

    fn to_structured(&self) -> MythXResult<Value> {
        self.analysis.to_structured()
    }
}

/// A page of the user's past analyses.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct AnalysisListResponse {
    pub analyses: Vec<Analysis>,

    #[validate(range(min = 0, message = "Total must not be negative"))]
    pub total: i64,
}

impl_ordered_container!(AnalysisListResponse, analyses, Analysis);

impl AnalysisListResponse {
    pub fn new(analyses: Vec<Analysis>, total: i64) -> Self {
        Self { analyses, total }
    }

    /// Removes the analysis at `index` and decrements `total`.
    pub fn remove(&mut self, index: usize) -> Option<Analysis> {
        if index >= self.analyses.len() {
            return None;
        }
        self.total = (self.total - 1).max(0);
        Some(self.analyses.remove(index))
    }

    pub fn contains(&self, analysis: &Analysis) -> bool {
        self.analyses.contains(analysis)
    }

    pub fn contains_uuid(&self, uuid: &str) -> bool {
        self.analyses.iter().any(|a| a.uuid == uuid)
    }
}

impl ApiResponse for AnalysisListResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        let (items, total) = match value {
            Value::Array(items) => (items, items.len() as i64),
            Value::Object(map) => {
                let items = map
                    .get("analyses")
                    .and_then(Value::as_array)
                    .ok_or_else(|| MythXError::validation("analyses: expected a list"))?;
                let total = map
                    .get("total")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| MythXError::validation("total: expected an integer"))?;
                (items, total)
            }
            other => {
                return Err(MythXError::decode(format!(
                    "Expected a list or an object but got {}",
                    other
                )));
            }
        };

        let analyses = items
            .iter()
            .map(Analysis::from_structured)
            .collect::<MythXResult<Vec<_>>>()?;
        let response = Self { analyses, total };
        response.validate()?;
        Ok(response)
    }

    fn to_structured(&self) -> MythXResult<Value> {
        self.validate()?;
        let analyses = self
            .analyses
            .iter()
            .map(Analysis::to_structured)
            .collect::<MythXResult<Vec<_>>>()?;
        Ok(json!({ "analyses": analyses, "total": self.total }))
    }
}
