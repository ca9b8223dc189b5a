//! Response models.
//!
//! Responses are parsed from raw body text, validated, and then passed
//! through the middleware chain as a [`Response`] before being handed back
//! to the caller as their concrete type.

use serde_json::Value;

use crate::errors::{MythXError, MythXResult};
use crate::models::parse_json;

pub mod analysis;
pub mod auth;
pub mod issue;
pub mod meta;

pub use analysis::{
    Analysis, AnalysisListResponse, AnalysisStatus, AnalysisStatusResponse,
    AnalysisSubmissionResponse,
};
pub use auth::{AuthLoginResponse, AuthLogoutResponse, AuthRefreshResponse};
pub use issue::{
    DetectedIssuesResponse, Issue, IssueReport, Severity, SourceFormat, SourceLocation,
    SourceType,
};
pub use meta::{OASResponse, VersionResponse};

/// Common behaviour of every response model.
pub trait ApiResponse: Sized + Into<Response> + TryFrom<Response, Error = MythXError> {
    /// Builds and validates a response from its structured form.
    fn from_structured(value: &Value) -> MythXResult<Self>;

    /// Validated structured form.
    fn to_structured(&self) -> MythXResult<Value>;

    fn from_json(raw: &str) -> MythXResult<Self> {
        Self::from_structured(&parse_json(raw)?)
    }

    fn to_json(&self) -> MythXResult<String> {
        Ok(self.to_structured()?.to_string())
    }
}

/// Any parsed response, as seen by the middleware chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    AuthLogin(AuthLoginResponse),
    AuthLogout(AuthLogoutResponse),
    AuthRefresh(AuthRefreshResponse),
    AnalysisSubmission(AnalysisSubmissionResponse),
    AnalysisStatus(AnalysisStatusResponse),
    AnalysisList(AnalysisListResponse),
    DetectedIssues(DetectedIssuesResponse),
    OpenApi(OASResponse),
    Version(VersionResponse),
}

impl Response {
    /// Name of the wrapped response type, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthLogin(_) => "AuthLogin",
            Self::AuthLogout(_) => "AuthLogout",
            Self::AuthRefresh(_) => "AuthRefresh",
            Self::AnalysisSubmission(_) => "AnalysisSubmission",
            Self::AnalysisStatus(_) => "AnalysisStatus",
            Self::AnalysisList(_) => "AnalysisList",
            Self::DetectedIssues(_) => "DetectedIssues",
            Self::OpenApi(_) => "OpenApi",
            Self::Version(_) => "Version",
        }
    }

    /// Structured form of the wrapped response.
    pub fn to_structured(&self) -> MythXResult<Value> {
        match self {
            Self::AuthLogin(r) => r.to_structured(),
            Self::AuthLogout(r) => r.to_structured(),
            Self::AuthRefresh(r) => r.to_structured(),
            Self::AnalysisSubmission(r) => r.to_structured(),
            Self::AnalysisStatus(r) => r.to_structured(),
            Self::AnalysisList(r) => r.to_structured(),
            Self::DetectedIssues(r) => r.to_structured(),
            Self::OpenApi(r) => r.to_structured(),
            Self::Version(r) => r.to_structured(),
        }
    }
}

/// Wires a response model into the [`Response`] union.
macro_rules! impl_response_variant {
    ($($model:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$model> for Response {
                fn from(response: $model) -> Self {
                    Response::$variant(response)
                }
            }

            impl TryFrom<Response> for $model {
                type Error = MythXError;

                fn try_from(response: Response) -> Result<Self, Self::Error> {
                    match response {
                        Response::$variant(inner) => Ok(inner),
                        other => Err(MythXError::decode(format!(
                            "Expected a {} response but got {}",
                            stringify!($variant),
                            other.kind()
                        ))),
                    }
                }
            }
        )*
    };
}

impl_response_variant!(
    AuthLoginResponse => AuthLogin,
    AuthLogoutResponse => AuthLogout,
    AuthRefreshResponse => AuthRefresh,
    AnalysisSubmissionResponse => AnalysisSubmission,
    AnalysisStatusResponse => AnalysisStatus,
    AnalysisListResponse => AnalysisList,
    DetectedIssuesResponse => DetectedIssues,
    OASResponse => OpenApi,
    VersionResponse => Version,
);
