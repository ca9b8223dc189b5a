use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::ApiResponse;
use crate::errors::{MythXError, MythXResult};
use crate::models::{from_structured_value, impl_ordered_container, to_structured_value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// Reads a severity, mapping `null` and `""` to [`Severity::None`].
fn severity_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Severity, D::Error> {
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(Severity::None),
        Some(raw) => Severity::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(raw)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    RawBytecode,
    EthereumAddress,
    SolidityContract,
    SolidityFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Text,
    SolcAstLegacyJson,
    SolcAstCompactJson,
    EvmByzantiumBytecode,
    EwasmRaw,
}

/// Where an issue was found, as a compiler source map into `source_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub source_map: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<SourceFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IssueDescription {
    head: String,
    tail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IssueWire {
    #[serde(rename = "swcID")]
    swc_id: String,
    #[serde(rename = "swcTitle")]
    swc_title: String,
    description: IssueDescription,
    #[serde(deserialize_with = "severity_or_none")]
    severity: Severity,
    locations: Vec<SourceLocation>,
    #[serde(default)]
    extra: Map<String, Value>,
}

/// A single detected weakness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(from = "IssueWire", into = "IssueWire")]
pub struct Issue {
    pub swc_id: String,
    pub swc_title: String,
    pub description_short: String,
    pub description_long: String,
    pub severity: Severity,
    pub locations: Vec<SourceLocation>,
    pub extra: Map<String, Value>,
}

impl From<IssueWire> for Issue {
    fn from(wire: IssueWire) -> Self {
        Self {
            swc_id: wire.swc_id,
            swc_title: wire.swc_title,
            description_short: wire.description.head,
            description_long: wire.description.tail,
            severity: wire.severity,
            locations: wire.locations,
            extra: wire.extra,
        }
    }
}

impl From<Issue> for IssueWire {
    fn from(issue: Issue) -> Self {
        Self {
            swc_id: issue.swc_id,
            swc_title: issue.swc_title,
            description: IssueDescription {
                head: issue.description_short,
                tail: issue.description_long,
            },
            severity: issue.severity,
            locations: issue.locations,
            extra: issue.extra,
        }
    }
}

/// The issues found in one analyzed source, plus that source's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub issues: Vec<Issue>,
    pub source_type: SourceType,
    pub source_format: SourceFormat,
    pub source_list: Vec<String>,
    #[serde(rename = "meta", default)]
    pub meta_data: Map<String, Value>,
}

impl_ordered_container!(IssueReport, issues, Issue);

impl IssueReport {
    pub fn remove(&mut self, index: usize) -> Option<Issue> {
        (index < self.issues.len()).then(|| self.issues.remove(index))
    }

    pub fn contains(&self, issue: &Issue) -> bool {
        self.issues.contains(issue)
    }

    pub fn contains_swc_id(&self, swc_id: &str) -> bool {
        self.issues.iter().any(|i| i.swc_id == swc_id)
    }
}

/// The full report of an analysis: one [`IssueReport`] per analyzed source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedIssuesResponse {
    pub issue_reports: Vec<IssueReport>,
}

impl_ordered_container!(DetectedIssuesResponse, issue_reports, IssueReport);

impl DetectedIssuesResponse {
    pub fn new(issue_reports: Vec<IssueReport>) -> Self {
        Self { issue_reports }
    }

    pub fn remove(&mut self, index: usize) -> Option<IssueReport> {
        (index < self.issue_reports.len()).then(|| self.issue_reports.remove(index))
    }

    /// All issues across every report, in report order.
    pub fn issues(&self) -> impl DoubleEndedIterator<Item = &Issue> {
        self.issue_reports.iter().flat_map(|report| report.issues.iter())
    }

    pub fn issue_count(&self) -> usize {
        self.issue_reports.iter().map(IssueReport::len).sum()
    }

    pub fn contains_issue(&self, issue: &Issue) -> bool {
        self.issue_reports.iter().any(|report| report.contains(issue))
    }

    pub fn contains_swc_id(&self, swc_id: &str) -> bool {
        self.issue_reports
            .iter()
            .any(|report| report.contains_swc_id(swc_id))
    }
}

impl ApiResponse for DetectedIssuesResponse {
    fn from_structured(value: &Value) -> MythXResult<Self> {
        let reports = match value {
            Value::Array(reports) => reports,
            Value::Object(map) => map
                .get("issueReports")
                .and_then(Value::as_array)
                .ok_or_else(|| MythXError::validation("issueReports: expected a list"))?,
            other => {
                return Err(MythXError::decode(format!(
                    "Expected a list or an object but got {}",
                    other
                )));
            }
        };

        let issue_reports = reports
            .iter()
            .map(from_structured_value::<IssueReport>)
            .collect::<MythXResult<Vec<_>>>()?;
        Ok(Self { issue_reports })
    }

    fn to_structured(&self) -> MythXResult<Value> {
        self.issue_reports
            .iter()
            .map(to_structured_value)
            .collect::<MythXResult<Vec<_>>>()
            .map(Value::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue_json(swc_id: &str, severity: Value) -> Value {
        json!({
            "swcID": swc_id,
            "swcTitle": "Reentrancy",
            "description": {
                "head": "A call to a user-supplied address is executed.",
                "tail": "The callee may re-enter the contract.",
            },
            "severity": severity,
            "locations": [{
                "sourceMap": "444:1:0",
                "sourceType": "raw-bytecode",
                "sourceFormat": "evm-byzantium-bytecode",
                "sourceList": ["0x5d42db2b7bd1e3d34b25fcdd6bf3b6bd8c7fab39e4f7e0e6a1a4e4dd7d5c5d3e"],
            }],
            "extra": {"testCase": "0x1234"},
        })
    }

    fn report_json() -> Value {
        json!([{
            "issues": [
                issue_json("SWC-107", json!("High")),
                issue_json("SWC-103", json!("Low")),
            ],
            "sourceType": "raw-bytecode",
            "sourceFormat": "evm-byzantium-bytecode",
            "sourceList": ["0x5d42db2b7bd1e3d34b25fcdd6bf3b6bd8c7fab39e4f7e0e6a1a4e4dd7d5c5d3e"],
            "meta": {"coveredPaths": 3},
        }])
    }

    #[test]
    fn test_issue_fields() {
        let issue: Issue = serde_json::from_value(issue_json("SWC-107", json!("Medium"))).unwrap();
        assert_eq!(issue.swc_id, "SWC-107");
        assert_eq!(issue.description_short, "A call to a user-supplied address is executed.");
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.locations[0].source_type, Some(SourceType::RawBytecode));
        assert_eq!(
            issue.locations[0].source_format,
            Some(SourceFormat::EvmByzantiumBytecode)
        );
        assert_eq!(issue.extra["testCase"], "0x1234");
    }

    #[test]
    fn test_issue_severity_null_or_empty_is_none() {
        let issue: Issue = serde_json::from_value(issue_json("SWC-107", Value::Null)).unwrap();
        assert_eq!(issue.severity, Severity::None);
        let issue: Issue = serde_json::from_value(issue_json("SWC-107", json!(""))).unwrap();
        assert_eq!(issue.severity, Severity::None);
        assert!(serde_json::from_value::<Issue>(issue_json("SWC-107", json!("Critical"))).is_err());
    }

    #[test]
    fn test_detected_issues_round_trip() {
        let response = DetectedIssuesResponse::from_structured(&report_json()).unwrap();
        assert_eq!(response.len(), 1);
        assert_eq!(response[0].len(), 2);
        assert_eq!(response[0].source_type, SourceType::RawBytecode);
        assert_eq!(response[0].meta_data["coveredPaths"], 3);
        assert_eq!(response.to_structured().unwrap(), report_json());
    }

    #[test]
    fn test_detected_issues_accepts_object_form() {
        let wrapped = json!({ "issueReports": report_json() });
        let response = DetectedIssuesResponse::from_structured(&wrapped).unwrap();
        assert_eq!(response.issue_count(), 2);
        assert!(DetectedIssuesResponse::from_structured(&json!({"reports": []})).is_err());
        assert!(DetectedIssuesResponse::from_json("\"text\"").is_err());
    }

    #[test]
    fn test_detected_issues_rejects_bad_source_type() {
        let mut bad = report_json();
        bad[0]["sourceType"] = json!("vyper-file");
        let err = DetectedIssuesResponse::from_structured(&bad).unwrap_err();
        assert!(matches!(err, MythXError::Validation { .. }));
    }

    #[test]
    fn test_detected_issues_membership() {
        let mut response = DetectedIssuesResponse::from_structured(&report_json()).unwrap();
        let first = response[0][0].clone();
        assert!(response.contains_swc_id("SWC-107"));
        assert!(response.contains_issue(&first));

        let swc_ids: Vec<_> = response.issues().rev().map(|i| i.swc_id.as_str()).collect();
        assert_eq!(swc_ids, vec!["SWC-103", "SWC-107"]);

        let removed = response[0].remove(0).unwrap();
        assert_eq!(removed, first);
        assert_eq!(response[0].len(), 1);
        assert!(!response.contains_swc_id("SWC-107"));
        assert!(!response.contains_issue(&first));
        assert!(response.contains_swc_id("SWC-103"));
    }

    #[test]
    fn test_report_container_ops() {
        let mut response = DetectedIssuesResponse::from_structured(&report_json()).unwrap();
        let report = &mut response[0];
        let replacement = report[1].clone();
        let previous = report.set(0, replacement.clone()).unwrap();
        assert_eq!(previous.swc_id, "SWC-107");
        assert!(report.iter().all(|i| i.swc_id == "SWC-103"));

        let removed = response.remove(0).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(response.is_empty());
        assert!(response.remove(0).is_none());
    }
}
