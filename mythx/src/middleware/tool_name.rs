use serde_json::Value;
use tracing::debug;

use super::{Middleware, is_analysis_submission};
use crate::api::TransportRequest;
use crate::models::response::Response;

pub const DEFAULT_TOOL_NAME: &str = "mythx-rs";

/// Tags analysis submissions with the name of the submitting tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientToolNameMiddleware {
    pub name: String,
}

impl ClientToolNameMiddleware {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ClientToolNameMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_NAME)
    }
}

impl Middleware for ClientToolNameMiddleware {
    fn process_request(&self, mut request: TransportRequest) -> TransportRequest {
        if is_analysis_submission(&request) {
            debug!("Adding client tool name {} to request", self.name);
            request
                .payload
                .insert("clientToolName".to_string(), Value::String(self.name.clone()));
        }
        request
    }

    fn process_response(&self, response: Response) -> Response {
        response
    }
}
