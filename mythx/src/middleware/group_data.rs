use serde_json::Value;
use tracing::debug;

use super::{Middleware, is_analysis_submission};
use crate::api::TransportRequest;
use crate::models::response::Response;

/// Attaches an organisation group to analysis submissions.
///
/// Only the configured fields are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDataMiddleware {
    pub group_id: Option<String>,
    pub group_name: Option<String>,
}

impl GroupDataMiddleware {
    pub fn new(group_id: Option<String>, group_name: Option<String>) -> Self {
        Self {
            group_id,
            group_name,
        }
    }
}

impl Middleware for GroupDataMiddleware {
    fn process_request(&self, mut request: TransportRequest) -> TransportRequest {
        if !is_analysis_submission(&request) {
            return request;
        }
        if let Some(group_id) = &self.group_id {
            debug!("Adding group ID {} to request", group_id);
            request
                .payload
                .insert("groupId".to_string(), Value::String(group_id.clone()));
        }
        if let Some(group_name) = &self.group_name {
            debug!("Adding group name {} to request", group_name);
            request
                .payload
                .insert("groupName".to_string(), Value::String(group_name.clone()));
        }
        request
    }

    fn process_response(&self, response: Response) -> Response {
        response
    }
}
