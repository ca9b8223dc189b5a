use serde_json::Value;
use tracing::debug;

use super::Middleware;
use crate::api::TransportRequest;
use crate::models::response::Response;

/// Sets the `noCacheLookup` flag on every outgoing payload.
///
/// With `no_cache` set, the service re-runs analyses instead of returning
/// cached results for previously seen inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisCacheMiddleware {
    pub no_cache: bool,
}

impl AnalysisCacheMiddleware {
    pub fn new(no_cache: bool) -> Self {
        Self { no_cache }
    }
}

impl Middleware for AnalysisCacheMiddleware {
    fn process_request(&self, mut request: TransportRequest) -> TransportRequest {
        debug!("Setting noCacheLookup to {}", self.no_cache);
        request
            .payload
            .insert("noCacheLookup".to_string(), Value::Bool(self.no_cache));
        request
    }

    fn process_response(&self, response: Response) -> Response {
        response
    }
}
