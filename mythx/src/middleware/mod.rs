//! Pluggable request/response transformers.
//!
//! The [`crate::api::APIHandler`] applies every registered middleware, in
//! registration order, to each outgoing [`TransportRequest`] and to each
//! parsed [`Response`]. A middleware sees the value already transformed by
//! the middlewares registered before it. It decides on its own whether a
//! request concerns it, by looking at the method and URL.

use std::fmt;

use reqwest::Method;

use crate::api::TransportRequest;
use crate::models::response::Response;

pub mod analysis_cache;
pub mod group_data;
pub mod tool_name;

pub use analysis_cache::AnalysisCacheMiddleware;
pub use group_data::GroupDataMiddleware;
pub use tool_name::ClientToolNameMiddleware;

pub trait Middleware: fmt::Debug + Send + Sync {
    fn process_request(&self, request: TransportRequest) -> TransportRequest;

    fn process_response(&self, response: Response) -> Response;
}

/// True for `POST .../analyses`, the analysis submission call.
pub(crate) fn is_analysis_submission(request: &TransportRequest) -> bool {
    request.method == Method::POST && request.url.path().ends_with("/analyses")
}
