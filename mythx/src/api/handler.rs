//! Request assembly, dispatch and response parsing.
//!
//! [`APIHandler`] knows nothing about individual endpoints. It turns any
//! [`ApiRequest`] into a [`TransportRequest`], runs the middleware chain over
//! it, sends it through a [`Transport`], and parses the body into the
//! expected [`ApiResponse`] before running the chain again over the result.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::errors::{MythXError, MythXResult};
use crate::middleware::Middleware;
use crate::models::request::ApiRequest;
use crate::models::response::{ApiResponse, Response};
use crate::utils::query_value;

pub const PRODUCTION_URL: &str = "https://api.mythx.io/v1/";
pub const STAGING_URL: &str = "https://staging.api.mythx.io/v1/";

/// Which MythX deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

impl Environment {
    pub fn from_staging(staging: bool) -> Self {
        if staging {
            Self::Staging
        } else {
            Self::Production
        }
    }

    pub fn base_url(&self) -> MythXResult<Url> {
        let raw = match self {
            Self::Production => PRODUCTION_URL,
            Self::Staging => STAGING_URL,
        };
        Ok(Url::parse(raw)?)
    }
}

impl FromStr for Environment {
    type Err = MythXError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            _ => Err(MythXError::validation(format!("Unknown environment: {}", s))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Staging => write!(f, "staging"),
        }
    }
}

/// A fully assembled HTTP call, as seen and rewritten by middlewares.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HashMap<String, String>,
    pub payload: Map<String, Value>,
    pub params: Map<String, Value>,
}

/// Status code and body text of an HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Performs a single HTTP round trip.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    async fn execute(&self, request: &TransportRequest) -> MythXResult<TransportResponse>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &TransportRequest) -> MythXResult<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if !request.params.is_empty() {
            let query: Vec<(&str, String)> = request
                .params
                .iter()
                .map(|(key, value)| (key.as_str(), query_value(value)))
                .collect();
            builder = builder.query(&query);
        }

        if request.method != Method::GET {
            builder = builder.json(&request.payload);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

/// Turns request models into HTTP calls and HTTP bodies into response models.
#[derive(Debug)]
pub struct APIHandler {
    base_url: Url,
    middlewares: Vec<Box<dyn Middleware>>,
    transport: Arc<dyn Transport>,
}

impl APIHandler {
    /// Handler for one of the public deployments, without middlewares.
    pub fn new(environment: Environment) -> MythXResult<Self> {
        Ok(Self::with_base_url(environment.base_url()?))
    }

    /// Handler for an arbitrary API root such as a self-hosted deployment.
    ///
    /// Endpoint paths are joined onto `base_url`, so a trailing slash is
    /// added when missing.
    pub fn with_base_url(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            middlewares: Vec::new(),
            transport: Arc::new(HttpTransport::default()),
        }
    }

    pub fn with_middlewares(mut self, middlewares: Vec<Box<dyn Middleware>>) -> Self {
        self.middlewares = middlewares;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Appends a middleware to the end of the chain.
    pub fn add_middleware(&mut self, middleware: Box<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn middlewares(&self) -> &[Box<dyn Middleware>] {
        &self.middlewares
    }

    /// Validates `request`, builds its transport request and runs the
    /// middleware chain over it.
    pub fn assemble_request<R: ApiRequest>(&self, request: &R) -> MythXResult<TransportRequest> {
        // The endpoint may embed request fields, so it is only built from a
        // valid request.
        request.to_structured()?;
        let url = self.base_url.join(&request.endpoint())?;
        let assembled = TransportRequest {
            method: request.method(),
            url,
            headers: request.headers(),
            payload: request.payload()?,
            params: request.parameters()?,
        };

        tracing::debug!(
            "Assembled {} request to {}",
            assembled.method,
            assembled.url
        );

        Ok(self
            .middlewares
            .iter()
            .fold(assembled, |req, middleware| {
                tracing::debug!("Applying request middleware {:?}", middleware);
                middleware.process_request(req)
            }))
    }

    /// Sends `request` with `auth_header` merged into its headers and returns
    /// the body text. Any status other than 200 is an [`MythXError::Api`].
    pub async fn send_request(
        &self,
        request: &TransportRequest,
        auth_header: Option<&HashMap<String, String>>,
    ) -> MythXResult<String> {
        let mut merged = request.clone();
        if let Some(auth_header) = auth_header {
            merged.headers.extend(auth_header.clone());
        }

        tracing::debug!("Sending {} request to {}", merged.method, merged.url);
        let response = self.transport.execute(&merged).await?;

        if response.status != StatusCode::OK.as_u16() {
            tracing::debug!(
                "Request to {} failed with status {}",
                merged.url,
                response.status
            );
            return Err(MythXError::api(response.status, response.body));
        }

        Ok(response.body)
    }

    /// Parses `raw` into `T` and runs the middleware chain over the result.
    pub fn parse_response<T: ApiResponse>(&self, raw: &str) -> MythXResult<T> {
        let parsed: Response = T::from_json(raw)?.into();
        let processed = self
            .middlewares
            .iter()
            .fold(parsed, |resp, middleware| {
                tracing::debug!("Applying response middleware {:?}", middleware);
                middleware.process_response(resp)
            });
        T::try_from(processed)
    }

    /// Assembles, sends and parses in one go.
    pub async fn execute<R, T>(
        &self,
        request: &R,
        auth_header: Option<&HashMap<String, String>>,
    ) -> MythXResult<T>
    where
        R: ApiRequest + Sync,
        T: ApiResponse,
    {
        let assembled = self.assemble_request(request)?;
        let body = self.send_request(&assembled, auth_header).await?;
        self.parse_response(&body)
    }
}
