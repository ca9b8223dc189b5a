//! Authenticated MythX client.
//!
//! [`Client`] owns the user's credentials and token pair and checks the
//! token state lazily before every authenticated call:
//!
//! | State | Action before the call |
//! |---|---|
//! | [`AuthState::Unauthenticated`] | log in |
//! | [`AuthState::Authenticated`] | none |
//! | [`AuthState::AccessExpired`] | refresh the token pair |
//! | [`AuthState::FullyExpired`] | log in |
//!
//! All operations take `&mut self`, so a client can only ever run one call
//! at a time. Share a client between tasks behind a mutex or use one client
//! per task.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::handler::{APIHandler, Environment};
use crate::errors::{MythXError, MythXResult};
use crate::models::request::{
    AnalysisListRequest, AnalysisStatusRequest, AnalysisSubmissionRequest, ApiRequest,
    AuthLoginRequest, AuthLogoutRequest, AuthRefreshRequest, DetectedIssuesRequest, OASRequest,
    OpenApiMode, VersionRequest,
};
use crate::models::response::{
    AnalysisListResponse, AnalysisStatusResponse, AnalysisSubmissionResponse, ApiResponse,
    AuthLoginResponse, AuthLogoutResponse, AuthRefreshResponse, DetectedIssuesResponse,
    OASResponse, VersionResponse,
};
use crate::utils::jwt;

/// What the client currently holds, evaluated against the token expiry claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No tokens at all.
    Unauthenticated,
    /// The access token is still valid.
    Authenticated,
    /// The access token expired but the refresh token is still valid.
    AccessExpired,
    /// Both tokens expired.
    FullyExpired,
}

/// Login credentials and/or a previously issued token pair.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub eth_address: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn password(eth_address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            eth_address: Some(eth_address.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            ..Default::default()
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("eth_address", &self.eth_address)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reads whether `token` expired at `now`. Missing or unreadable tokens
/// count as expired.
fn token_expired(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return true;
    };
    match jwt::decode_claims(token).and_then(|claims| claims.is_expired_at(now)) {
        Ok(expired) => expired,
        Err(e) => {
            tracing::warn!("Treating token as expired, could not read its expiry: {}", e);
            true
        }
    }
}

#[derive(Debug)]
pub struct Client {
    handler: APIHandler,
    credentials: Credentials,
}

impl Client {
    pub fn new(handler: APIHandler, credentials: Credentials) -> Self {
        Self {
            handler,
            credentials,
        }
    }

    /// Client for a public deployment with no middlewares.
    pub fn for_environment(
        environment: Environment,
        credentials: Credentials,
    ) -> MythXResult<Self> {
        Ok(Self::new(APIHandler::new(environment)?, credentials))
    }

    pub fn handler(&self) -> &APIHandler {
        &self.handler
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn eth_address(&self) -> Option<&str> {
        self.credentials.eth_address.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credentials.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.credentials.refresh_token.as_deref()
    }

    /// Current authentication state. Performs no network call.
    pub fn auth_state(&self) -> AuthState {
        self.auth_state_at(Utc::now())
    }

    pub fn auth_state_at(&self, now: DateTime<Utc>) -> AuthState {
        let access = self.access_token();
        let refresh = self.refresh_token();

        if access.is_none() && refresh.is_none() {
            AuthState::Unauthenticated
        } else if !token_expired(access, now) {
            AuthState::Authenticated
        } else if !token_expired(refresh, now) {
            AuthState::AccessExpired
        } else {
            AuthState::FullyExpired
        }
    }

    /// Brings the token pair into a usable state, logging in or refreshing
    /// as needed.
    pub async fn assert_authentication(&mut self) -> MythXResult<()> {
        match self.auth_state() {
            AuthState::Authenticated => Ok(()),
            AuthState::AccessExpired => {
                tracing::debug!("Access token expired, refreshing");
                self.refresh().await.map(|_| ())
            }
            state => {
                tracing::debug!("Logging in from state {:?}", state);
                self.login().await.map(|_| ())
            }
        }
    }

    fn auth_header(&self) -> MythXResult<HashMap<String, String>> {
        let access_token = self
            .access_token()
            .ok_or_else(|| MythXError::authentication("No access token available"))?;
        Ok(HashMap::from([(
            "Authorization".to_string(),
            format!("Bearer {}", access_token),
        )]))
    }

    /// Runs a call that must carry a valid access token.
    async fn authenticated<R, T>(&mut self, request: &R) -> MythXResult<T>
    where
        R: ApiRequest + Sync,
        T: ApiResponse,
    {
        self.assert_authentication().await?;
        let auth_header = self.auth_header()?;
        self.handler.execute(request, Some(&auth_header)).await
    }

    /// Logs in with the configured address and password, replacing both tokens.
    pub async fn login(&mut self) -> MythXResult<AuthLoginResponse> {
        let (Some(eth_address), Some(password)) = (
            self.credentials.eth_address.as_deref(),
            self.credentials.password.as_deref(),
        ) else {
            return Err(MythXError::authentication(
                "Login requires an Ethereum address and a password",
            ));
        };

        let request = AuthLoginRequest::new(eth_address, password);
        let response: AuthLoginResponse = self.handler.execute(&request, None).await?;
        tracing::debug!("Logged in as {}", request.eth_address);

        self.credentials.access_token = Some(response.access_token.clone());
        self.credentials.refresh_token = Some(response.refresh_token.clone());
        Ok(response)
    }

    /// Invalidates the session. Both tokens are cleared even if the call fails.
    pub async fn logout(&mut self) -> MythXResult<AuthLogoutResponse> {
        let result = self.authenticated(&AuthLogoutRequest::default()).await;
        self.credentials.access_token = None;
        self.credentials.refresh_token = None;
        tracing::debug!("Cleared token pair");
        result
    }

    /// Exchanges the refresh token for a new token pair without any prior
    /// authentication check.
    pub async fn refresh(&mut self) -> MythXResult<AuthRefreshResponse> {
        let refresh_token = self
            .refresh_token()
            .ok_or_else(|| MythXError::authentication("No refresh token available"))?;
        let request = AuthRefreshRequest::new(self.access_token().unwrap_or_default(), refresh_token);

        let response: AuthRefreshResponse = self.handler.execute(&request, None).await?;
        tracing::debug!("Refreshed token pair");

        self.credentials.access_token = Some(response.access_token.clone());
        self.credentials.refresh_token = Some(response.refresh_token.clone());
        Ok(response)
    }

    pub async fn analysis_list(
        &mut self,
        offset: i64,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> MythXResult<AnalysisListResponse> {
        self.authenticated(&AnalysisListRequest::new(offset, date_from, date_to))
            .await
    }

    /// Submits a contract for analysis.
    pub async fn analyze(
        &mut self,
        request: &AnalysisSubmissionRequest,
    ) -> MythXResult<AnalysisSubmissionResponse> {
        self.authenticated(request).await
    }

    pub async fn status(&mut self, uuid: &str) -> MythXResult<AnalysisStatusResponse> {
        self.authenticated(&AnalysisStatusRequest::new(uuid)).await
    }

    /// Whether the analysis reached a terminal state, finished or failed.
    pub async fn analysis_ready(&mut self, uuid: &str) -> MythXResult<bool> {
        Ok(self.status(uuid).await?.status().is_done())
    }

    pub async fn report(&mut self, uuid: &str) -> MythXResult<DetectedIssuesResponse> {
        self.authenticated(&DetectedIssuesRequest::new(uuid)).await
    }

    pub async fn openapi(&self, mode: OpenApiMode) -> MythXResult<OASResponse> {
        self.handler
            .execute(&OASRequest::with_mode(mode), None)
            .await
    }

    pub async fn version(&self) -> MythXResult<VersionResponse> {
        self.handler.execute(&VersionRequest, None).await
    }

    /// Runs `body` inside an authenticated session that always ends with a
    /// logout.
    ///
    /// If `body` fails, its error is returned and a failing logout is only
    /// logged. If `body` succeeds, a failing logout is returned.
    ///
    /// ```no_run
    /// # async fn run(client: &mut mythx::Client) -> mythx::MythXResult<()> {
    /// use futures::FutureExt;
    ///
    /// let ready = client
    ///     .session(|c| async move { c.analysis_ready("some-uuid").await }.boxed())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn session<T, F>(&mut self, body: F) -> MythXResult<T>
    where
        F: for<'c> FnOnce(&'c mut Client) -> BoxFuture<'c, MythXResult<T>>,
    {
        self.assert_authentication().await?;

        let outcome = body(self).await;
        let logout = self.logout().await;

        match (outcome, logout) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(logout_error)) => {
                tracing::warn!("Logout after failed session also failed: {}", logout_error);
                Err(e)
            }
        }
    }
}
