//! Sign-in and sign-up against the auth endpoints.
//!
//! Login exchanges email and password for a bearer token; the flow
//! stores the token, resolves it into a session, and navigates to the
//! landing path of the role the backend reported. Failures reuse the
//! session error taxonomy: bad credentials are `Rejected`, a dead
//! backend is `Transient`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::provider::SessionProvider;
use crate::role::Role;
use crate::routes::{Navigator, route_for};
use crate::store::Credential;

/// Login request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
}

/// Successful auth response: a freshly-issued bearer token plus the
/// account it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// The auth endpoints, as a seam for tests.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, SessionError>;

    /// Creates a new client account.
    async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse, SessionError>;
}

/// Auth client backed by the real backend.
pub struct HttpAuthClient {
    http: reqwest::Client,
    login_url: String,
    signup_url: String,
}

impl HttpAuthClient {
    /// Builds a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &SessionConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.resolve_timeout())
            .build()?;

        Ok(Self {
            http,
            login_url: config.login_url(),
            signup_url: config.signup_url(),
        })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<AuthResponse, SessionError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| SessionError::Transient {
                reason: err.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() {
            // Bad credentials, validation failures, duplicate emails:
            // all need a user action, not a retry.
            return Err(SessionError::Rejected);
        }
        if !status.is_success() {
            return Err(SessionError::Transient {
                reason: format!("auth endpoint returned {status}"),
            });
        }

        let text = response.text().await.map_err(|err| SessionError::Transient {
            reason: err.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|err| SessionError::MalformedProfile {
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl Authenticator for HttpAuthClient {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, SessionError> {
        self.post(&self.login_url, &request).await
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse, SessionError> {
        self.post(&self.signup_url, &request).await
    }
}

/// Orchestrates sign-in and sign-up end to end: token exchange, session
/// establishment, and the success redirect.
pub struct SignInFlow {
    auth: Arc<dyn Authenticator>,
    provider: SessionProvider,
    navigator: Arc<dyn Navigator>,
}

impl SignInFlow {
    /// Creates a flow over the given auth backend and provider.
    #[must_use]
    pub fn new(
        auth: Arc<dyn Authenticator>,
        provider: SessionProvider,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            auth,
            provider,
            navigator,
        }
    }

    /// Signs in and, on success, navigates to the role's landing path.
    ///
    /// # Errors
    ///
    /// `Rejected` for bad credentials, `Transient` for backend trouble,
    /// `MalformedProfile` if the response carries an unknown role. On
    /// error nothing is stored and no navigation happens.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Role, SessionError> {
        let response = self
            .auth
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.establish(response).await
    }

    /// Creates an account and signs it in. New accounts are always
    /// clients, so the redirect lands on the client dashboard.
    ///
    /// # Errors
    ///
    /// Same classification as [`SignInFlow::sign_in`].
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Role, SessionError> {
        let response = self.auth.sign_up(request).await?;
        self.establish(response).await
    }

    async fn establish(&self, response: AuthResponse) -> Result<Role, SessionError> {
        let role =
            Role::from_str(&response.role).map_err(|err| SessionError::MalformedProfile {
                reason: err.to_string(),
            })?;
        self.provider.establish(Credential::new(response.token)).await;
        self.navigator.navigate(route_for(role));
        Ok(role)
    }
}
