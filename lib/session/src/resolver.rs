//! Session resolution against the identity endpoint.
//!
//! Given the stored credential, the resolver asks the backend who the
//! current user is and maps the wire payload into the internal
//! [`User`] model. Every failure is classified into the
//! [`SessionError`] taxonomy; a rejected or contract-violating
//! credential is removed from the store before the error is returned,
//! so it is never retried on a timer.

use std::str::FromStr;
use std::sync::Arc;

use astroneko_core::UserId;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::role::Role;
use crate::store::{Credential, CredentialStore};
use crate::user::User;

/// Resolves a credential into a verified user.
///
/// The session provider only depends on this trait, so tests can script
/// resolutions without a network.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolves the current user for the given credential.
    ///
    /// An absent credential short-circuits to
    /// [`SessionError::NoCredential`] without any network call.
    async fn resolve(&self, credential: Option<Credential>) -> Result<User, SessionError>;
}

/// Wire shape of the identity endpoint's success payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDto {
    id: i64,
    name: String,
    email: String,
    role: String,
    #[serde(default)]
    points: Option<u32>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    avatar: Option<String>,
}

/// Maps the wire payload into the internal user model.
///
/// The role string is matched case-insensitively against the closed
/// enumeration; anything else is a malformed profile. Loyalty points
/// only exist for clients and default to zero when the wire omits them.
fn map_profile(profile: ProfileDto) -> Result<User, SessionError> {
    let role = Role::from_str(&profile.role).map_err(|err| SessionError::MalformedProfile {
        reason: err.to_string(),
    })?;

    Ok(User {
        id: UserId::new(profile.id),
        name: profile.name,
        email: profile.email,
        role,
        loyalty_points: (role == Role::Client).then(|| profile.points.unwrap_or(0)),
        is_active: profile.is_active.unwrap_or(true),
        avatar: profile.avatar,
    })
}

/// Resolver backed by the real identity endpoint.
pub struct HttpSessionResolver {
    http: reqwest::Client,
    profile_url: String,
    store: Arc<dyn CredentialStore>,
}

impl HttpSessionResolver {
    /// Builds a resolver with the configured endpoint and fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: &SessionConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.resolve_timeout())
            .build()?;

        Ok(Self {
            http,
            profile_url: config.profile_url(),
            store,
        })
    }
}

#[async_trait]
impl SessionResolver for HttpSessionResolver {
    async fn resolve(&self, credential: Option<Credential>) -> Result<User, SessionError> {
        let Some(credential) = credential else {
            return Err(SessionError::NoCredential);
        };

        let response = self
            .http
            .get(&self.profile_url)
            .bearer_auth(credential.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| SessionError::Transient {
                reason: err.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            // A rejected credential must never be retried silently.
            self.store.remove();
            return Err(SessionError::Rejected);
        }
        if !status.is_success() {
            return Err(SessionError::Transient {
                reason: format!("identity endpoint returned {status}"),
            });
        }

        let body = response.text().await.map_err(|err| SessionError::Transient {
            reason: err.to_string(),
        })?;

        let profile: ProfileDto = match serde_json::from_str(&body) {
            Ok(profile) => profile,
            Err(err) => {
                self.store.remove();
                return Err(SessionError::MalformedProfile {
                    reason: err.to_string(),
                });
            }
        };

        match map_profile(profile) {
            Ok(user) => Ok(user),
            Err(err) => {
                self.store.remove();
                Err(err)
            }
        }
    }
}
