//! Capabilities of the remote services the device flow talks to.
//!
//! The SSO OIDC service registers clients and issues device tokens, the SSO
//! portal service trades a token for role credentials.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::{BoxError, CredentialsError};

pub mod aws_sdk;

pub mod defaults {
    pub const CLIENT_NAME: &str = "sso-rolers";
    pub const CLIENT_TYPE: &str = "public";
    pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
}

pub mod services {
    pub const OIDC: &str = "sso-oidc";
    pub const PORTAL: &str = "sso";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub verification_uri: String,
    /// Suggested polling interval in seconds.
    pub interval: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration_millis: i64,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authorization is still pending")]
    AuthorizationPending,

    #[error("polling too fast")]
    SlowDown,

    #[error("{0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Transport(BoxError),
}

impl ClientError {
    pub fn into_credentials_error(self, service: &'static str) -> CredentialsError {
        match self {
            ClientError::Transport(source) => CredentialsError::Network { service, source },
            other => CredentialsError::Protocol {
                service,
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait OidcClient: Send + Sync {
    async fn register_client(&self, client_name: &str) -> Result<RegisteredClient, ClientError>;

    async fn start_device_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        start_url: &str,
    ) -> Result<DeviceAuthorization, ClientError>;

    /// Redeems `device_code` with the device-code grant. Returns
    /// [`ClientError::AuthorizationPending`] or [`ClientError::SlowDown`] while
    /// the user has not finished signing in.
    async fn create_token(
        &self,
        client_id: &str,
        client_secret: &str,
        device_code: &str,
    ) -> Result<CreatedToken, ClientError>;
}

#[async_trait]
pub trait RoleCredentialsClient: Send + Sync {
    async fn get_role_credentials(
        &self,
        access_token: &str,
        account_id: &str,
        role_name: &str,
    ) -> Result<RoleCredentials, ClientError>;
}

/// Builds the clients for the region an SSO instance lives in.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    type Oidc: OidcClient;
    type Roles: RoleCredentialsClient;

    async fn clients(&self, region: &str) -> (Self::Oidc, Self::Roles);
}
