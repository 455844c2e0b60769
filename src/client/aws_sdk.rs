use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_ssooidc::error::{DisplayErrorContext, SdkError};
use aws_types::region::Region;
use chrono::DateTime;
use tracing::debug;

use crate::client::{
    defaults, ClientError, ClientFactory, CreatedToken, DeviceAuthorization, OidcClient,
    RegisteredClient, RoleCredentials, RoleCredentialsClient,
};

fn sdk_error<E, R>(err: SdkError<E, R>) -> ClientError
where
    E: Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => {
            ClientError::Rejected(DisplayErrorContext(context.into_err()).to_string())
        }
        other => ClientError::Transport(Box::new(other)),
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String, ClientError> {
    value
        .map(|s| s.to_string())
        .ok_or_else(|| ClientError::Malformed(format!("{} is missing", field)))
}

/// Clients backed by the AWS SDK. Requests to both services are sent
/// unsigned; the bearer token is the only credential involved. SDK retries
/// are disabled: only the token polling loop retries.
#[derive(Debug, Clone, Default)]
pub struct AwsSdkClients;

#[async_trait]
impl ClientFactory for AwsSdkClients {
    type Oidc = AwsSdkOidcClient;
    type Roles = AwsSdkRoleCredentialsClient;

    async fn clients(&self, region: &str) -> (Self::Oidc, Self::Roles) {
        debug!("loading sso clients. region:{}", region);
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .no_credentials()
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        (
            AwsSdkOidcClient(aws_sdk_ssooidc::Client::new(&config)),
            AwsSdkRoleCredentialsClient(aws_sdk_sso::Client::new(&config)),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AwsSdkOidcClient(aws_sdk_ssooidc::Client);

#[async_trait]
impl OidcClient for AwsSdkOidcClient {
    async fn register_client(&self, client_name: &str) -> Result<RegisteredClient, ClientError> {
        let output = self
            .0
            .register_client()
            .client_name(client_name)
            .client_type(defaults::CLIENT_TYPE)
            .send()
            .await
            .map_err(sdk_error)?;

        let expires_at = DateTime::from_timestamp(output.client_secret_expires_at(), 0)
            .ok_or_else(|| ClientError::Malformed("clientSecretExpiresAt is out of range".into()))?;

        Ok(RegisteredClient {
            client_id: required(output.client_id(), "clientId")?,
            client_secret: required(output.client_secret(), "clientSecret")?,
            expires_at,
        })
    }

    async fn start_device_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        start_url: &str,
    ) -> Result<DeviceAuthorization, ClientError> {
        let output = self
            .0
            .start_device_authorization()
            .client_id(client_id)
            .client_secret(client_secret)
            .start_url(start_url)
            .send()
            .await
            .map_err(sdk_error)?;

        let verification_uri = output
            .verification_uri_complete()
            .or(output.verification_uri());

        Ok(DeviceAuthorization {
            device_code: required(output.device_code(), "deviceCode")?,
            verification_uri: required(verification_uri, "verificationUri")?,
            interval: Some(i64::from(output.interval())),
        })
    }

    async fn create_token(
        &self,
        client_id: &str,
        client_secret: &str,
        device_code: &str,
    ) -> Result<CreatedToken, ClientError> {
        let output = self
            .0
            .create_token()
            .client_id(client_id)
            .client_secret(client_secret)
            .device_code(device_code)
            .grant_type(defaults::DEVICE_CODE_GRANT_TYPE)
            .send()
            .await
            .map_err(|err| {
                let service_error = err.as_service_error();
                if service_error.map_or(false, |e| e.is_authorization_pending_exception()) {
                    ClientError::AuthorizationPending
                } else if service_error.map_or(false, |e| e.is_slow_down_exception()) {
                    ClientError::SlowDown
                } else {
                    sdk_error(err)
                }
            })?;

        Ok(CreatedToken {
            access_token: required(output.access_token(), "accessToken")?,
            expires_in: i64::from(output.expires_in()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AwsSdkRoleCredentialsClient(aws_sdk_sso::Client);

#[async_trait]
impl RoleCredentialsClient for AwsSdkRoleCredentialsClient {
    async fn get_role_credentials(
        &self,
        access_token: &str,
        account_id: &str,
        role_name: &str,
    ) -> Result<RoleCredentials, ClientError> {
        let output = self
            .0
            .get_role_credentials()
            .access_token(access_token)
            .account_id(account_id)
            .role_name(role_name)
            .send()
            .await
            .map_err(sdk_error)?;

        let creds = output
            .role_credentials()
            .ok_or_else(|| ClientError::Malformed("roleCredentials is missing".into()))?;

        Ok(RoleCredentials {
            access_key_id: required(creds.access_key_id(), "accessKeyId")?,
            secret_access_key: required(creds.secret_access_key(), "secretAccessKey")?,
            session_token: required(creds.session_token(), "sessionToken")?,
            expiration_millis: creds.expiration(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clients_send_each_request_once() {
        let (oidc, roles) = AwsSdkClients.clients("eu-west-1").await;

        let attempts = |retry: Option<&RetryConfig>| retry.map(|r| r.max_attempts());
        assert_eq!(attempts(oidc.0.config().retry_config()), Some(1));
        assert_eq!(attempts(roles.0.config().retry_config()), Some(1));
    }
}
