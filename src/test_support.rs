use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sso_rolers_schema::credentials::Credentials;
use tokio_util::sync::CancellationToken;

use crate::browser::OpenBrowser;
use crate::client::{
    ClientError, ClientFactory, CreatedToken, DeviceAuthorization, OidcClient, RegisteredClient,
    RoleCredentials, RoleCredentialsClient,
};
use crate::error::CredentialsError;
use crate::provider::{ProvideCredentials, Retrieved};

pub const START_URL: &str = "https://example/start";
pub const ACCESS_TOKEN: &str = "fresh-token";

#[derive(Debug, Default)]
pub struct OidcCalls {
    pub register: AtomicUsize,
    pub start: AtomicUsize,
    pub create_token: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeOidcClient {
    pub calls: Arc<OidcCalls>,
    client_expires_at: DateTime<Utc>,
    interval: Option<i64>,
    token_responses: Arc<Mutex<VecDeque<Result<CreatedToken, ClientError>>>>,
}

impl FakeOidcClient {
    pub fn new(now: DateTime<Utc>) -> Self {
        FakeOidcClient {
            calls: Arc::new(OidcCalls::default()),
            client_expires_at: now + Duration::days(90),
            interval: Some(1),
            token_responses: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn with_interval(self, interval: Option<i64>) -> Self {
        FakeOidcClient { interval, ..self }
    }

    /// Responses returned by `create_token`, in order. Once exhausted every
    /// call succeeds.
    pub fn with_token_responses(self, responses: Vec<Result<CreatedToken, ClientError>>) -> Self {
        *self.token_responses.lock().unwrap() = responses.into();
        self
    }

    pub fn register_calls(&self) -> usize {
        self.calls.register.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.calls.start.load(Ordering::SeqCst)
    }

    pub fn create_token_calls(&self) -> usize {
        self.calls.create_token.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OidcClient for FakeOidcClient {
    async fn register_client(&self, client_name: &str) -> Result<RegisteredClient, ClientError> {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
        assert_eq!(client_name, crate::client::defaults::CLIENT_NAME);
        Ok(RegisteredClient {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            expires_at: self.client_expires_at,
        })
    }

    async fn start_device_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        start_url: &str,
    ) -> Result<DeviceAuthorization, ClientError> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        assert!(!client_id.is_empty());
        assert!(!client_secret.is_empty());
        Ok(DeviceAuthorization {
            device_code: "device-code".to_string(),
            verification_uri: format!("{}/device?user_code=ABCD-EFGH", start_url),
            interval: self.interval,
        })
    }

    async fn create_token(
        &self,
        _client_id: &str,
        _client_secret: &str,
        device_code: &str,
    ) -> Result<CreatedToken, ClientError> {
        self.calls.create_token.fetch_add(1, Ordering::SeqCst);
        assert_eq!(device_code, "device-code");
        let next = self.token_responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(CreatedToken {
                access_token: ACCESS_TOKEN.to_string(),
                expires_in: 8 * 3600,
            })
        })
    }
}

#[derive(Clone)]
pub struct FakeRoleCredentialsClient {
    pub expiration: DateTime<Utc>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl FakeRoleCredentialsClient {
    pub fn new(expiration: DateTime<Utc>) -> Self {
        FakeRoleCredentialsClient {
            expiration,
            tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    /// Access tokens passed to `get_role_credentials`, in call order.
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleCredentialsClient for FakeRoleCredentialsClient {
    async fn get_role_credentials(
        &self,
        access_token: &str,
        account_id: &str,
        role_name: &str,
    ) -> Result<RoleCredentials, ClientError> {
        self.tokens.lock().unwrap().push(access_token.to_string());
        assert_eq!(account_id, "123456789012");
        assert_eq!(role_name, "Developer");
        Ok(RoleCredentials {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "session".to_string(),
            expiration_millis: self.expiration.timestamp_millis(),
        })
    }
}

#[derive(Clone)]
pub struct FakeClients {
    pub oidc: FakeOidcClient,
    pub roles: FakeRoleCredentialsClient,
    regions: Arc<Mutex<Vec<String>>>,
}

impl FakeClients {
    pub fn new(oidc: FakeOidcClient, roles: FakeRoleCredentialsClient) -> Self {
        FakeClients {
            oidc,
            roles,
            regions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn regions(&self) -> Vec<String> {
        self.regions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientFactory for FakeClients {
    type Oidc = FakeOidcClient;
    type Roles = FakeRoleCredentialsClient;

    async fn clients(&self, region: &str) -> (Self::Oidc, Self::Roles) {
        self.regions.lock().unwrap().push(region.to_string());
        (self.oidc.clone(), self.roles.clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    opened: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl FakeBrowser {
    pub fn failing() -> Self {
        FakeBrowser {
            fail: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl OpenBrowser for FakeBrowser {
    fn open(&self, url: &str) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.fail {
            anyhow::bail!("no display");
        }
        Ok(())
    }
}

/// Hands out `credentials` and counts how often it was asked.
#[derive(Clone)]
pub struct CountingProvider {
    credentials: Credentials,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub fn new(credentials: Credentials) -> Self {
        CountingProvider {
            credentials,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        CountingProvider {
            fail: true,
            ..Self::new(Credentials::default())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvideCredentials for CountingProvider {
    async fn retrieve_with_report(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Retrieved, CredentialsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CredentialsError::Protocol {
                service: "test",
                message: "access denied".to_string(),
            });
        }
        Ok(Retrieved::from(self.credentials.clone()))
    }
}

pub fn credentials_expiring_at(expires_at: DateTime<Utc>) -> Credentials {
    Credentials {
        access_key_id: "ASIACACHED".to_string(),
        secret_access_key: "cached-secret".to_string(),
        session_token: "cached-session".to_string(),
        can_expire: true,
        expires_at,
    }
}
