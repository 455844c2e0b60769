//! Credentials issued through AWS SSO with the OAuth device authorization
//! grant.
//!
//! The client registration and the access token obtained from the grant are
//! cached together under the start URL, so every profile pointing at the same
//! SSO instance shares one sign-in. Role credentials are exchanged on every
//! call; caching those is the job of [`CacheProvider`](super::cache::CacheProvider).

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sso_rolers_schema::credentials::Credentials;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::browser::OpenBrowser;
use crate::client::{defaults, services, ClientError, OidcClient, RoleCredentialsClient};
use crate::clock::{Clock, SystemClock};
use crate::error::CredentialsError;
use crate::profile::SsoProfile;
use crate::provider::{cancellable, is_fresh, rotate, ProvideCredentials, Retrieved};
use crate::store::{SecureStore, StoreError};

const AUTHORIZATION_PROMPT: &str = "
Attempting to automatically open the SSO authorization page in your default
browser. If the browser does not open or you wish to use a different device to
authorize this request, open the following URL:
";

mod polling {
    use std::time::Duration;

    // RFC 8628 section 3.5
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
    pub const SLOW_DOWN_DELAY: Duration = Duration::from_secs(5);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OidcClientToken {
    #[serde(rename = "Token")]
    token: String,

    #[serde(rename = "Expiration")]
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OidcClientCredentials {
    #[serde(rename = "ID")]
    id: String,

    #[serde(rename = "Secret")]
    secret: String,

    #[serde(rename = "Expiration")]
    expires_at: DateTime<Utc>,
}

/// What is cached under the start URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct DeviceFlowRecord {
    #[serde(rename = "Token", default)]
    token: Option<OidcClientToken>,

    #[serde(rename = "Client", default)]
    client: Option<OidcClientCredentials>,
}

pub struct SsoProvider<O, R, S: ?Sized> {
    profile: SsoProfile,
    oidc_client: O,
    role_client: R,
    store: Arc<S>,
    browser: Option<Arc<dyn OpenBrowser>>,
    prompt: Arc<Mutex<dyn Write + Send>>,
    clock: Arc<dyn Clock>,
    rotation_window: Duration,
}

impl<O, R, S> SsoProvider<O, R, S>
where
    O: OidcClient,
    R: RoleCredentialsClient,
    S: SecureStore + ?Sized,
{
    /// A provider with the default rotation window, the system clock, no
    /// browser and instructions printed to stderr.
    pub fn new(profile: SsoProfile, oidc_client: O, role_client: R, store: Arc<S>) -> Self {
        SsoProvider {
            profile,
            oidc_client,
            role_client,
            store,
            browser: None,
            prompt: Arc::new(Mutex::new(std::io::stderr())),
            clock: Arc::new(SystemClock),
            rotation_window: Duration::minutes(crate::provider::defaults::ROTATION_WINDOW_MINUTES),
        }
    }

    pub fn with_browser(mut self, browser: Option<Arc<dyn OpenBrowser>>) -> Self {
        self.browser = browser;
        self
    }

    /// Where the sign-in instructions are written.
    pub fn with_prompt(mut self, prompt: Arc<Mutex<dyn Write + Send>>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rotation_window(mut self, rotation_window: Duration) -> Self {
        self.rotation_window = rotation_window;
        self
    }

    fn load_record(&self) -> DeviceFlowRecord {
        let key = &self.profile.start_url;
        match self.store.get(key) {
            Ok(Some(data)) => serde_json::from_slice(&data).unwrap_or_else(|e| {
                warn!("ignoring unreadable sso cache for {}: {}", key, e);
                DeviceFlowRecord::default()
            }),
            Ok(None) => DeviceFlowRecord::default(),
            Err(e) => {
                warn!("ignoring sso cache for {}: {}", key, e);
                DeviceFlowRecord::default()
            }
        }
    }

    fn save_record(&self, record: &DeviceFlowRecord) -> Result<(), StoreError> {
        let key = &self.profile.start_url;
        let data = serde_json::to_vec(record).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &data, &format!("sso-rolers ({})", key))
    }

    /// Returns a usable access token, reusing cached registration and token
    /// where they are still fresh.
    async fn access_token(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(OidcClientToken, Option<StoreError>), CredentialsError> {
        let record = self.load_record();
        let now = self.clock.now();
        let mut updated = false;

        let client = match record.client {
            Some(client) if is_fresh(client.expires_at, self.rotation_window, now) => client,
            _ => {
                updated = true;
                self.register_client(cancel).await?
            }
        };

        let token = match record.token {
            Some(token) if is_fresh(token.expires_at, self.rotation_window, now) => token,
            _ => {
                updated = true;
                self.create_client_token(&client, cancel).await?
            }
        };

        let mut store_error = None;
        if updated {
            let record = DeviceFlowRecord {
                token: Some(token.clone()),
                client: Some(client),
            };
            store_error = self.save_record(&record).err();
        }

        Ok((token, store_error))
    }

    async fn register_client(
        &self,
        cancel: &CancellationToken,
    ) -> Result<OidcClientCredentials, CredentialsError> {
        debug!("registering a new sso client for {}", self.profile.start_url);
        let registered = cancellable(
            cancel,
            self.oidc_client.register_client(defaults::CLIENT_NAME),
        )
        .await?
        .map_err(|e| e.into_credentials_error(services::OIDC))?;

        Ok(OidcClientCredentials {
            id: registered.client_id,
            secret: registered.client_secret,
            expires_at: registered.expires_at,
        })
    }

    async fn create_client_token(
        &self,
        client: &OidcClientCredentials,
        cancel: &CancellationToken,
    ) -> Result<OidcClientToken, CredentialsError> {
        let authorization = cancellable(
            cancel,
            self.oidc_client.start_device_authorization(
                &client.id,
                &client.secret,
                &self.profile.start_url,
            ),
        )
        .await?
        .map_err(|e| e.into_credentials_error(services::OIDC))?;

        self.prompt(&authorization.verification_uri);

        let mut interval = authorization
            .interval
            .filter(|&i| i > 0)
            .and_then(|i| u64::try_from(i).ok())
            .map(StdDuration::from_secs)
            .unwrap_or(polling::DEFAULT_INTERVAL);

        loop {
            if cancel.is_cancelled() {
                return Err(CredentialsError::Cancelled);
            }

            let created = cancellable(
                cancel,
                self.oidc_client
                    .create_token(&client.id, &client.secret, &authorization.device_code),
            )
            .await?;

            match created {
                Ok(created) => {
                    info!("signed in to {}", self.profile.start_url);
                    let expires_at = Duration::try_seconds(created.expires_in)
                        .and_then(|d| self.clock.now().checked_add_signed(d))
                        .ok_or_else(|| CredentialsError::Protocol {
                            service: services::OIDC,
                            message: format!("expiresIn {} is out of range", created.expires_in),
                        })?;
                    return Ok(OidcClientToken {
                        token: created.access_token,
                        expires_at,
                    });
                }
                Err(ClientError::SlowDown) => {
                    interval += polling::SLOW_DOWN_DELAY;
                    debug!("asked to slow down, polling every {:?}", interval);
                }
                Err(ClientError::AuthorizationPending) => {
                    debug!("authorization pending, retrying in {:?}", interval);
                }
                Err(e) => return Err(e.into_credentials_error(services::OIDC)),
            }

            cancellable(cancel, tokio::time::sleep(interval)).await?;
        }
    }

    fn prompt(&self, verification_uri: &str) {
        let mut prompt = self.prompt.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(
            prompt,
            "{}\n{}\n(Use Ctrl-C to abort)\n",
            AUTHORIZATION_PROMPT, verification_uri
        ) {
            warn!("failed to print the authorization url: {}", e);
        }
        drop(prompt);

        if let Some(browser) = self.browser.as_ref() {
            if let Err(e) = browser.open(verification_uri) {
                warn!("failed to open browser: {}", e);
            }
        }
    }
}

#[async_trait]
impl<O, R, S> ProvideCredentials for SsoProvider<O, R, S>
where
    O: OidcClient,
    R: RoleCredentialsClient,
    S: SecureStore + ?Sized,
{
    async fn retrieve_with_report(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Retrieved, CredentialsError> {
        let (token, store_error) = self.access_token(cancel).await?;

        let role = cancellable(
            cancel,
            self.role_client.get_role_credentials(
                &token.token,
                &self.profile.account_id,
                &self.profile.role_name,
            ),
        )
        .await?
        .map_err(|e| e.into_credentials_error(services::PORTAL))?;

        let expires_at = DateTime::from_timestamp_millis(role.expiration_millis).ok_or_else(|| {
            CredentialsError::Protocol {
                service: services::PORTAL,
                message: format!("expiration {} is out of range", role.expiration_millis),
            }
        })?;

        Ok(Retrieved {
            credentials: Credentials {
                access_key_id: role.access_key_id,
                secret_access_key: role.secret_access_key,
                session_token: role.session_token,
                can_expire: true,
                expires_at: rotate(expires_at, self.rotation_window),
            },
            store_errors: store_error.into_iter().collect(),
        })
    }
}
