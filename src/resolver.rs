use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::browser::OpenBrowser;
use crate::client::{ClientFactory, OidcClient, RoleCredentialsClient};
use crate::clock::{Clock, SystemClock};
use crate::error::CredentialsError;
use crate::profile::{Profile, ProfileKind};
use crate::provider::cache::CacheProvider;
use crate::provider::sso::SsoProvider;
use crate::provider::{ProvideCredentials, Retrieved};
use crate::store::SecureStore;

/// One variant per profile kind that can issue credentials.
pub enum Provider<O, R, S: ?Sized> {
    Sso(SsoProvider<O, R, S>),
}

#[async_trait]
impl<O, R, S> ProvideCredentials for Provider<O, R, S>
where
    O: OidcClient,
    R: RoleCredentialsClient,
    S: SecureStore + ?Sized,
{
    async fn retrieve_with_report(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Retrieved, CredentialsError> {
        match self {
            Provider::Sso(provider) => provider.retrieve_with_report(cancel).await,
        }
    }
}

pub struct Resolver<C, S: ?Sized> {
    clients: C,
    store: Arc<S>,
    browser: Option<Arc<dyn OpenBrowser>>,
    prompt: Arc<Mutex<dyn Write + Send>>,
    clock: Arc<dyn Clock>,
    rotation_window: Duration,
}

impl<C, S> Resolver<C, S>
where
    C: ClientFactory,
    S: SecureStore + ?Sized,
{
    pub fn new(clients: C, store: Arc<S>) -> Self {
        Resolver {
            clients,
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

    /// The provider for `profile`, wrapped in a cache keyed by the profile name.
    pub async fn resolve(
        &self,
        profile: &Profile,
    ) -> Result<CacheProvider<Provider<C::Oidc, C::Roles, S>, S>, CredentialsError> {
        let provider = match profile.kind() {
            ProfileKind::Sso(sso) => {
                if sso.region.is_empty() {
                    return Err(CredentialsError::invalid_profile(
                        profile.name(),
                        "sso_region is not set",
                    ));
                }

                debug!(
                    "resolved sso profile. name:{}, start_url:{}",
                    sso.name, sso.start_url
                );
                let (oidc, roles) = self.clients.clients(&sso.region).await;
                let sso = SsoProvider::new(sso, oidc, roles, self.store.clone())
                    .with_browser(self.browser.clone())
                    .with_prompt(self.prompt.clone())
                    .with_clock(self.clock.clone())
                    .with_rotation_window(self.rotation_window);
                Provider::Sso(sso)
            }
            ProfileKind::Process(_) | ProfileKind::Unknown => {
                return Err(CredentialsError::invalid_profile(
                    profile.name(),
                    "unsupported profile kind",
                ))
            }
        };

        Ok(CacheProvider::new(provider, self.store.clone(), profile.name())
            .with_clock(self.clock.clone())
            .with_rotation_window(self.rotation_window))
    }
}
