use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use sso_rolers_schema::credentials::Credentials;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::CredentialsError;
use crate::provider::{is_fresh, ProvideCredentials, Retrieved};
use crate::store::{SecureStore, StoreError};

/// Keeps the last credentials issued for a profile in the secure store and
/// only asks the wrapped provider again once they are about to expire.
pub struct CacheProvider<P, S: ?Sized> {
    provider: P,
    store: Arc<S>,
    profile_name: String,
    clock: Arc<dyn Clock>,
    rotation_window: Duration,
}

impl<P, S> CacheProvider<P, S>
where
    P: ProvideCredentials,
    S: SecureStore + ?Sized,
{
    pub fn new<N: Into<String>>(provider: P, store: Arc<S>, profile_name: N) -> Self {
        CacheProvider {
            provider,
            store,
            profile_name: profile_name.into(),
            clock: Arc::new(SystemClock),
            rotation_window: Duration::minutes(crate::provider::defaults::ROTATION_WINDOW_MINUTES),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rotation_window(mut self, rotation_window: Duration) -> Self {
        self.rotation_window = rotation_window;
        self
    }

    fn cached(&self) -> Option<Credentials> {
        let data = match self.store.get(&self.profile_name) {
            Ok(data) => data?,
            Err(e) => {
                warn!("ignoring credentials cache: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<Credentials>(&data) {
            Ok(creds) => Some(creds),
            Err(e) => {
                warn!(
                    "ignoring unreadable credentials cache for {}: {}",
                    self.profile_name, e
                );
                None
            }
        }
    }

    fn save(&self, creds: &Credentials) -> Result<(), StoreError> {
        let data = serde_json::to_vec(creds).map_err(|source| StoreError::Encode {
            key: self.profile_name.clone(),
            source,
        })?;
        self.store.set(
            &self.profile_name,
            &data,
            &format!("sso-rolers cache for {}", self.profile_name),
        )
    }
}

#[async_trait]
impl<P, S> ProvideCredentials for CacheProvider<P, S>
where
    P: ProvideCredentials,
    S: SecureStore + ?Sized,
{
    async fn retrieve_with_report(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Retrieved, CredentialsError> {
        if let Some(creds) = self.cached() {
            if is_fresh(creds.expires_at, self.rotation_window, self.clock.now()) {
                debug!("using cached credentials. profile:{}", self.profile_name);
                return Ok(Retrieved::from(creds));
            }
            debug!("cached credentials expired. profile:{}", self.profile_name);
        }

        let mut retrieved = self.provider.retrieve_with_report(cancel).await?;
        if let Err(e) = self.save(&retrieved.credentials) {
            retrieved.store_errors.push(e);
        }
        Ok(retrieved)
    }
}
