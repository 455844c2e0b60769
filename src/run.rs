use sso_rolers_schema::credentials::ProfileCredentials;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ClientFactory;
use crate::command::Command;
use crate::error::CredentialsError;
use crate::profile::load::LoadProfiles;
use crate::provider::ProvideCredentials;
use crate::resolver::Resolver;
use crate::store::SecureStore;

pub struct SsoRolers<L, C, S: ?Sized> {
    loader: L,
    resolver: Resolver<C, S>,
}

impl<L, C, S> SsoRolers<L, C, S>
where
    L: LoadProfiles,
    C: ClientFactory,
    S: SecureStore + ?Sized,
{
    pub fn new(loader: L, resolver: Resolver<C, S>) -> Self {
        Self { loader, resolver }
    }

    /// Issues credentials for `profile_name`, from the cache when possible.
    pub async fn credentials(
        &self,
        profile_name: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<ProfileCredentials> {
        let profiles = self.loader.load_profiles().await?;
        let profile = profiles
            .get_profile(profile_name)
            .ok_or_else(|| CredentialsError::invalid_profile(profile_name, "profile not found"))?;
        debug!("target profile:{}", profile.name);

        let provider = self.resolver.resolve(profile).await?;
        let credentials = provider.retrieve(cancel).await?;

        let region_name = profile
            .region_name()
            .or(profile.sso_region())
            .unwrap_or_default()
            .to_string();

        Ok(ProfileCredentials {
            profile_name: profile.name().to_string(),
            region_name,
            credentials,
        })
    }

    pub async fn run<H: Command>(
        self,
        profile_name: &str,
        command: H,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let credentials = self.credentials(profile_name, cancel).await?;
        command.run(credentials).await
    }
}
