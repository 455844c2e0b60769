use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::path::Path;

use async_trait::async_trait;
use aws_config::profile::load;
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_runtime::env_config::section::EnvConfigSections;
use aws_types::os_shim_internal::{Env, Fs};

use crate::profile::load::LoadProfiles;
use crate::profile::{Profile, ProfileSet};

fn profile_from(name: &str, value: &aws_config::profile::Profile) -> Profile {
    fn maybe_s<S: Into<String>>(s: Option<S>) -> Option<String> {
        s.map(|x| x.into())
    }

    Profile {
        name: name.to_string(),
        sso_start_url: maybe_s(value.get("sso_start_url")),
        sso_region: maybe_s(value.get("sso_region")),
        sso_account_id: maybe_s(value.get("sso_account_id")),
        sso_role_name: maybe_s(value.get("sso_role_name")),
        region_name: maybe_s(value.get("region")),
        credential_process: maybe_s(value.get("credential_process")),
    }
}

impl TryFrom<EnvConfigSections> for ProfileSet {
    type Error = anyhow::Error;

    fn try_from(value: EnvConfigSections) -> Result<Self, Self::Error> {
        let profiles = value
            .profiles()
            .filter_map(|n| {
                value
                    .get_profile(n)
                    .map(|p| (n.to_string(), profile_from(n, p)))
            })
            .collect::<BTreeMap<_, _>>();
        Ok(ProfileSet { profiles })
    }
}

/// Reads profiles from the shared AWS config file. Without an explicit path
/// the SDK's resolution applies (`AWS_CONFIG_FILE`, then `~/.aws/config`).
#[derive(Debug, Default)]
pub struct AwsSdkProfileLoader {
    profile_files: EnvConfigFiles,
    fs: Fs,
    env: Env,
}

impl AwsSdkProfileLoader {
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Self {
        let profile_files = EnvConfigFiles::builder()
            .include_default_config_file(false)
            .include_default_credentials_file(false)
            .with_file(EnvConfigFileKind::Config, path.as_ref())
            .build();

        AwsSdkProfileLoader {
            profile_files,
            ..Self::default()
        }
    }
}

#[async_trait]
impl LoadProfiles for AwsSdkProfileLoader {
    async fn load_profiles(&self) -> anyhow::Result<ProfileSet> {
        let profiles = load(&self.fs, &self.env, &self.profile_files, None).await?;
        ProfileSet::try_from(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_sso_settings_from_a_config_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            "[profile dev]\n\
             sso_start_url = https://example.awsapps.com/start\n\
             sso_region = eu-west-1\n\
             sso_account_id = 123456789012\n\
             sso_role_name = Developer\n\
             region = eu-north-1\n\
             \n\
             [profile legacy]\n\
             credential_process = legacy-helper\n"
        )?;

        let profiles = AwsSdkProfileLoader::from_config_file(file.path())
            .load_profiles()
            .await?;

        let dev = profiles.get_profile("dev").expect("dev profile");
        assert_eq!(dev.sso_start_url(), Some("https://example.awsapps.com/start"));
        assert_eq!(dev.sso_region(), Some("eu-west-1"));
        assert_eq!(dev.sso_account_id(), Some("123456789012"));
        assert_eq!(dev.sso_role_name(), Some("Developer"));
        assert_eq!(dev.region_name(), Some("eu-north-1"));

        let legacy = profiles.get_profile("legacy").expect("legacy profile");
        assert!(!legacy.is_sso_profile());
        assert_eq!(legacy.credential_process(), Some("legacy-helper"));
        Ok(())
    }
}
