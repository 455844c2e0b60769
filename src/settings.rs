use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use clap::{Args, ValueEnum};
use tracing::debug;

use crate::browser::{OpenBrowser, WebBrowser};
use crate::profile::load::aws_sdk::AwsSdkProfileLoader;
use crate::provider::defaults::{MAX_ROTATION_WINDOW_MINUTES, ROTATION_WINDOW_MINUTES};
use crate::store::file::FileStore;
use crate::store::keyring::KeyringStore;
use crate::store::{defaults, SecureStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// The OS keychain (macOS Keychain, Windows Credential Manager, Secret Service).
    Keyring,
    /// One 0600 file per key under `--store-dir`.
    File,
}

/// Options shared by every subcommand. Each can also be set through an
/// `SSO_ROLERS_*` environment variable.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// AWS config file to read profiles from [default: $AWS_CONFIG_FILE or ~/.aws/config]
    #[arg(long, global = true, env = "SSO_ROLERS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Minutes before expiration at which cached tokens and credentials are renewed (at most a week)
    #[arg(
        long,
        global = true,
        env = "SSO_ROLERS_ROTATION_WINDOW",
        value_name = "MINUTES",
        default_value_t = ROTATION_WINDOW_MINUTES,
        value_parser = clap::value_parser!(i64).range(0..=MAX_ROTATION_WINDOW_MINUTES),
    )]
    pub rotation_window: i64,

    /// Print the authorization URL without opening a browser
    #[arg(long, global = true, env = "SSO_ROLERS_NO_BROWSER")]
    pub no_browser: bool,

    #[arg(
        long,
        global = true,
        env = "SSO_ROLERS_STORE",
        value_enum,
        default_value_t = StoreBackend::Keyring
    )]
    pub store: StoreBackend,

    /// Directory used by the file store [default: ~/.sso-rolers/keys]
    #[arg(long, global = true, env = "SSO_ROLERS_STORE_DIR", value_name = "PATH")]
    pub store_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            config_file: None,
            rotation_window: ROTATION_WINDOW_MINUTES,
            no_browser: false,
            store: StoreBackend::Keyring,
            store_dir: None,
        }
    }
}

impl Settings {
    pub fn rotation_window(&self) -> Duration {
        Duration::minutes(self.rotation_window.clamp(0, MAX_ROTATION_WINDOW_MINUTES))
    }

    pub fn browser(&self) -> Option<Arc<dyn OpenBrowser>> {
        if self.no_browser {
            None
        } else {
            Some(Arc::new(WebBrowser))
        }
    }

    pub fn profile_loader(&self) -> AwsSdkProfileLoader {
        match self.config_file.as_ref() {
            Some(path) => AwsSdkProfileLoader::from_config_file(path),
            None => AwsSdkProfileLoader::default(),
        }
    }

    pub fn store_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = self.store_dir.as_ref() {
            return Ok(dir.clone());
        }

        dirs::home_dir()
            .map(|home| home.join(defaults::STORE_DIR))
            .ok_or_else(|| anyhow::anyhow!("cannot locate the home directory, set --store-dir"))
    }

    pub fn open_store(&self) -> anyhow::Result<Arc<dyn SecureStore>> {
        let store: Arc<dyn SecureStore> = match self.store {
            StoreBackend::Keyring => Arc::new(KeyringStore::new(defaults::SERVICE_NAME)),
            StoreBackend::File => {
                let dir = self.store_dir()?;
                debug!("using file store. dir:{}", dir.display());
                Arc::new(FileStore::new(dir))
            }
        };
        Ok(store)
    }
}
