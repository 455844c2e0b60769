//! Opaque key to bytes storage used by every cache layer.
//!
//! Records are written whole with a single `set`, so a reader never observes
//! a partially updated record.

use thiserror::Error;

use crate::error::BoxError;

pub mod file;
pub mod keyring;
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read \"{key}\" from the secure store: {source}")]
    Read {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to write \"{key}\" to the secure store: {source}")]
    Write {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to encode the record for \"{key}\": {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn read<K: Into<String>, E: Into<BoxError>>(key: K, source: E) -> Self {
        StoreError::Read {
            key: key.into(),
            source: source.into(),
        }
    }

    pub fn write<K: Into<String>, E: Into<BoxError>>(key: K, source: E) -> Self {
        StoreError::Write {
            key: key.into(),
            source: source.into(),
        }
    }
}

pub trait SecureStore: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces whatever is stored under `key`. `label` is a human readable
    /// description for backends that can display one.
    fn set(&self, key: &str, data: &[u8], label: &str) -> Result<(), StoreError>;
}

pub mod defaults {
    pub const SERVICE_NAME: &str = "sso-rolers";
    pub const STORE_DIR: &str = ".sso-rolers/keys";
}
