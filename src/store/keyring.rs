use keyring::Entry;
use tracing::{debug, trace};

use crate::store::{SecureStore, StoreError};

/// Platform keychain storage: Keychain on macOS, Credential Manager on
/// Windows and the Secret Service on Linux. Each key is its own entry.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new<S: Into<String>>(service: S) -> Self {
        KeyringStore {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, keyring::Error> {
        trace!("keyring entry service:{}, key:{}", self.service, key);
        Entry::new(&self.service, key)
    }
}

impl SecureStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entry = self.entry(key).map_err(|e| StoreError::read(key, e))?;
        match entry.get_secret() {
            Ok(data) => Ok(Some(data)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::read(key, e)),
        }
    }

    fn set(&self, key: &str, data: &[u8], label: &str) -> Result<(), StoreError> {
        let entry = self.entry(key).map_err(|e| StoreError::write(key, e))?;
        entry
            .set_secret(data)
            .map_err(|e| StoreError::write(key, e))?;
        debug!("stored {} in keyring", label);
        Ok(())
    }
}
