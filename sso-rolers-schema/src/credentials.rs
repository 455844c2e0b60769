use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temporary role credentials.
///
/// The default value has no keys and expired at the unix epoch, so any cache
/// check treats it as stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "AccessKeyID")]
    pub access_key_id: String,

    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,

    #[serde(rename = "SessionToken")]
    pub session_token: String,

    #[serde(rename = "CanExpire")]
    pub can_expire: bool,

    #[serde(rename = "Expires")]
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn key(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret(&self) -> &str {
        &self.secret_access_key
    }

    pub fn token(&self) -> &str {
        &self.session_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.can_expire.then_some(self.expires_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCredentials {
    pub profile_name: String,
    pub region_name: String,
    pub credentials: Credentials,
}
