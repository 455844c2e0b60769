use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;

pub const VERSION: u32 = 1;

/// Output of an external `credential_process`, as read by the AWS CLI and SDKs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialProcessOutput {
    #[serde(rename = "Version")]
    pub version: u32,

    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,

    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,

    #[serde(rename = "SessionToken")]
    pub session_token: String,

    #[serde(rename = "Expiration")]
    pub expiration: String,
}

impl From<&Credentials> for CredentialProcessOutput {
    fn from(credentials: &Credentials) -> Self {
        CredentialProcessOutput {
            version: VERSION,
            access_key_id: credentials.access_key_id.clone(),
            secret_access_key: credentials.secret_access_key.clone(),
            session_token: credentials.session_token.clone(),
            expiration: credentials
                .expires_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
