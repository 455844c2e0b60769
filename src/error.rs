use thiserror::Error;

use crate::store::StoreError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CredentialsError {
    /// Transport failure talking to the identity or role-credential service.
    #[error("failed to reach {service}: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    /// An error response, or a response missing required fields.
    #[error("{service} rejected the request: {message}")]
    Protocol {
        service: &'static str,
        message: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid profile \"{profile}\": {reason}")]
    InvalidProfile { profile: String, reason: String },

    #[error("cancelled before credentials were issued")]
    Cancelled,
}

impl CredentialsError {
    pub fn invalid_profile<P: Into<String>, R: Into<String>>(profile: P, reason: R) -> Self {
        CredentialsError::InvalidProfile {
            profile: profile.into(),
            reason: reason.into(),
        }
    }
}
