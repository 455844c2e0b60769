use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sso_rolers_schema::credentials::Credentials;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::CredentialsError;
use crate::store::StoreError;

pub mod cache;
pub mod sso;

pub mod defaults {
    /// Minutes subtracted from every expiration before it is compared to now.
    pub const ROTATION_WINDOW_MINUTES: i64 = 30;

    /// One week.
    pub const MAX_ROTATION_WINDOW_MINUTES: i64 = 7 * 24 * 60;
}

/// Freshly issued credentials, together with any cache writes that failed
/// while issuing them. A failed write never fails the issuance.
#[derive(Debug)]
pub struct Retrieved {
    pub credentials: Credentials,
    pub store_errors: Vec<StoreError>,
}

impl From<Credentials> for Retrieved {
    fn from(credentials: Credentials) -> Self {
        Retrieved {
            credentials,
            store_errors: Vec::new(),
        }
    }
}

#[async_trait]
pub trait ProvideCredentials: Send + Sync {
    async fn retrieve_with_report(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Retrieved, CredentialsError>;

    async fn retrieve(&self, cancel: &CancellationToken) -> Result<Credentials, CredentialsError> {
        let retrieved = self.retrieve_with_report(cancel).await?;
        for err in &retrieved.store_errors {
            warn!("credentials issued but not cached: {}", err);
        }
        Ok(retrieved.credentials)
    }
}

/// `expires_at - window`, saturating instead of overflowing.
pub fn rotate(expires_at: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    expires_at
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn is_fresh(expires_at: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> bool {
    rotate(expires_at, window) > now
}

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, CredentialsError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CredentialsError::Cancelled),
        output = fut => Ok(output),
    }
}
