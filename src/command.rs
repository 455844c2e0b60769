use async_trait::async_trait;
use sso_rolers_schema::credentials::ProfileCredentials;

pub mod exec;
pub mod process;

/// What to do with the credentials once they are issued.
#[async_trait]
pub trait Command: Send {
    async fn run(self, credentials: ProfileCredentials) -> anyhow::Result<()>;
}
