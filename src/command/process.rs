use std::io::Write;

use async_trait::async_trait;
use sso_rolers_schema::credentials::ProfileCredentials;
use sso_rolers_schema::process::CredentialProcessOutput;
use tracing::debug;

use crate::command::Command;

/// Writes the credentials in the `credential_process` output format, for
/// use from `~/.aws/config`:
///
/// ```ini
/// [profile dev-cli]
/// credential_process = sso-rolers get dev
/// ```
pub struct CredentialProcessCommand<W> {
    writer: W,
}

impl<W: Write + Send> CredentialProcessCommand<W> {
    pub fn new(writer: W) -> Self {
        CredentialProcessCommand { writer }
    }
}

#[async_trait]
impl<W: Write + Send> Command for CredentialProcessCommand<W> {
    async fn run(mut self, credentials: ProfileCredentials) -> anyhow::Result<()> {
        debug!("writing credentials. profile:{}", credentials.profile_name);
        let output = CredentialProcessOutput::from(&credentials.credentials);
        serde_json::to_writer(&mut self.writer, &output)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
