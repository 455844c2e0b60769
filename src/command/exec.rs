use std::env;
use std::ffi::CString;

use async_trait::async_trait;
use sso_rolers_schema::credentials::ProfileCredentials;
use sso_rolers_schema::env::{into_variables, EnvironmentVariable};
use tracing::debug;

use crate::command::Command;

/// Replaces the current process with `command`, or with `$SHELL` when no
/// command is given, with the credentials exported to its environment.
pub struct ExecCommand {
    command: Vec<String>,
}

impl ExecCommand {
    pub fn new(command: Vec<String>) -> Self {
        ExecCommand { command }
    }

    fn argv(&self) -> anyhow::Result<Vec<CString>> {
        let command = if self.command.is_empty() {
            vec![env::var("SHELL")?]
        } else {
            self.command.clone()
        };

        command
            .into_iter()
            .map(|arg| CString::new(arg).map_err(anyhow::Error::from))
            .collect()
    }
}

#[async_trait]
impl Command for ExecCommand {
    async fn run(self, credentials: ProfileCredentials) -> anyhow::Result<()> {
        let argv = self.argv()?;
        set_credentials(&credentials);

        debug!("exec: {:?}", argv);
        nix::unistd::execvp(&argv[0], &argv)?;

        unreachable!("execvp will replace the current process, so never reach this instruction.")
    }
}

fn set_credentials(credentials: &ProfileCredentials) {
    for EnvironmentVariable { name, value } in into_variables(credentials) {
        if let Some(value) = value {
            env::set_var(name, value);
        } else {
            env::remove_var(name);
        }
    }
    env::set_var("SSO_ROLERS_PROFILE", &credentials.profile_name);
}
