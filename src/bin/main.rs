use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use sso_rolers::client::aws_sdk::AwsSdkClients;
use sso_rolers::command::exec::ExecCommand;
use sso_rolers::command::process::CredentialProcessCommand;
use sso_rolers::resolver::Resolver;
use sso_rolers::run::SsoRolers;
use sso_rolers::settings::Settings;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print credentials in the credential_process format
    Get {
        profile: String,
    },

    /// Run a command with credentials in its environment ($SHELL by default)
    Exec {
        profile: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sso_rolers={}", log_level).into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("error:{:?}", e);
            Err(e)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings;
    let resolver = Resolver::new(AwsSdkClients, settings.open_store()?)
        .with_browser(settings.browser())
        .with_rotation_window(settings.rotation_window());
    let sso_rolers = SsoRolers::new(settings.profile_loader(), resolver);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupted");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Commands::Get { profile } => {
            sso_rolers
                .run(&profile, CredentialProcessCommand::new(std::io::stdout()), &cancel)
                .await
        }
        Commands::Exec { profile, command } => {
            sso_rolers
                .run(&profile, ExecCommand::new(command), &cancel)
                .await
        }
    }
}
