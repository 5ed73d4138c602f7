//! `remote-repl` command line client.
//!
//! Log verbosity is controlled with `RUST_LOG` (default `warn`).

mod account;
mod cli;
mod interactive;

use anyhow::{Context, Result};
use clap::Parser;
use remote_repl_client::{ClientConfig, FileCredentialStore};
use remote_repl_core::CredentialStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, MachineCommand};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileCredentialStore::new(path),
        None => FileCredentialStore::default_location()?,
    };
    let stored = store
        .load()
        .await
        .with_context(|| format!("failed to read {}", store.path().display()))?;
    let token = cli.token();
    let config = ClientConfig::resolve(cli.server_url.clone(), token.clone(), stored)?;
    tracing::debug!(server = %config.server_url, "configuration resolved");

    match cli.command {
        Command::Login => account::login(&store, &config, token).await,
        Command::Logout => account::logout(&store).await,
        Command::Whoami => account::whoami(&config).await,
        Command::Machine(MachineCommand::New) => account::create_machine(&config).await,
        Command::Machine(MachineCommand::List) => account::list_machines(&config).await,
        Command::Machine(MachineCommand::Repl(args)) | Command::Repl(args) => {
            interactive::run(&config, args).await
        }
    }
}
