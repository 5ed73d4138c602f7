//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use remote_repl_core::{ApiToken, MachineName};
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "remote-repl", version, about = "Run code on remote REPL machines")]
pub struct Cli {
    /// Credential file (defaults to the platform config directory)
    #[arg(long, global = true, env = "REMOTE_REPL_CONFIG")]
    pub config: Option<PathBuf>,

    /// API server URL
    #[arg(long, global = true, env = "REMOTE_REPL_SERVER_URL")]
    pub server_url: Option<Url>,

    /// API token, overriding the stored one
    #[arg(long, global = true, env = "REMOTE_REPL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    #[must_use]
    pub fn token(&self) -> Option<ApiToken> {
        self.token.as_deref().map(ApiToken::new)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API token
    Login,
    /// Remove the stored API token
    Logout,
    /// Show the account the token belongs to
    Whoami,
    /// Manage machines
    #[command(subcommand)]
    Machine(MachineCommand),
    /// Start an interactive session
    Repl(ReplArgs),
}

#[derive(Debug, Subcommand)]
pub enum MachineCommand {
    /// Provision a new machine
    New,
    /// List machines
    List,
    /// Start an interactive session
    Repl(ReplArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ReplArgs {
    /// Machine to connect to; a new one is provisioned when omitted
    pub machine: Option<MachineName>,

    /// Per-instruction timeout
    #[arg(long)]
    pub timeout_seconds: Option<u32>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repl_defaults_to_new_machine() {
        let cli = Cli::try_parse_from(["remote-repl", "repl"]).unwrap();
        let Command::Repl(args) = cli.command else {
            panic!("expected repl");
        };
        assert_eq!(args.machine, None);
        assert_eq!(args.timeout_seconds, None);
    }

    #[test]
    fn test_machine_repl_alias() {
        let cli = Cli::try_parse_from([
            "remote-repl",
            "machine",
            "repl",
            "m-1",
            "--timeout-seconds",
            "30",
        ])
        .unwrap();
        let Command::Machine(MachineCommand::Repl(args)) = cli.command else {
            panic!("expected machine repl");
        };
        assert_eq!(args.machine, Some(MachineName::from("m-1")));
        assert_eq!(args.timeout_seconds, Some(30));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "remote-repl",
            "whoami",
            "--server-url",
            "http://localhost:8080",
            "--token",
            "a.b",
        ])
        .unwrap();
        assert_eq!(cli.server_url.unwrap().as_str(), "http://localhost:8080/");
        assert_eq!(cli.token.as_deref(), Some("a.b"));
    }

    #[test]
    fn test_invalid_server_url_rejected() {
        assert!(Cli::try_parse_from(["remote-repl", "whoami", "--server-url", "not a url"]).is_err());
    }
}
