//! Account and machine commands.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow, bail};
use remote_repl_client::{ApiClient, ApiMachine, ClientConfig, verify_token};
use remote_repl_core::{ApiToken, CredentialStore};

pub fn require_client(config: &ClientConfig) -> Result<ApiClient> {
    config
        .client()
        .ok_or_else(|| anyhow!("not logged in; run `remote-repl login` or set REMOTE_REPL_TOKEN"))
}

/// Validate and store a token.
///
/// An explicit token is always checked and saved. Without one, a stored
/// token that still works is kept; otherwise the user is prompted.
pub async fn login(
    store: &dyn CredentialStore,
    config: &ClientConfig,
    explicit: Option<ApiToken>,
) -> Result<()> {
    let token = match explicit.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            if let Some(stored) = &config.token {
                if let Ok(account) = verify_token(&config.server_url, stored).await {
                    println!("Already logged in as {account}");
                    return Ok(());
                }
                tracing::info!("stored token rejected, prompting for a new one");
            }
            prompt_token()?
        }
    };

    let account = verify_token(&config.server_url, &token)
        .await
        .context("token was not accepted")?;
    store
        .save(&config.credentials(token))
        .await
        .context("failed to save credentials")?;

    println!("Logged in as {account}");
    Ok(())
}

/// Forget the stored token.
pub async fn logout(store: &dyn CredentialStore) -> Result<()> {
    if store.clear().await.context("failed to update credentials")? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

/// Print the account behind the current token.
pub async fn whoami(config: &ClientConfig) -> Result<()> {
    let client = require_client(config)?;
    let account = client.whoami().await.context("whoami request failed")?.account;
    println!("Logged in to {} as {account}", client.base_url());
    Ok(())
}

fn prompt_token() -> Result<ApiToken> {
    print!("API token: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let token = ApiToken::new(line);
    if token.is_empty() {
        bail!("no token entered");
    }
    Ok(token)
}

pub async fn create_machine(config: &ClientConfig) -> Result<()> {
    let client = require_client(config)?;
    let created = client
        .create_machine()
        .await
        .context("failed to create machine")?;
    println!("{}", created.machine_name);
    Ok(())
}

pub async fn list_machines(config: &ClientConfig) -> Result<()> {
    let client = require_client(config)?;
    let machines = client
        .list_machines()
        .await
        .context("failed to list machines")?
        .machines;

    if machines.is_empty() {
        println!("No machines");
        return Ok(());
    }
    for machine in &machines {
        println!("{}", format_machine(machine));
    }
    Ok(())
}

fn format_machine(machine: &ApiMachine) -> String {
    let status = match (machine.running, machine.has_pending_instruction) {
        (true, true) => "busy",
        (true, false) => "running",
        (false, _) => "stopped",
    };
    let mut line = format!("{:<24} {status:<8} created {}", machine.name, machine.created_at);
    if let Some(expires_at) = &machine.expires_at {
        line.push_str(&format!(" expires {expires_at}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_machine() {
        let machine: ApiMachine = serde_json::from_value(json!({
            "name": "m-1",
            "created_at": "2026-01-01",
            "running": true,
            "has_pending_instruction": true,
            "expires_at": "2026-02-01"
        }))
        .unwrap();
        let line = format_machine(&machine);
        assert!(line.starts_with("m-1 "));
        assert!(line.contains("busy"));
        assert!(line.ends_with("expires 2026-02-01"));
    }
}
