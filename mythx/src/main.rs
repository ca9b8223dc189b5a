//! Command line client for the MythX API.
//!
//! Credentials come from `MYTHX_*` environment variables and from a JSON
//! credential file that is rewritten after every command, so the token pair
//! survives between invocations.
//!
//! ```bash
//! MYTHX_ETH_ADDRESS=0x... MYTHX_PASSWORD=... mythx login
//! mythx check --bytecode-file contract.bin --wait
//! mythx ps --number 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use mythx::config::CredentialStore;
use mythx::models::request::{AnalysisSubmissionRequest, OpenApiMode};
use mythx::models::response::{AnalysisListResponse, ApiResponse};
use mythx::{AuthState, Client, Config, Environment};

const POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(author, version, about = "Command line client for the MythX API", long_about = None)]
struct Args {
    /// Use the MythX staging environment
    #[arg(long, global = true, env = "MYTHX_STAGING")]
    staging: bool,

    /// Path to the credential file [default: <tmp>/.mythx.json]
    #[arg(long, global = true, env = "MYTHX_CONFIG")]
    config: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(long, global = true, env = "MYTHX_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in to your MythX account
    Login,
    /// Log out of your MythX account
    Logout,
    /// Refresh your MythX API tokens
    Refresh,
    /// Get the OpenAPI spec in YAML or HTML format
    Openapi {
        #[arg(long)]
        html: bool,
    },
    /// Print version information of the API
    Version,
    /// Get the status of an analysis by its UUID
    Status { uuid: Uuid },
    /// List the most recent analyses
    Ps {
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(1..=100))]
        number: u16,
    },
    /// Continuously display the most recent analyses
    Top {
        /// Refresh interval in seconds
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
    /// Submit a new analysis from bytecode or Solidity source
    Check {
        #[arg(long, short = 'b', conflicts_with = "source_file", required_unless_present = "source_file")]
        bytecode_file: Option<PathBuf>,

        #[arg(long, short = 's')]
        source_file: Option<PathBuf>,

        #[arg(long, default_value = "quick", value_parser = ["quick", "full"])]
        mode: String,

        /// Wait for the analysis to finish and print its report
        #[arg(long)]
        wait: bool,
    },
    /// Get the detected issues of a finished analysis
    Report { uuid: Uuid },
}

fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::ERROR
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn save_tokens(client: &Client, path: &Path) -> Result<()> {
    CredentialStore::from(client.credentials()).save(path)
}

async fn recent_analyses(client: &mut Client, number: u16) -> Result<AnalysisListResponse> {
    let mut list = client.analysis_list(0, None, None).await?;
    list.analyses.truncate(usize::from(number));
    Ok(list)
}

fn submission_from_files(
    bytecode_file: Option<&Path>,
    source_file: Option<&Path>,
    mode: &str,
) -> Result<AnalysisSubmissionRequest> {
    let request = AnalysisSubmissionRequest::new().analysis_mode(mode);

    if let Some(path) = bytecode_file {
        let bytecode = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bytecode file {}", path.display()))?;
        return Ok(request.bytecode(bytecode.trim()));
    }

    let path = source_file.context("Please pass a bytecode or a source code file")?;
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file {}", path.display()))?;
    let filename = path.display().to_string();

    let mut sources = Map::new();
    sources.insert(filename.clone(), json!({ "source": source }));
    let contract_name = path.file_stem().map(|stem| stem.to_string_lossy().to_string());

    let request = request.sources(sources).source_list(vec![filename]);
    Ok(match contract_name {
        Some(name) => request.contract_name(name),
        None => request,
    })
}

async fn run(client: &mut Client, command: Command, store_path: &Path) -> Result<()> {
    match command {
        Command::Login => {
            client.login().await?;
            println!(
                "Successfully logged in as {}",
                client.eth_address().unwrap_or_default()
            );
        }
        Command::Logout => {
            if client.auth_state() == AuthState::Unauthenticated && client.eth_address().is_none()
            {
                println!("You are already logged out.");
                return Ok(());
            }
            client.logout().await?;
            println!("Successfully logged out");
        }
        Command::Refresh => {
            client.refresh().await?;
            println!(
                "Successfully refreshed tokens for {}",
                client.eth_address().unwrap_or_default()
            );
        }
        Command::Openapi { html } => {
            let mode = if html {
                OpenApiMode::Html
            } else {
                OpenApiMode::Yaml
            };
            println!("{}", client.openapi(mode).await?.data);
        }
        Command::Version => {
            print_json(&client.version().await?.to_structured()?)?;
        }
        Command::Status { uuid } => {
            print_json(&client.status(&uuid.to_string()).await?.to_structured()?)?;
        }
        Command::Ps { number } => {
            print_json(&recent_analyses(client, number).await?.to_structured()?)?;
        }
        Command::Top { interval } => loop {
            let list = recent_analyses(client, 20).await?;
            save_tokens(client, store_path)?;
            print!("\x1B[2J\x1B[H");
            print_json(&list.to_structured()?)?;

            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
            }
        },
        Command::Check {
            bytecode_file,
            source_file,
            mode,
            wait,
        } => {
            let request =
                submission_from_files(bytecode_file.as_deref(), source_file.as_deref(), &mode)?;
            let uuid = client.analyze(&request).await?.analysis.uuid;
            println!("Analysis submitted as job {}", uuid);

            if wait {
                while !client.analysis_ready(&uuid).await? {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                print_json(&client.report(&uuid).await?.to_structured()?)?;
            }
        }
        Command::Report { uuid } => {
            print_json(&client.report(&uuid.to_string()).await?.to_structured()?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let store_path = args
        .config
        .clone()
        .unwrap_or_else(CredentialStore::default_path);

    let mut config = Config::from_env()?;
    if args.staging {
        config.environment = Environment::Staging;
    }
    config.credentials = CredentialStore::load(&store_path)?.merge_into(config.credentials);

    let mut client = config.client()?;
    let result = run(&mut client, args.command, &store_path).await;

    // Logout leaves the address and password in place and clears only the tokens.
    save_tokens(&client, &store_path)?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mythx::Credentials;

    #[test]
    fn test_saving_after_logout_keeps_login_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");

        let logged_in = Credentials {
            eth_address: Some("0x0".to_string()),
            password: Some("pw".to_string()),
            access_token: Some("acc".to_string()),
            refresh_token: Some("ref".to_string()),
        };
        CredentialStore::from(&logged_in).save(&path).unwrap();

        let logged_out = Client::new(
            mythx::APIHandler::new(Environment::Production).unwrap(),
            Credentials::password("0x0", "pw"),
        );
        save_tokens(&logged_out, &path).unwrap();

        let stored = CredentialStore::load(&path).unwrap();
        assert_eq!(stored.username.as_deref(), Some("0x0"));
        assert_eq!(stored.password.as_deref(), Some("pw"));
        assert!(stored.access.is_none());
        assert!(stored.refresh.is_none());
    }
}
