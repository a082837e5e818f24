use anyhow::Result;
use clap::{Parser, Subcommand};
use fedmcp_identity::KeyStore;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use commands::Context;
use config::CliConfig;

/// FedMCP CLI: create, sign, verify and push FedMCP artifacts
#[derive(Parser)]
#[clap(name = "fedmcp", author, version, about, long_about = None)]
struct Cli {
    /// Workspace UUID
    #[clap(long, global = true)]
    workspace: Option<String>,

    /// FedMCP server URL [default: http://localhost:8090]
    #[clap(long, global = true)]
    server: Option<String>,

    /// Path to a TOML config file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the signing key file
    #[clap(long, global = true)]
    key_path: Option<PathBuf>,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Create a new artifact from a JSON body file
    Create {
        /// JSON file holding the artifact body
        json_file: PathBuf,

        /// Artifact type (e.g. policy, ssp_fragment, agent_recipe)
        #[clap(long = "type", short = 't')]
        artifact_type: String,

        /// Artifact version
        #[clap(long = "version", short = 'v', default_value = "1")]
        artifact_version: u64,

        /// Write the artifact here instead of standard output
        #[clap(long, short)]
        output: Option<PathBuf>,
    },

    /// Sign an artifact with the local signing key
    Sign {
        /// Artifact JSON file
        artifact_file: PathBuf,
    },

    /// Verify an artifact signature
    Verify {
        /// Artifact JSON file
        artifact_file: PathBuf,

        /// Detached JWS produced by `sign`
        token: String,

        /// Trusted public key: did:key, hex, JWK JSON, or a file holding one.
        /// Defaults to the local signing key.
        #[clap(long)]
        public_key: Option<String>,
    },

    /// Push an artifact to the FedMCP server
    Push {
        /// Artifact JSON file
        artifact_file: PathBuf,

        /// Detached JWS to send; signs locally when omitted
        #[clap(long)]
        token: Option<String>,
    },

    /// Signing key management commands
    #[clap(subcommand)]
    Keypair(KeypairCommands),
}

/// Signing key management commands
#[derive(Subcommand)]
enum KeypairCommands {
    /// Generate a new signing key
    Generate {
        /// Replace an existing key
        #[clap(long)]
        force: bool,
    },

    /// Show information about the signing key
    Info,

    /// Print the public key as a JWK
    ExportJwk {
        /// Output file for the JWK
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Entrypoint
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?;
    init_tracing(&config);

    let key_store = match cli.key_path.clone().or_else(|| config.key_path.clone()) {
        Some(path) => KeyStore::new(path),
        None => KeyStore::default_location(),
    };
    let ctx = Context {
        workspace: cli.workspace.clone().or_else(|| config.workspace_id.clone()),
        server_url: cli
            .server
            .clone()
            .unwrap_or_else(|| config.server_url().to_string()),
        key_store,
        config,
    };
    tracing::debug!(server = %ctx.server_url, key_path = %ctx.key_store.path().display(), "Resolved settings");

    let mut out = io::stdout().lock();
    match &cli.command {
        Commands::Create {
            json_file,
            artifact_type,
            artifact_version,
            output,
        } => {
            commands::create(&ctx, json_file, artifact_type, *artifact_version, output.as_deref(), &mut out)?;
        }
        Commands::Sign { artifact_file } => {
            commands::sign(&ctx, artifact_file, &mut out)?;
        }
        Commands::Verify {
            artifact_file,
            token,
            public_key,
        } => {
            commands::verify(&ctx, artifact_file, token, public_key.as_deref(), &mut out)?;
        }
        Commands::Push { artifact_file, token } => {
            commands::push(&ctx, artifact_file, token.as_deref(), &mut out).await?;
        }
        Commands::Keypair(cmd) => match cmd {
            KeypairCommands::Generate { force } => {
                commands::keypair_generate(&ctx, *force, &mut out)?;
            }
            KeypairCommands::Info => {
                commands::keypair_info(&ctx, &mut out)?;
            }
            KeypairCommands::ExportJwk { output } => {
                commands::keypair_export_jwk(&ctx, output.as_deref(), &mut out)?;
            }
        },
    }

    Ok(())
}
