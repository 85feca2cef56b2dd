//! blobkeep CLI - local control surface and HTTP launcher
//!
//! Account management (add, remove, list, passwd, show) only exists here;
//! the network listener started by `serve` exposes payload access alone.

use anyhow::Context;
use blobkeep::{logging, Config, HashCost, Vault};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blobkeep")]
#[command(about = "A per-user, password-gated blob store")]
#[command(version)]
struct Cli {
    /// Path to the database file [default: data.db]
    #[arg(short, long, env = "BLOBKEEP_DATABASE")]
    database: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(short, long, env = "BLOBKEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// bcrypt cost for newly hashed passwords (4-31)
    #[arg(long, env = "BLOBKEEP_HASH_COST")]
    cost: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database if it does not exist
    Init,

    // === Account Commands ===
    /// Register a new account
    Add {
        /// Username
        user: String,
        /// Password
        password: String,
    },

    /// Delete an account and its payload
    Remove {
        /// Username
        user: String,
    },

    /// List all usernames
    List,

    /// Replace an account's password
    Passwd {
        /// Username
        user: String,
        /// New password
        password: String,
    },

    /// Show account metadata (never the payload)
    Show {
        /// Username
        user: String,
    },

    // === Server ===
    /// Serve getData/setData over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Listen host [default: localhost]
        #[arg(long, env = "BLOBKEEP_HOST")]
        host: Option<String>,
        /// Listen port [default: 3200]
        #[arg(short, long, env = "BLOBKEEP_PORT")]
        port: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let format = cli.format;

    let result = resolve_config(&cli).and_then(|config| {
        logging::init(&config.log_filter);
        run(cli.command, config, format)
    });
    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        output(
            &format,
            &serde_json::json!({
                "status": "error",
                "message": e.to_string()
            }),
        );
        std::process::exit(1);
    }

    Ok(())
}

fn run(command: Commands, mut config: Config, format: OutputFormat) -> anyhow::Result<()> {
    let vault = open_vault(&config)?;

    match command {
        Commands::Init => {
            output(
                &format,
                &serde_json::json!({
                    "status": "ok",
                    "message": format!("Database ready at {}", config.database.display())
                }),
            );
        }

        Commands::Add { user, password } => {
            vault.register(&user, &password)?;
            output(
                &format,
                &serde_json::json!({
                    "status": "ok",
                    "user": user
                }),
            );
        }

        Commands::Remove { user } => {
            vault.remove(&user)?;
            output(
                &format,
                &serde_json::json!({
                    "status": "ok",
                    "user": user
                }),
            );
        }

        Commands::List => {
            let users: Vec<String> = vault.list()?.into_iter().map(String::from).collect();
            output(
                &format,
                &serde_json::json!({
                    "count": users.len(),
                    "users": users
                }),
            );
        }

        Commands::Passwd { user, password } => {
            vault.reset_credential(&user, &password)?;
            output(
                &format,
                &serde_json::json!({
                    "status": "ok",
                    "user": user
                }),
            );
        }

        Commands::Show { user } => {
            let info = vault.account_info(&user)?;
            output(&format, &serde_json::to_value(&info)?);
        }

        #[cfg(feature = "server")]
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            config.validate()?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(blobkeep::server::serve(std::sync::Arc::new(vault), &config))?;
        }
    }

    Ok(())
}

/// Defaults, then the config file, then flags and environment
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(cost) = cli.cost {
        config.hash_cost = HashCost::new(cost)?;
    }
    config.validate()?;
    Ok(config)
}

fn open_vault(config: &Config) -> anyhow::Result<Vault> {
    let vault = Vault::open(&config.database, config.hash_cost)
        .with_context(|| format!("failed to open database {}", config.database.display()))?;
    Ok(vault)
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    println!("{}", rendered.unwrap_or_default());
}
