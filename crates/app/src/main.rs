use anyhow::{Context, Result};
use cartola_core::AccountId;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod decode;
mod upload;

use config::{default_config_path, load_config, Config};

#[derive(Parser, Debug)]
#[command(name = "cartola", version, about = "Recover transactions from Chilean bank statements")]
struct Cli {
    /// Path to cartola.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a .csv/.txt statement and record a pending import for review
    Scan {
        file: PathBuf,

        /// Account the statement belongs to
        #[arg(long)]
        account_id: Option<i64>,
    },

    /// Show decoded text, detected bank and per-reason row counts for a file
    Debug { file: PathBuf },

    /// Post reviewed rows of an import to an account
    Confirm {
        import_id: i64,

        #[arg(long)]
        account_id: i64,

        /// JSON file with the reviewed rows; `-` reads stdin
        #[arg(long)]
        input: PathBuf,

        /// Treat every row as included, regardless of its `include` flag
        #[arg(long)]
        include_all: bool,
    },

    /// Manage the accounts statements are posted to
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Create an account
    Add {
        name: String,

        #[arg(long)]
        institution: Option<String>,

        /// Opening balance in pesos
        #[arg(long)]
        balance: Option<Decimal>,
    },

    /// List accounts with their balances
    List,
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut s = String::new();
        std::io::stdin()
            .read_to_string(&mut s)
            .context("read reviewed rows from stdin")?;
        return Ok(s);
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

async fn open_db(config: &Config) -> Result<cartola_storage::DbPool> {
    let db_path = config.database_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    cartola_storage::create_db(&db_path)
        .await
        .with_context(|| format!("open database {}", db_path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = load_config(&config_path)?;
    init_tracing(&config.log_filter);

    match cli.command {
        Command::Scan { file, account_id } => {
            let db = open_db(&config).await?;
            let out = commands::scan(&db, &file, account_id.map(AccountId), config.preview_rows)
                .await?;
            print_json(&out)?;
        }

        Command::Debug { file } => {
            print_json(&commands::debug_extract(&file)?)?;
        }

        Command::Confirm { import_id, account_id, input, include_all } => {
            let db = open_db(&config).await?;
            let rows = commands::parse_review_input(&read_input(&input)?, include_all)?;
            let out = commands::confirm(&db, import_id, AccountId(account_id), &rows).await?;
            print_json(&out)?;
        }

        Command::Account { command } => {
            let db = open_db(&config).await?;
            match command {
                AccountCommand::Add { name, institution, balance } => {
                    let account =
                        commands::add_account(&db, &name, institution.as_deref(), balance).await?;
                    print_json(&account)?;
                }
                AccountCommand::List => {
                    print_json(&commands::list_accounts(&db).await?)?;
                }
            }
        }
    }

    Ok(())
}
