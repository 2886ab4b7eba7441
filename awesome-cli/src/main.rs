//! awesome CLI - manage the blog tables through awesome-orm
//!
//! Reads the pool configuration (TOML) from `--config`, `AWESOME_CONFIG`
//! or `./awesome.toml`, creates the connection pool once and runs a
//! single subcommand against it.

use std::path::PathBuf;

use anyhow::Result;
use awesome_orm::Database;
use clap::{Parser, Subcommand};
use tracing::info;

mod commands;
mod config;
mod models;
mod tracing_setup;

use commands::{AddUserArgs, CountArgs, ListArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(
    name = "awesome",
    author,
    version,
    about = "Create and query the awesome blog tables"
)]
struct Cli {
    /// Pool configuration file (TOML)
    #[arg(long, short, global = true, env = "AWESOME_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the users, blogs and comments tables if missing
    Init,
    /// Insert a new user
    AddUser(AddUserArgs),
    /// Show one user by id
    Show(ShowArgs),
    /// List users
    List(ListArgs),
    /// Count users
    Count(CountArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // before parsing so AWESOME_CONFIG can come from .env
    config::load_dotenv();
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    let registered = models::register_all();
    info!("registered {} tables", registered.len());

    let pool_config = config::load_pool_config(cli.config.as_deref())?;
    let db = Database::connect(&pool_config).await?;

    let result = match cli.command {
        Commands::Init => commands::run_init(&db).await,
        Commands::AddUser(args) => commands::run_add_user(&db, args).await,
        Commands::Show(args) => commands::run_show(&db, args).await,
        Commands::List(args) => commands::run_list(&db, args).await,
        Commands::Count(args) => commands::run_count(&db, args).await,
    };

    db.close().await;
    result
}
