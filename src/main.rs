use clap::{Parser, Subcommand};
use ppp_import::config::ImportConfig;
use ppp_import::constants::{SERVICE_KEY_ENV, SUPABASE_URL_ENV};
use ppp_import::credentials::{env_var, resolve_service_key, resolve_supabase_url};
use ppp_import::logging;
use ppp_import::pipeline::{extract_loans, run_import};
use ppp_import::report::RunReporter;
use ppp_import::storage::LoanStore;
use ppp_import::supabase::SupabaseStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ppp_import")]
#[command(about = "Import Minnesota childcare PPP loans into Supabase")]
#[command(version = "0.1.0")]
struct Cli {
    /// Optional TOML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract matching loans and upsert them (default)
    Import,
    /// Extract matching loans and print a sample without writing anything
    Preview {
        /// Number of records to print
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

async fn import(config: &ImportConfig) -> anyhow::Result<()> {
    let env_file = &config.supabase.env_file;
    let url = resolve_supabase_url(|| env_var(SUPABASE_URL_ENV), env_file, &config.supabase.url);
    let key = resolve_service_key(|| env_var(SERVICE_KEY_ENV), env_file).unwrap_or_else(|| {
        warn!("No Supabase service key found in the environment or {}; continuing without one", env_file.display());
        String::new()
    });
    info!("Writing to {} table {}", url, config.supabase.table);

    let store: Arc<dyn LoanStore> = Arc::new(SupabaseStore::new(
        &url,
        &key,
        Duration::from_secs(config.supabase.timeout_seconds),
    )?);

    let mut reporter = RunReporter::stdout();
    let result = run_import(config, store, &mut reporter).await?;
    if result.summary.records_failed() > 0 {
        warn!("{} records could not be written", result.summary.records_failed());
    }
    Ok(())
}

fn preview(config: &ImportConfig, limit: usize) -> anyhow::Result<()> {
    let records = extract_loans(config)?;
    println!("Found {} {} PPP loans", records.len(), config.filter_label());
    for record in records.iter().take(limit) {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = ImportConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Import) {
        Commands::Import => import(&config).await,
        Commands::Preview { limit } => preview(&config, limit),
    }
}
