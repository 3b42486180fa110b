use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use street_lights_importer::config::{self, ConfigError, SupabaseConfig};
use street_lights_importer::importer::{
    self, ImportOptions, DATASET_EXPORT_URL, DEFAULT_BATCH_SIZE, DEFAULT_INPUT, DEFAULT_TABLE,
};
use tracing_subscriber::EnvFilter;

const EXIT_MISSING_CONFIG: u8 = 2;

const EXIT_CODES_HELP: &str = "Exit codes:
  0  import completed
  1  unreadable CSV or missing geo_point_2d column
  2  Supabase credentials missing
  3  input file not found (download instructions are printed)
  4  a batch insert failed; later batches were not sent";

#[derive(Parser, Debug)]
#[command(name = "import-lights")]
#[command(about = "Import Paris street lighting data into Supabase", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Args {
    /// Path to the semicolon-delimited eclairage-public CSV export
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Environment file holding the Supabase credentials
    #[arg(long, default_value = "../.env.local")]
    env_file: PathBuf,

    /// Destination table
    #[arg(long, default_value = DEFAULT_TABLE)]
    table: String,

    /// Number of records per insert request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size)]
    batch_size: usize,

    /// Parse and transform the file without inserting anything
    #[arg(long)]
    dry_run: bool,
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(loaded) = config::load_env_file(&args.env_file) {
        tracing::info!("Loaded environment from {}", loaded);
    }

    if !args.input.exists() {
        tracing::warn!("Please download the CSV from:");
        tracing::warn!("{}", DATASET_EXPORT_URL);
        tracing::warn!("Save it as: {}", args.input.display());
        return ExitCode::from(
            importer::ImportError::InputNotFound(args.input.clone()).exit_code(),
        );
    }

    let config = match SupabaseConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::Missing(missing)) => {
            tracing::error!("Missing Supabase credentials. Check your .env.local file.");
            for name in &missing {
                tracing::error!("  {} is not set", name);
            }
            return ExitCode::from(EXIT_MISSING_CONFIG);
        }
    };

    let options = ImportOptions {
        input: args.input,
        table: args.table,
        batch_size: args.batch_size,
        dry_run: args.dry_run,
    };

    match importer::run(&config, &options).await {
        Ok(summary) => {
            tracing::info!(
                "Done: {} records prepared, {} rows skipped, {} batches inserted",
                summary.prepared,
                summary.skipped,
                summary.batches
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Import aborted: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
