pub mod inserter;
pub mod parser;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::SupabaseConfig;
use crate::domain::StreetLight;
use crate::supabase::{InsertError, SupabaseClient, TableInserter};

pub use inserter::DEFAULT_BATCH_SIZE;

pub const DEFAULT_INPUT: &str = "eclairage-public.csv";
pub const DEFAULT_TABLE: &str = "street_lights";
pub const DATASET_EXPORT_URL: &str =
    "https://opendata.paris.fr/explore/dataset/eclairage-public/export/";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column {0:?}; is the file semicolon-delimited?")]
    MissingColumn(&'static str),
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
    #[error("failed to create API client: {0}")]
    Client(#[source] InsertError),
    #[error("failed to insert batch {batch}: {source}")]
    InsertFailure {
        batch: usize,
        #[source]
        source: InsertError,
        sample: Box<StreetLight>,
    },
}

impl ImportError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InputNotFound(_) => 3,
            Self::InsertFailure { .. } => 4,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub input: PathBuf,
    pub table: String,
    pub batch_size: usize,
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            table: DEFAULT_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub prepared: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Read, transform and insert the CSV file through `client`
pub async fn import_file<C>(
    client: &C,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    C: TableInserter + ?Sized,
{
    // Read the whole file
    let rows = parser::read_rows(&options.input)?;

    // Build records, dropping rows without usable coordinates
    tracing::info!("Preparing data...");
    let outcome = parser::transform_rows(&rows);
    drop(rows);

    tracing::info!("Prepared {} records", outcome.records.len());

    // Insert in batches
    let batches = if options.dry_run {
        tracing::info!("Dry run: skipping insert into {}", options.table);
        0
    } else {
        inserter::insert_in_batches(client, &options.table, &outcome.records, options.batch_size)
            .await?
    };

    tracing::info!("Import complete!");

    Ok(ImportSummary {
        prepared: outcome.records.len(),
        skipped: outcome.skipped,
        batches,
    })
}

/// Import into the Supabase project described by `config`
pub async fn run(
    config: &SupabaseConfig,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError> {
    let client = SupabaseClient::new(config).map_err(ImportError::Client)?;

    tracing::info!("Importing into {} at {}", options.table, config.url);
    import_file(&client, options).await
}
