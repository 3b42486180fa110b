use super::ImportError;
use crate::domain::StreetLight;
use crate::supabase::TableInserter;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Insert street lights in consecutive batches, stopping at the first failure.
///
/// Batches already inserted stay in the table; there is no rollback.
/// Returns the number of batches inserted.
pub async fn insert_in_batches<C>(
    client: &C,
    table: &str,
    records: &[StreetLight],
    batch_size: usize,
) -> Result<usize, ImportError>
where
    C: TableInserter + ?Sized,
{
    if batch_size == 0 {
        return Err(ImportError::InvalidBatchSize);
    }

    if records.is_empty() {
        tracing::info!("No street lights to insert");
        return Ok(0);
    }

    let total_count = records.len();
    tracing::info!("Inserting {} street lights into {}", total_count, table);

    let mut inserted_count = 0;

    for (index, chunk) in records.chunks(batch_size).enumerate() {
        let batch = index + 1;

        // First failure ends the run; later batches are never sent
        if let Err(e) = client.insert(table, chunk).await {
            let sample = chunk[0].clone();
            tracing::error!("Error inserting batch {}: {}", batch, e);
            tracing::error!(
                "Example record causing error: {}",
                serde_json::to_string(&sample).unwrap_or_else(|_| format!("{:?}", sample))
            );
            return Err(ImportError::InsertFailure {
                batch,
                source: e,
                sample: Box::new(sample),
            });
        }

        inserted_count += chunk.len();
        tracing::info!(
            "Inserted batch {} ({}/{} street lights)",
            batch,
            inserted_count,
            total_count
        );
    }

    Ok(records.len().div_ceil(batch_size))
}
