pub mod client;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::StreetLight;

pub use client::SupabaseClient;

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Destination able to insert a batch of rows into a named table
#[async_trait]
pub trait TableInserter {
    async fn insert(&self, table: &str, rows: &[StreetLight]) -> Result<(), InsertError>;
}
