use std::time::Duration;

use async_trait::async_trait;

use super::{InsertError, TableInserter};
use crate::config::SupabaseConfig;
use crate::domain::StreetLight;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// PostgREST client for a Supabase project, authenticated with the service role key
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, InsertError> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: &SupabaseConfig, timeout: Duration) -> Result<Self, InsertError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.service_role_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl TableInserter for SupabaseClient {
    async fn insert(&self, table: &str, rows: &[StreetLight]) -> Result<(), InsertError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InsertError::Api { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let config = SupabaseConfig {
            url: "https://abc.supabase.co/".to_string(),
            service_role_key: "key".to_string(),
        };
        let client = SupabaseClient::new(&config).unwrap();

        assert_eq!(
            client.table_url("street_lights"),
            "https://abc.supabase.co/rest/v1/street_lights"
        );
    }
}
