use crate::error::{ImportError, StoreError};
use crate::storage::LoanStore;
use crate::types::LoanRecord;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Writes to a Supabase table through the PostgREST endpoint at
/// `<url>/rest/v1/<table>`.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, key: &str, timeout: Duration) -> Result<Self, ImportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl LoanStore for SupabaseStore {
    async fn upsert(
        &self,
        table: &str,
        records: &[LoanRecord],
        on_conflict: &str,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_vec(records)?;
        let endpoint = self.endpoint(table);
        debug!("POST {} ({} records)", endpoint, records.len());

        let resp = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.key))
            .header("apikey", self.key.clone())
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", on_conflict)])
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
