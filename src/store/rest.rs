use std::env;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{ChangeEvent, ChangeFeed, ChangeKind, EntityStore, Row, Table};
use crate::error::{AppError, StoreError};

#[derive(Clone, Debug)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RestConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let base_url = lookup("SUPABASE_URL")
            .ok_or_else(|| AppError::BadRequest("SUPABASE_URL is not set".to_string()))?;
        let api_key = lookup("SUPABASE_KEY")
            .ok_or_else(|| AppError::BadRequest("SUPABASE_KEY is not set".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Entity store backed by a hosted PostgREST endpoint (`/rest/v1/<table>`).
///
/// Change events are published for this client's own mutations; writes made
/// by other clients are only seen on the next refresh.
pub struct RestStore {
    client: Client,
    config: RestConfig,
    feed: ChangeFeed,
}

impl RestStore {
    pub fn new(config: RestConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::BadRequest(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            feed: ChangeFeed::new(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, table.name())
    }

    fn row_url(&self, table: Table, id: i64) -> String {
        format!("{}?id=eq.{}", self.table_url(table), id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    /// Sends the request and decodes the JSON array PostgREST answers with.
    async fn send(&self, table: Table, request: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!("{} responded {} ({} bytes)", table, status, body.len());
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|source| StoreError::Codec { table, source })
    }
}

#[async_trait]
impl EntityStore for RestStore {
    async fn select(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        let url = format!("{}?select=*&order=id.asc", self.table_url(table));
        self.send(table, self.request(Method::GET, &url)).await
    }

    async fn insert(&self, table: Table, fields: Row) -> Result<Row, StoreError> {
        let request = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&fields);

        let row = self
            .send(table, request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected(format!("insert into {} returned no row", table)))?;

        info!("inserted into {}", table);
        self.feed.publish(table, ChangeKind::Insert);
        Ok(row)
    }

    async fn update(&self, table: Table, id: i64, patch: Row) -> Result<Row, StoreError> {
        let request = self
            .request(Method::PATCH, &self.row_url(table, id))
            .header("Prefer", "return=representation")
            .json(&patch);

        let row = self
            .send(table, request)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound { table, id })?;

        self.feed.publish(table, ChangeKind::Update);
        Ok(row)
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError> {
        let request = self
            .request(Method::DELETE, &self.row_url(table, id))
            .header("Prefer", "return=representation");

        if self.send(table, request).await?.is_empty() {
            return Err(StoreError::NotFound { table, id });
        }

        self.feed.publish(table, ChangeKind::Delete);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_requires_url_and_key() {
        let err = RestConfig::from_lookup(lookup(&[("SUPABASE_KEY", "k")]))
            .expect_err("missing url");
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("SUPABASE_URL")));

        let err = RestConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]))
            .expect_err("missing key");
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("SUPABASE_KEY")));
    }

    #[test]
    fn test_urls_are_built_per_table() {
        let config = RestConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://x.supabase.co/"),
            ("SUPABASE_KEY", "k"),
        ]))
        .expect("Failed to build config");
        let store = RestStore::new(config).expect("Failed to build store");

        assert_eq!(
            store.table_url(Table::CourseTypes),
            "https://x.supabase.co/rest/v1/course_types"
        );
        assert_eq!(
            store.row_url(Table::Offerings, 3),
            "https://x.supabase.co/rest/v1/offerings?id=eq.3"
        );
    }
}
