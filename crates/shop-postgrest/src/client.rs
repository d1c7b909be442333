//! # PostgREST Record Store
//!
//! `RecordStore` over the PostgREST HTTP API (Supabase `/rest/v1`).
//!
//! | Operation | Request                                                  |
//! |-----------|----------------------------------------------------------|
//! | query     | `GET    /rest/v1/<table>?select=<joins>&<col>=eq.<val>`  |
//! | insert    | `POST   /rest/v1/<table>` + `Prefer: return=representation` |
//! | update    | `PATCH  /rest/v1/<table>?<col>=eq.<val>` + same header   |
//! | delete    | `DELETE /rest/v1/<table>?<col>=eq.<val>` + same header   |
//!
//! Delete counts are the number of rows PostgREST hands back. A filter value
//! the column type cannot parse (an `id` of `abc` on an integer key) matches
//! no rows.

use crate::config::PostgrestConfig;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use shop_core::store::select_clause;
use shop_core::{
    Filter, Join, RecordStore, Row, ShopError, ShopResult, StoreError, StoreResult, Table,
};
use tracing::{debug, error, instrument, warn};

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for invalid_text_representation
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// PostgREST-backed record store
pub struct PostgrestStore {
    config: PostgrestConfig,
    client: Client,
}

impl PostgrestStore {
    /// Create a new store client
    pub fn new(config: PostgrestConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShopError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(PostgrestConfig::from_env()?)
    }

    fn request(&self, method: Method, table: Table, filter: &Filter) -> RequestBuilder {
        let params: Vec<(&str, String)> = filter
            .conditions()
            .iter()
            .map(|(column, value)| (column.as_str(), format!("eq.{}", value)))
            .collect();

        self.client
            .request(method, self.config.table_url(table.as_str()))
            .header("apikey", &self.config.api_key)
            .header("Authorization", self.config.auth_header())
            .header("Accept", "application/json")
            .query(&params)
    }

    async fn send(
        &self,
        table: Table,
        filter: &Filter,
        request: RequestBuilder,
    ) -> StoreResult<Vec<Row>> {
        let response = request.send().await.map_err(transport_error)?;
        rows_from(table, !filter.is_empty(), response).await
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    #[instrument(skip(self, filter, joins), fields(table = %table))]
    async fn query(&self, table: Table, filter: &Filter, joins: &[Join]) -> StoreResult<Vec<Row>> {
        let request = self
            .request(Method::GET, table, filter)
            .query(&[("select", select_clause(joins))]);
        self.send(table, filter, request).await
    }

    #[instrument(skip(self, row), fields(table = %table))]
    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row> {
        let request = self
            .request(Method::POST, table, &Filter::new())
            .header("Prefer", "return=representation")
            .json(&row);

        self.send(table, &Filter::new(), request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("insert into {} returned no row", table)))
    }

    #[instrument(skip(self, filter, patch), fields(table = %table))]
    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> StoreResult<Vec<Row>> {
        require_filter(table, filter)?;
        let request = self
            .request(Method::PATCH, table, filter)
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send(table, filter, request).await
    }

    #[instrument(skip(self, filter), fields(table = %table))]
    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<u64> {
        require_filter(table, filter)?;
        let request = self
            .request(Method::DELETE, table, filter)
            .header("Prefer", "return=representation");
        let removed = self.send(table, filter, request).await?.len() as u64;
        debug!(removed, "rows deleted");
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}

/// Unfiltered writes would touch the whole table
fn require_filter(table: Table, filter: &Filter) -> StoreResult<()> {
    if filter.is_empty() {
        return Err(StoreError::Backend {
            code: "21000".to_string(),
            message: format!("{} requires a WHERE clause", table),
        });
    }
    Ok(())
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        warn!("PostgREST request timed out");
        StoreError::Timeout
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

async fn rows_from(table: Table, filtered: bool, response: Response) -> StoreResult<Vec<Row>> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Decode(e.to_string())
        }
    })?;

    if !status.is_success() {
        let parsed = serde_json::from_str::<PostgrestErrorBody>(&body).ok();
        let code = parsed.as_ref().and_then(|b| b.code.clone());

        if filtered && code.as_deref() == Some(INVALID_TEXT_REPRESENTATION) {
            debug!(table = %table, "filter value does not fit the column type, no rows match");
            return Ok(Vec::new());
        }

        error!("PostgREST error: table={}, status={}, body={}", table, status, body);
        let message = parsed
            .and_then(|b| b.message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        return Err(match code {
            Some(code) if code == UNIQUE_VIOLATION => StoreError::Conflict(message),
            Some(code) => StoreError::Backend { code, message },
            None => StoreError::Backend {
                code: status.as_u16().to_string(),
                message,
            },
        });
    }

    serde_json::from_str::<Vec<Row>>(&body).map_err(|e| {
        StoreError::Decode(format!("Failed to parse {} rows: {}", table, e))
    })
}
