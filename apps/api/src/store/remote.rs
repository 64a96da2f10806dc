//! Remote row store client.
//!
//! Speaks a PostgREST-style REST dialect: one URL per logical table, `eq.`
//! filters as query parameters, whole-row JSON bodies. The service credential
//! is attached to every request; callers never handle auth themselves.
//!
//! The applications table is additionally exposed through the
//! [`ApplicationsStore`] trait so the lifecycle manager can run against an
//! in-memory fake in tests.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::application::Application;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// An equality filter, rendered as `column=eq.value`.
pub type Filter<'a> = (&'a str, String);

pub fn eq<'a>(column: &'a str, value: impl ToString) -> Filter<'a> {
    (column, format!("eq.{}", value.to_string()))
}

/// A membership filter, rendered as `column=in.(a,b,c)`.
pub fn any_of<'a, T: ToString>(column: &'a str, values: &[T]) -> Filter<'a> {
    let list = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    (column, format!("in.({list})"))
}

/// Thin client over the remote row store's REST interface.
#[derive(Clone)]
pub struct RemoteClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteClient {
    pub fn new(base_url: String, api_key: String) -> RemoteClient {
        RemoteClient {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// `GET /rest/v1/{table}?col=eq.v&order=...&limit=...`
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter<'_>],
        order: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<T>, RemoteError> {
        let params = build_query(filters, order, limit);
        let response = self
            .authed(self.client.get(self.table_url(table)).query(&params))
            .send()
            .await?;
        let response = check(response).await?;
        let body = response.text().await?;
        debug!("select {table}: {} bytes", body.len());
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /rest/v1/{table}` with a single-row JSON body.
    pub async fn insert<T: Serialize>(&self, table: &str, row: &T) -> Result<(), RemoteError> {
        let response = self
            .authed(self.client.post(self.table_url(table)).json(row))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// `PATCH /rest/v1/{table}?col=eq.v` replacing the matched rows' fields.
    pub async fn update<T: Serialize>(
        &self,
        table: &str,
        filters: &[Filter<'_>],
        row: &T,
    ) -> Result<(), RemoteError> {
        let params = build_query(filters, None, None);
        let response = self
            .authed(
                self.client
                    .patch(self.table_url(table))
                    .query(&params)
                    .json(row),
            )
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// `DELETE /rest/v1/{table}?col=eq.v`. Matching zero rows is success.
    pub async fn delete(&self, table: &str, filters: &[Filter<'_>]) -> Result<(), RemoteError> {
        let params = build_query(filters, None, None);
        let response = self
            .authed(self.client.delete(self.table_url(table)).query(&params))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

fn build_query(
    filters: &[Filter<'_>],
    order: Option<&str>,
    limit: Option<u32>,
) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = filters
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect();
    if let Some(order) = order {
        params.push(("order".to_string(), order.to_string()));
    }
    if let Some(limit) = limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

async fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Applications table
// ────────────────────────────────────────────────────────────────────────────

/// Remote access to the applications table, owner-scoped on every call.
///
/// Carried by the lifecycle manager as `Arc<dyn ApplicationsStore>` so tests
/// can substitute an in-memory fake with failure injection.
#[async_trait]
pub trait ApplicationsStore: Send + Sync {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Application>, RemoteError>;

    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Application>, RemoteError>;

    async fn insert(&self, application: &Application) -> Result<(), RemoteError>;

    async fn update(&self, application: &Application) -> Result<(), RemoteError>;

    /// Idempotent: deleting a row that does not exist is success.
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), RemoteError>;
}

pub const APPLICATIONS_TABLE: &str = "applications";

#[async_trait]
impl ApplicationsStore for RemoteClient {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Application>, RemoteError> {
        self.select(
            APPLICATIONS_TABLE,
            &[eq("owner_id", owner_id)],
            Some("created_at.desc"),
            None,
        )
        .await
    }

    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Application>, RemoteError> {
        let mut rows: Vec<Application> = self
            .select(
                APPLICATIONS_TABLE,
                &[eq("owner_id", owner_id), eq("id", id)],
                None,
                Some(1),
            )
            .await?;
        Ok(rows.pop())
    }

    async fn insert(&self, application: &Application) -> Result<(), RemoteError> {
        RemoteClient::insert(self, APPLICATIONS_TABLE, application).await
    }

    async fn update(&self, application: &Application) -> Result<(), RemoteError> {
        RemoteClient::update(
            self,
            APPLICATIONS_TABLE,
            &[
                eq("owner_id", application.owner_id),
                eq("id", application.id),
            ],
            application,
        )
        .await
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), RemoteError> {
        RemoteClient::delete(
            self,
            APPLICATIONS_TABLE,
            &[eq("owner_id", owner_id), eq("id", id)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let client = RemoteClient::new("https://store.example.com/".to_string(), "k".to_string());
        assert_eq!(
            client.table_url("applications"),
            "https://store.example.com/rest/v1/applications"
        );
    }

    #[test]
    fn test_eq_filter_renders_postgrest_dialect() {
        let id = Uuid::new_v4();
        let (column, value) = eq("owner_id", id);
        assert_eq!(column, "owner_id");
        assert_eq!(value, format!("eq.{id}"));
    }

    #[test]
    fn test_any_of_filter_renders_membership_list() {
        let (column, value) = any_of("user_id", &["a", "b", "c"]);
        assert_eq!(column, "user_id");
        assert_eq!(value, "in.(a,b,c)");
    }

    #[test]
    fn test_build_query_appends_order_and_limit() {
        let params = build_query(
            &[eq("owner_id", "u1"), eq("is_public", "true")],
            Some("created_at.desc"),
            Some(10),
        );
        assert_eq!(
            params,
            vec![
                ("owner_id".to_string(), "eq.u1".to_string()),
                ("is_public".to_string(), "eq.true".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_query_without_order_or_limit() {
        let params = build_query(&[], None, None);
        assert!(params.is_empty());
    }
}
