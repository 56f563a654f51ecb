//! Hosted backend over the Supabase REST (PostgREST) API

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::activity::defaults::is_built_in;
use crate::activity::{ActivityLog, ActivityOverride, CustomActivityType};
use crate::backend::FacilityBackend;
use crate::config::RemoteSettings;
use crate::error::{ApiError, Result, StoreError};

const OVERRIDES_TABLE: &str = "activity_type_overrides";
const CUSTOM_TYPES_TABLE: &str = "custom_activity_types";
const LOGS_TABLE: &str = "activity_logs";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: Uuid,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Query filter for logs recorded against `custom`. Untagged logs with a
/// built-in code belong to the built-in, so only the id is matched then.
fn references_filter(custom: &CustomActivityType) -> (&'static str, String) {
    if is_built_in(&custom.code) {
        ("custom_type_id", eq(custom.id))
    } else {
        (
            "or",
            format!(
                "(custom_type_id.eq.{},and(custom_type_id.is.null,activity_type.eq.{}))",
                custom.id, custom.code
            ),
        )
    }
}

impl SupabaseClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(ApiError::NetworkError)?;

        Ok(SupabaseClient {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, table: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(ApiError::NetworkError)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthenticationFailed.into());
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::RequestFailed {
                endpoint: table.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let text = response.text().await.map_err(ApiError::NetworkError)?;
        debug!(table, bytes = text.len(), "supabase response");

        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{} returned unexpected JSON: {}", table, e)).into()
        })
    }

    /// Send a write that asks for the affected rows back
    async fn send_returning<T: DeserializeOwned>(
        &self,
        table: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>> {
        self.send(table, request.header("Prefer", "return=representation"))
            .await
    }

    fn single<T>(rows: Vec<T>, what: String) -> Result<T> {
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(what).into())
    }
}

#[async_trait]
impl FacilityBackend for SupabaseClient {
    fn name(&self) -> &'static str {
        "supabase"
    }

    #[instrument(skip(self))]
    async fn fetch_overrides(&self, facility_id: &str) -> Result<Vec<ActivityOverride>> {
        let request = self
            .request(Method::GET, OVERRIDES_TABLE)
            .query(&[("facility_id", eq(facility_id)), ("select", "*".to_string())]);
        self.send(OVERRIDES_TABLE, request).await
    }

    async fn upsert_override(&self, ov: &ActivityOverride) -> Result<ActivityOverride> {
        let request = self
            .request(Method::POST, OVERRIDES_TABLE)
            .query(&[("on_conflict", "facility_id,activity_type_code")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(ov);
        let rows = self.send_returning(OVERRIDES_TABLE, request).await?;
        Self::single(rows, format!("override {}", ov.activity_type_code))
    }

    async fn delete_override(&self, facility_id: &str, code: &str) -> Result<bool> {
        let request = self
            .request(Method::DELETE, OVERRIDES_TABLE)
            .query(&[("facility_id", eq(facility_id)), ("activity_type_code", eq(code))]);
        let rows: Vec<ActivityOverride> = self.send_returning(OVERRIDES_TABLE, request).await?;
        Ok(!rows.is_empty())
    }

    #[instrument(skip(self))]
    async fn fetch_custom_types(&self, facility_id: &str) -> Result<Vec<CustomActivityType>> {
        let request = self.request(Method::GET, CUSTOM_TYPES_TABLE).query(&[
            ("facility_id", eq(facility_id)),
            ("select", "*".to_string()),
            ("order", "sort_order.asc".to_string()),
        ]);
        self.send(CUSTOM_TYPES_TABLE, request).await
    }

    async fn insert_custom_type(&self, custom: &CustomActivityType) -> Result<CustomActivityType> {
        let request = self.request(Method::POST, CUSTOM_TYPES_TABLE).json(custom);
        let rows = self.send_returning(CUSTOM_TYPES_TABLE, request).await?;
        Self::single(rows, format!("custom activity type {}", custom.code))
    }

    async fn set_custom_type_active(
        &self,
        facility_id: &str,
        id: Uuid,
        active: bool,
    ) -> Result<()> {
        let request = self
            .request(Method::PATCH, CUSTOM_TYPES_TABLE)
            .query(&[("facility_id", eq(facility_id)), ("id", eq(id))])
            .json(&json!({ "is_active": active }));
        let rows: Vec<CustomActivityType> =
            self.send_returning(CUSTOM_TYPES_TABLE, request).await?;
        Self::single(rows, format!("custom activity type {}", id)).map(|_| ())
    }

    async fn delete_custom_type(&self, facility_id: &str, id: Uuid) -> Result<()> {
        let request = self
            .request(Method::DELETE, CUSTOM_TYPES_TABLE)
            .query(&[("facility_id", eq(facility_id)), ("id", eq(id))]);
        let rows: Vec<CustomActivityType> =
            self.send_returning(CUSTOM_TYPES_TABLE, request).await?;
        Self::single(rows, format!("custom activity type {}", id)).map(|_| ())
    }

    async fn count_logs_referencing(
        &self,
        facility_id: &str,
        custom: &CustomActivityType,
    ) -> Result<usize> {
        let (key, filter) = references_filter(custom);
        let request = self.request(Method::GET, LOGS_TABLE).query(&[
            ("facility_id", eq(facility_id)),
            (key, filter),
            ("select", "id".to_string()),
        ]);
        let rows: Vec<IdRow> = self.send(LOGS_TABLE, request).await?;
        Ok(rows.len())
    }

    #[instrument(skip(self))]
    async fn fetch_active_logs(&self, facility_id: &str) -> Result<Vec<ActivityLog>> {
        let request = self.request(Method::GET, LOGS_TABLE).query(&[
            ("facility_id", eq(facility_id)),
            ("ended_at", "is.null".to_string()),
            ("order", "started_at.asc".to_string()),
        ]);
        self.send(LOGS_TABLE, request).await
    }

    async fn insert_log(&self, log: &ActivityLog) -> Result<ActivityLog> {
        let request = self.request(Method::POST, LOGS_TABLE).json(log);
        let rows = self.send_returning(LOGS_TABLE, request).await?;
        Self::single(rows, format!("activity {}", log.id))
    }

    async fn end_log(
        &self,
        facility_id: &str,
        id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<ActivityLog> {
        let request = self
            .request(Method::PATCH, LOGS_TABLE)
            .query(&[
                ("facility_id", eq(facility_id)),
                ("id", eq(id)),
                ("ended_at", "is.null".to_string()),
            ])
            .json(&json!({ "ended_at": ended_at }));
        let rows = self.send_returning(LOGS_TABLE, request).await?;
        Self::single(rows, format!("active activity {}", id))
    }
}
