//! Backend port for facility data
//!
//! The workflow reads and writes overrides, custom types and activity logs
//! through this trait. Implementations do storage only; validation and the
//! soft-delete rule live in `workflow`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::activity::{ActivityLog, ActivityOverride, CustomActivityType};
use crate::error::Result;

#[async_trait]
pub trait FacilityBackend: Send + Sync {
    /// Short name for logs ("local", "supabase")
    fn name(&self) -> &'static str;

    async fn fetch_overrides(&self, facility_id: &str) -> Result<Vec<ActivityOverride>>;

    /// Insert or replace the override keyed by `(facility_id, activity_type_code)`
    async fn upsert_override(&self, ov: &ActivityOverride) -> Result<ActivityOverride>;

    /// Returns whether an override existed
    async fn delete_override(&self, facility_id: &str, code: &str) -> Result<bool>;

    /// All custom types, active and inactive
    async fn fetch_custom_types(&self, facility_id: &str) -> Result<Vec<CustomActivityType>>;

    async fn insert_custom_type(&self, custom: &CustomActivityType) -> Result<CustomActivityType>;

    async fn set_custom_type_active(&self, facility_id: &str, id: Uuid, active: bool)
        -> Result<()>;

    async fn delete_custom_type(&self, facility_id: &str, id: Uuid) -> Result<()>;

    /// Number of logs (active or ended) that reference the custom type
    async fn count_logs_referencing(
        &self,
        facility_id: &str,
        custom: &CustomActivityType,
    ) -> Result<usize>;

    async fn fetch_active_logs(&self, facility_id: &str) -> Result<Vec<ActivityLog>>;

    async fn insert_log(&self, log: &ActivityLog) -> Result<ActivityLog>;

    /// Set `ended_at` on an active log. Unknown or already-ended logs are not found.
    async fn end_log(
        &self,
        facility_id: &str,
        id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<ActivityLog>;
}
