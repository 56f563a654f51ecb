//! Facility activity workflow
//!
//! Ties a backend to one facility: resolves the catalog, validates writes
//! to overrides and custom types, starts and stops activities and builds the
//! live timer board.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::activity::defaults::{find_built_in, CUSTOM_SORT_ORDER_START};
use crate::activity::validation::{validate_new_custom_type, validate_patch};
use crate::activity::{
    ActivityCatalog, ActivityLog, ActivityOverride, ActivityTypeDefinition, CustomActivityType,
    DefinitionPatch, FacilityCustomizations, NewActivity, NewCustomActivityType, TimerSnapshot,
};
use crate::backend::FacilityBackend;
use crate::error::{Result, ValidationError};

/// What happened to a custom type on delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    /// Removed; nothing referenced it
    Deleted,
    /// Kept but deactivated because logs reference it
    Deactivated,
}

/// One running activity with its live timer state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub activity: ActivityLog,
    pub definition: ActivityTypeDefinition,
    pub timer: TimerSnapshot,
}

impl BoardRow {
    pub fn compute(
        activity: ActivityLog,
        definition: ActivityTypeDefinition,
        now: DateTime<Utc>,
    ) -> Self {
        let timer = TimerSnapshot::compute(activity.started_at, now, &definition);
        BoardRow {
            activity,
            definition,
            timer,
        }
    }

    /// Recompute the timer in place for a new tick
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        self.timer = TimerSnapshot::compute(self.activity.started_at, now, &self.definition);
    }
}

/// Placeholder for logs whose type no longer resolves; thresholds of zero
/// make the timer urgent right away.
fn unknown_definition(code: &str) -> ActivityTypeDefinition {
    ActivityTypeDefinition {
        id: None,
        code: code.to_string(),
        label: format!("Unknown ({})", code),
        icon_name: "help-circle".to_string(),
        color: "gray".to_string(),
        max_minutes: 0,
        warning_minutes: 0,
        sort_order: i32::MAX,
        show_in_quick_log: false,
        is_custom: false,
        category: None,
        is_active: false,
    }
}

/// Build board rows from active logs, most urgent first
pub fn build_board(
    catalog: &ActivityCatalog,
    logs: Vec<ActivityLog>,
    now: DateTime<Utc>,
) -> Vec<BoardRow> {
    let mut rows: Vec<BoardRow> = logs
        .into_iter()
        .map(|log| {
            let def = catalog.definition_for(&log).unwrap_or_else(|| {
                warn!(code = %log.activity_type_code, id = %log.id, "activity has unknown type");
                unknown_definition(&log.activity_type_code)
            });
            BoardRow::compute(log, def, now)
        })
        .collect();

    sort_board(&mut rows);
    rows
}

/// Most urgent first, then longest running
pub fn sort_board(rows: &mut [BoardRow]) {
    rows.sort_by(|a, b| {
        b.timer
            .status
            .cmp(&a.timer.status)
            .then(a.activity.started_at.cmp(&b.activity.started_at))
    });
}

pub struct Workflow {
    backend: Arc<dyn FacilityBackend>,
    facility_id: String,
}

impl Workflow {
    pub fn new(backend: Arc<dyn FacilityBackend>, facility_id: impl Into<String>) -> Self {
        Workflow {
            backend,
            facility_id: facility_id.into(),
        }
    }

    pub fn facility_id(&self) -> &str {
        &self.facility_id
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn customizations(&self) -> Result<FacilityCustomizations> {
        let overrides = self.backend.fetch_overrides(&self.facility_id).await?;
        let custom_types = self.backend.fetch_custom_types(&self.facility_id).await?;
        Ok(FacilityCustomizations {
            overrides,
            custom_types,
        })
    }

    /// The facility's effective catalog; built-ins if customizations can't be read
    pub async fn catalog(&self) -> ActivityCatalog {
        ActivityCatalog::resolve_or_default(self.customizations().await)
    }

    /// Upsert an override of a built-in, merging `patch` into any existing one
    pub async fn set_override(
        &self,
        code: &str,
        patch: &DefinitionPatch,
        hidden: Option<bool>,
    ) -> Result<ActivityOverride> {
        let built_in =
            find_built_in(code).ok_or_else(|| ValidationError::NotBuiltIn(code.to_string()))?;

        let existing = self
            .backend
            .fetch_overrides(&self.facility_id)
            .await?
            .into_iter()
            .find(|o| o.activity_type_code == code);

        let mut ov = existing.unwrap_or_else(|| ActivityOverride::new(&self.facility_id, code));

        let mut current = built_in.to_definition();
        ov.patch().apply_to(&mut current);
        validate_patch(patch, &current)?;

        ov.absorb(patch);
        if let Some(hidden) = hidden {
            ov.is_hidden = hidden;
        }

        let saved = self.backend.upsert_override(&ov).await?;
        info!(facility_id = %self.facility_id, code, "activity override saved");
        Ok(saved)
    }

    /// Remove an override, reverting the type to its built-in defaults
    pub async fn clear_override(&self, code: &str) -> Result<bool> {
        if find_built_in(code).is_none() {
            return Err(ValidationError::NotBuiltIn(code.to_string()).into());
        }
        let existed = self.backend.delete_override(&self.facility_id, code).await?;
        info!(facility_id = %self.facility_id, code, existed, "activity override cleared");
        Ok(existed)
    }

    pub async fn create_custom_type(
        &self,
        input: NewCustomActivityType,
    ) -> Result<CustomActivityType> {
        validate_new_custom_type(&input)?;

        let existing = self.backend.fetch_custom_types(&self.facility_id).await?;
        if existing.iter().any(|c| c.code == input.code) {
            return Err(ValidationError::DuplicateCode(input.code).into());
        }

        let next_sort_order = existing
            .iter()
            .map(|c| c.sort_order + 1)
            .max()
            .unwrap_or(CUSTOM_SORT_ORDER_START)
            .max(CUSTOM_SORT_ORDER_START);

        let custom = CustomActivityType {
            id: Uuid::new_v4(),
            facility_id: self.facility_id.clone(),
            code: input.code,
            label: input.label.trim().to_string(),
            icon_name: input.icon_name.unwrap_or_else(|| "activity".to_string()),
            color: input.color.unwrap_or_else(|| "gray".to_string()),
            max_minutes: input.max_minutes,
            warning_minutes: input.warning_minutes,
            sort_order: input.sort_order.unwrap_or(next_sort_order),
            show_in_quick_log: input.show_in_quick_log.unwrap_or(true),
            category: input.category,
            is_active: true,
            created_at: Utc::now(),
        };

        let saved = self.backend.insert_custom_type(&custom).await?;
        info!(facility_id = %self.facility_id, code = %saved.code, id = %saved.id, "custom activity type created");
        Ok(saved)
    }

    /// Any custom type by id, active or not
    pub async fn custom_type(&self, id: Uuid) -> Result<Option<CustomActivityType>> {
        Ok(self
            .backend
            .fetch_custom_types(&self.facility_id)
            .await?
            .into_iter()
            .find(|c| c.id == id))
    }

    /// Delete a custom type, or deactivate it when logs still reference it
    pub async fn delete_custom_type(&self, id: Uuid) -> Result<DeleteOutcome> {
        let custom = self.custom_type(id).await?.ok_or_else(|| {
            crate::error::StoreError::NotFound(format!("custom activity type {}", id))
        })?;

        let references = self
            .backend
            .count_logs_referencing(&self.facility_id, &custom)
            .await?;

        if references > 0 {
            self.backend
                .set_custom_type_active(&self.facility_id, id, false)
                .await?;
            info!(code = %custom.code, references, "custom activity type in use; deactivated");
            Ok(DeleteOutcome::Deactivated)
        } else {
            self.backend.delete_custom_type(&self.facility_id, id).await?;
            info!(code = %custom.code, "custom activity type deleted");
            Ok(DeleteOutcome::Deleted)
        }
    }

    pub async fn active_activities(&self) -> Result<Vec<ActivityLog>> {
        self.backend.fetch_active_logs(&self.facility_id).await
    }

    /// Start an activity for a dog that has nothing in progress
    pub async fn start_activity(&self, input: NewActivity) -> Result<ActivityLog> {
        let dog_id = input.dog_id.trim().to_string();
        if dog_id.is_empty() {
            return Err(ValidationError::MissingField("dog_id".to_string()).into());
        }

        let catalog = self.catalog().await;
        let def = match input.custom_type_id {
            Some(id) => catalog.find_by_id(id).filter(|d| d.is_active),
            None => catalog.get(&input.activity_type_code),
        }
        .ok_or_else(|| ValidationError::UnknownActivityType(input.activity_type_code.clone()))?;

        let active = self.active_activities().await?;
        if active.iter().any(|log| log.dog_id == dog_id) {
            return Err(ValidationError::DogAlreadyActive(dog_id).into());
        }

        let log = ActivityLog {
            id: Uuid::new_v4(),
            facility_id: self.facility_id.clone(),
            dog_id,
            activity_type_code: def.code.clone(),
            custom_type_id: def.id,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            started_at: Utc::now(),
            ended_at: None,
        };

        let saved = self.backend.insert_log(&log).await?;
        info!(id = %saved.id, dog_id = %saved.dog_id, code = %saved.activity_type_code, "activity started");
        Ok(saved)
    }

    pub async fn stop_activity(&self, id: Uuid) -> Result<ActivityLog> {
        let ended = self
            .backend
            .end_log(&self.facility_id, id, Utc::now())
            .await?;
        info!(id = %ended.id, dog_id = %ended.dog_id, "activity stopped");
        Ok(ended)
    }

    /// Active activities with their timers at `now`
    pub async fn board(&self, now: DateTime<Utc>) -> Result<(ActivityCatalog, Vec<BoardRow>)> {
        let catalog = self.catalog().await;
        let logs = self.active_activities().await?;
        let rows = build_board(&catalog, logs, now);
        Ok((catalog, rows))
    }
}

/// How often live displays re-read running activities from the backend
pub const BOARD_RELOAD_INTERVAL: Duration = Duration::from_secs(30);

/// Board rows for a live display.
///
/// Timers are recomputed on every call; the catalog and the list of running
/// activities are re-read once `reload_every` has passed, so activities
/// started or stopped elsewhere show up.
pub struct BoardFeed<'a> {
    workflow: &'a Workflow,
    reload_every: Duration,
    catalog: ActivityCatalog,
    logs: Vec<ActivityLog>,
    last_reload: Option<Instant>,
}

impl<'a> BoardFeed<'a> {
    pub fn new(workflow: &'a Workflow, reload_every: Duration) -> Self {
        BoardFeed {
            workflow,
            reload_every,
            catalog: ActivityCatalog::built_in(),
            logs: Vec::new(),
            last_reload: None,
        }
    }

    fn reload_due(&self) -> bool {
        self.last_reload
            .map_or(true, |at| at.elapsed() >= self.reload_every)
    }

    /// Rows at `now`. A failed reload is returned and retried on the next call.
    pub async fn rows(&mut self, now: DateTime<Utc>) -> Result<Vec<BoardRow>> {
        if self.reload_due() {
            let catalog = self.workflow.catalog().await;
            self.logs = self.workflow.active_activities().await?;
            self.catalog = catalog;
            self.last_reload = Some(Instant::now());
        }
        Ok(build_board(&self.catalog, self.logs.clone(), now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::TimerStatus;
    use crate::error::K9Error;
    use crate::store::LocalBackend;

    fn workflow() -> Workflow {
        Workflow::new(Arc::new(LocalBackend::in_memory()), "fac-1")
    }

    fn fetch_time() -> NewCustomActivityType {
        NewCustomActivityType {
            code: "fetch_time".to_string(),
            label: "Fetch Time".to_string(),
            warning_minutes: 15,
            max_minutes: 25,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_override_merges_partial_writes() {
        let wf = workflow();
        wf.set_override(
            "potty",
            &DefinitionPatch {
                label: Some("Bathroom".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
        wf.set_override(
            "potty",
            &DefinitionPatch {
                max_minutes: Some(45),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        let catalog = wf.catalog().await;
        let potty = catalog.get("potty").unwrap();
        assert_eq!(potty.label, "Bathroom");
        assert_eq!((potty.warning_minutes, potty.max_minutes), (20, 45));
    }

    #[tokio::test]
    async fn test_set_override_rejects_unknown_and_inverted() {
        let wf = workflow();
        let err = wf
            .set_override("fetch_time", &DefinitionPatch::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            K9Error::Validation(ValidationError::NotBuiltIn(_))
        ));

        let err = wf
            .set_override(
                "potty",
                &DefinitionPatch {
                    warning_minutes: Some(40),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            K9Error::Validation(ValidationError::InvertedThresholds { .. })
        ));
        assert!(wf.customizations().await.unwrap().overrides.is_empty());
    }

    #[tokio::test]
    async fn test_clear_override_restores_default() {
        let wf = workflow();
        wf.set_override("kennel", &DefinitionPatch::default(), Some(true))
            .await
            .unwrap();
        assert!(wf.catalog().await.get("kennel").is_none());

        assert!(wf.clear_override("kennel").await.unwrap());
        assert_eq!(wf.catalog().await, ActivityCatalog::built_in());
    }

    #[tokio::test]
    async fn test_custom_type_codes_are_unique() {
        let wf = workflow();
        let first = wf.create_custom_type(fetch_time()).await.unwrap();
        assert_eq!(first.sort_order, CUSTOM_SORT_ORDER_START);

        let err = wf.create_custom_type(fetch_time()).await.unwrap_err();
        assert!(matches!(
            err,
            K9Error::Validation(ValidationError::DuplicateCode(_))
        ));

        let second = wf
            .create_custom_type(NewCustomActivityType {
                code: "nose_work".to_string(),
                label: "Nose Work".to_string(),
                ..fetch_time()
            })
            .await
            .unwrap();
        assert_eq!(second.sort_order, CUSTOM_SORT_ORDER_START + 1);
    }

    #[tokio::test]
    async fn test_invalid_custom_code_writes_nothing() {
        let wf = workflow();
        let err = wf
            .create_custom_type(NewCustomActivityType {
                code: "Fetch Time".to_string(),
                ..fetch_time()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            K9Error::Validation(ValidationError::InvalidCode(_))
        ));
        assert!(wf.customizations().await.unwrap().custom_types.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unreferenced_custom_type_removes_it() {
        let wf = workflow();
        let custom = wf.create_custom_type(fetch_time()).await.unwrap();
        assert_eq!(
            wf.delete_custom_type(custom.id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(wf.custom_type(custom.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_referenced_custom_type_deactivates_it() {
        let wf = workflow();
        let custom = wf.create_custom_type(fetch_time()).await.unwrap();
        let log = wf
            .start_activity(NewActivity {
                dog_id: "dog-1".to_string(),
                activity_type_code: "fetch_time".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(log.custom_type_id, Some(custom.id));
        wf.stop_activity(log.id).await.unwrap();

        assert_eq!(
            wf.delete_custom_type(custom.id).await.unwrap(),
            DeleteOutcome::Deactivated
        );

        let kept = wf.custom_type(custom.id).await.unwrap().unwrap();
        assert!(!kept.is_active);

        let catalog = wf.catalog().await;
        assert!(catalog.get("fetch_time").is_none());
        assert_eq!(catalog.find_by_id(custom.id).unwrap().code, "fetch_time");
    }

    #[tokio::test]
    async fn test_start_activity_rules() {
        let wf = workflow();
        let err = wf
            .start_activity(NewActivity {
                dog_id: "dog-1".to_string(),
                activity_type_code: "swimming".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            K9Error::Validation(ValidationError::UnknownActivityType(_))
        ));

        let first = wf
            .start_activity(NewActivity {
                dog_id: "dog-1".to_string(),
                activity_type_code: "walk".to_string(),
                notes: Some("  ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(first.notes.is_none());

        let err = wf
            .start_activity(NewActivity {
                dog_id: "dog-1".to_string(),
                activity_type_code: "play".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            K9Error::Validation(ValidationError::DogAlreadyActive(_))
        ));

        wf.stop_activity(first.id).await.unwrap();
        assert!(wf.stop_activity(first.id).await.is_err());
    }

    #[test]
    fn test_board_orders_by_urgency() {
        let catalog = ActivityCatalog::built_in();
        let now = Utc::now();
        let log = |dog: &str, code: &str, minutes: i64| ActivityLog {
            id: Uuid::new_v4(),
            facility_id: "fac-1".to_string(),
            dog_id: dog.to_string(),
            activity_type_code: code.to_string(),
            custom_type_id: None,
            notes: None,
            started_at: now - chrono::Duration::minutes(minutes),
            ended_at: None,
        };

        let rows = build_board(
            &catalog,
            vec![
                log("rex", "kennel", 10),
                log("bella", "potty", 25),
                log("milo", "potty", 31),
                log("ghost", "teleport", 0),
            ],
            now,
        );

        let dogs: Vec<&str> = rows.iter().map(|r| r.activity.dog_id.as_str()).collect();
        assert_eq!(dogs, vec!["milo", "bella", "rex", "ghost"]);
        assert_eq!(rows[0].timer.status, TimerStatus::Urgent);
        assert_eq!(rows[1].timer.status, TimerStatus::Warning);
        assert_eq!(rows[3].definition.label, "Unknown (teleport)");
    }

    #[tokio::test]
    async fn test_board_feed_drops_activity_stopped_elsewhere() {
        let backend: Arc<dyn FacilityBackend> = Arc::new(LocalBackend::in_memory());
        let display = Workflow::new(backend.clone(), "fac-1");
        let front_desk = Workflow::new(backend, "fac-1");

        let log = front_desk
            .start_activity(NewActivity {
                dog_id: "rex".to_string(),
                activity_type_code: "walk".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut feed = BoardFeed::new(&display, Duration::ZERO);
        assert_eq!(feed.rows(Utc::now()).await.unwrap().len(), 1);

        front_desk.stop_activity(log.id).await.unwrap();
        front_desk
            .start_activity(NewActivity {
                dog_id: "bella".to_string(),
                activity_type_code: "potty".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let rows = feed.rows(Utc::now()).await.unwrap();
        let dogs: Vec<&str> = rows.iter().map(|r| r.activity.dog_id.as_str()).collect();
        assert_eq!(dogs, vec!["bella"]);
    }

    #[tokio::test]
    async fn test_board_feed_recomputes_between_reloads() {
        let wf = workflow();
        wf.start_activity(NewActivity {
            dog_id: "rex".to_string(),
            activity_type_code: "potty".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let mut feed = BoardFeed::new(&wf, BOARD_RELOAD_INTERVAL);
        let now = Utc::now();
        let rows = feed.rows(now).await.unwrap();
        assert_eq!(rows[0].timer.status, TimerStatus::Normal);

        // Not due for a reload, but the timer still moves
        let rows = feed.rows(now + chrono::Duration::minutes(31)).await.unwrap();
        assert_eq!(rows[0].timer.status, TimerStatus::Urgent);
    }

    #[tokio::test]
    async fn test_custom_type_shadowing_built_in_ignores_built_in_logs() {
        let wf = workflow();
        let walk = wf
            .start_activity(NewActivity {
                dog_id: "rex".to_string(),
                activity_type_code: "walk".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(walk.custom_type_id.is_none());
        wf.stop_activity(walk.id).await.unwrap();

        let custom = wf
            .create_custom_type(NewCustomActivityType {
                code: "walk".to_string(),
                label: "Long Walk".to_string(),
                warning_minutes: 60,
                max_minutes: 90,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            wf.delete_custom_type(custom.id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(wf.custom_type(custom.id).await.unwrap().is_none());
    }
}
