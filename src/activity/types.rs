//! Activity type, override and log records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::defaults::is_built_in;
use super::layers::DefinitionPatch;

fn default_true() -> bool {
    true
}

/// One kind of loggable activity, as offered to staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTypeDefinition {
    /// Set for facility-authored types only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub code: String,
    pub label: String,
    pub icon_name: String,
    pub color: String,
    pub max_minutes: i64,
    pub warning_minutes: i64,
    pub sort_order: i32,
    pub show_in_quick_log: bool,
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ActivityTypeDefinition {
    /// Thresholds are usable when the max is positive and the warning sits below it
    pub fn has_valid_thresholds(&self) -> bool {
        self.max_minutes > 0 && self.warning_minutes < self.max_minutes
    }
}

/// A facility's partial customization of a built-in type.
///
/// Unset fields fall back to the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityOverride {
    pub facility_id: String,
    pub activity_type_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_max_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_warning_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_quick_log: Option<bool>,
    #[serde(default)]
    pub is_hidden: bool,
}

impl ActivityOverride {
    pub fn new(facility_id: impl Into<String>, code: impl Into<String>) -> Self {
        ActivityOverride {
            facility_id: facility_id.into(),
            activity_type_code: code.into(),
            custom_label: None,
            custom_icon: None,
            custom_color: None,
            custom_max_minutes: None,
            custom_warning_minutes: None,
            sort_order: None,
            show_in_quick_log: None,
            is_hidden: false,
        }
    }

    /// The display/threshold fields of this override as a resolver layer
    pub fn patch(&self) -> DefinitionPatch {
        DefinitionPatch {
            label: self.custom_label.clone(),
            icon_name: self.custom_icon.clone(),
            color: self.custom_color.clone(),
            max_minutes: self.custom_max_minutes,
            warning_minutes: self.custom_warning_minutes,
            sort_order: self.sort_order,
            show_in_quick_log: self.show_in_quick_log,
            category: None,
        }
    }

    /// Copy every field set in `patch` onto this override
    pub fn absorb(&mut self, patch: &DefinitionPatch) {
        if let Some(label) = &patch.label {
            self.custom_label = Some(label.clone());
        }
        if let Some(icon) = &patch.icon_name {
            self.custom_icon = Some(icon.clone());
        }
        if let Some(color) = &patch.color {
            self.custom_color = Some(color.clone());
        }
        if patch.max_minutes.is_some() {
            self.custom_max_minutes = patch.max_minutes;
        }
        if patch.warning_minutes.is_some() {
            self.custom_warning_minutes = patch.warning_minutes;
        }
        if patch.sort_order.is_some() {
            self.sort_order = patch.sort_order;
        }
        if patch.show_in_quick_log.is_some() {
            self.show_in_quick_log = patch.show_in_quick_log;
        }
    }
}

/// A facility-authored activity type, stored in full
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomActivityType {
    pub id: Uuid,
    pub facility_id: String,
    pub code: String,
    pub label: String,
    pub icon_name: String,
    pub color: String,
    pub max_minutes: i64,
    pub warning_minutes: i64,
    pub sort_order: i32,
    pub show_in_quick_log: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CustomActivityType {
    pub fn to_definition(&self) -> ActivityTypeDefinition {
        ActivityTypeDefinition {
            id: Some(self.id),
            code: self.code.clone(),
            label: self.label.clone(),
            icon_name: self.icon_name.clone(),
            color: self.color.clone(),
            max_minutes: self.max_minutes,
            warning_minutes: self.warning_minutes,
            sort_order: self.sort_order,
            show_in_quick_log: self.show_in_quick_log,
            is_custom: true,
            category: self.category.clone(),
            is_active: self.is_active,
        }
    }
}

/// Input for creating a custom type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCustomActivityType {
    pub code: String,
    pub label: String,
    pub icon_name: Option<String>,
    pub color: Option<String>,
    pub max_minutes: i64,
    pub warning_minutes: i64,
    pub sort_order: Option<i32>,
    pub show_in_quick_log: Option<bool>,
    pub category: Option<String>,
}

/// One logged activity. It is in progress while `ended_at` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub facility_id: String,
    pub dog_id: String,
    #[serde(rename = "activity_type")]
    pub activity_type_code: String,
    #[serde(default)]
    pub custom_type_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ActivityLog {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Whether this log was recorded against `custom`.
    ///
    /// Logs without a custom type id match by code, except for built-in
    /// codes: those logs belong to the built-in even when a custom type
    /// shadows it.
    pub fn references_custom_type(&self, custom: &CustomActivityType) -> bool {
        match self.custom_type_id {
            Some(id) => id == custom.id,
            None => {
                self.activity_type_code == custom.code && !is_built_in(&self.activity_type_code)
            }
        }
    }
}

/// Input for starting an activity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewActivity {
    pub dog_id: String,
    pub activity_type_code: String,
    pub notes: Option<String>,
    pub custom_type_id: Option<Uuid>,
}

/// Threshold status of a running activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Normal,
    Warning,
    Urgent,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Normal => "normal",
            TimerStatus::Warning => "warning",
            TimerStatus::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_serializes_camel_case() {
        let def = ActivityTypeDefinition {
            id: None,
            code: "potty".to_string(),
            label: "Potty".to_string(),
            icon_name: "droplets".to_string(),
            color: "amber".to_string(),
            max_minutes: 30,
            warning_minutes: 20,
            sort_order: 2,
            show_in_quick_log: true,
            is_custom: false,
            category: None,
            is_active: true,
        };
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["iconName"], "droplets");
        assert_eq!(json["maxMinutes"], 30);
        assert_eq!(json["showInQuickLog"], true);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_override_absorb_keeps_unset_fields() {
        let mut ov = ActivityOverride::new("fac-1", "potty");
        ov.custom_max_minutes = Some(40);
        ov.absorb(&DefinitionPatch {
            label: Some("Bathroom".to_string()),
            ..Default::default()
        });
        assert_eq!(ov.custom_label.as_deref(), Some("Bathroom"));
        assert_eq!(ov.custom_max_minutes, Some(40));
    }

    #[test]
    fn test_log_deserializes_backend_row() {
        let row = r#"{
            "id": "6f1c2f1e-1111-4b5b-9d3e-2a7a4c0e9f10",
            "facility_id": "fac-1",
            "dog_id": "dog-7",
            "activity_type": "potty",
            "started_at": "2026-10-19T08:00:00Z",
            "ended_at": null
        }"#;
        let log: ActivityLog = serde_json::from_str(row).unwrap();
        assert_eq!(log.activity_type_code, "potty");
        assert!(log.is_active());
        assert!(log.notes.is_none());
    }

    #[test]
    fn test_log_references_custom_type() {
        let custom = |code: &str| CustomActivityType {
            id: Uuid::new_v4(),
            facility_id: "fac-1".to_string(),
            code: code.to_string(),
            label: "Custom".to_string(),
            icon_name: "activity".to_string(),
            color: "gray".to_string(),
            max_minutes: 30,
            warning_minutes: 20,
            sort_order: 100,
            show_in_quick_log: true,
            category: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let log = |code: &str, custom_type_id: Option<Uuid>| ActivityLog {
            id: Uuid::new_v4(),
            facility_id: "fac-1".to_string(),
            dog_id: "rex".to_string(),
            activity_type_code: code.to_string(),
            custom_type_id,
            notes: None,
            started_at: Utc::now(),
            ended_at: None,
        };

        let fetch = custom("fetch_time");
        assert!(log("fetch_time", None).references_custom_type(&fetch));
        assert!(log("fetch_time", Some(fetch.id)).references_custom_type(&fetch));
        assert!(!log("fetch_time", Some(Uuid::new_v4())).references_custom_type(&fetch));

        // A built-in walk log is not a use of a custom walk
        let walk = custom("walk");
        assert!(!log("walk", None).references_custom_type(&walk));
        assert!(log("walk", Some(walk.id)).references_custom_type(&walk));
    }

    #[test]
    fn test_status_ordering_and_display() {
        assert!(TimerStatus::Normal < TimerStatus::Warning);
        assert!(TimerStatus::Warning < TimerStatus::Urgent);
        assert_eq!(TimerStatus::Urgent.to_string(), "urgent");
        assert_eq!(
            serde_json::to_string(&TimerStatus::Warning).unwrap(),
            "\"warning\""
        );
    }
}
