//! Per-facility activity type catalog
//!
//! Merges the built-in table, the facility's overrides and its custom types
//! into the ordered list staff pick from. The merge is pure and never comes
//! back empty: with no customization data the built-ins are returned as-is.

use std::fmt::Display;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::defaults::{built_in_definitions, find_built_in};
use super::layers::{LayerSource, LayerStack};
use super::types::{ActivityLog, ActivityOverride, ActivityTypeDefinition, CustomActivityType};

/// Everything a facility has customized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityCustomizations {
    pub overrides: Vec<ActivityOverride>,
    pub custom_types: Vec<CustomActivityType>,
}

impl FacilityCustomizations {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.custom_types.is_empty()
    }
}

/// The effective activity types of one facility
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityCatalog {
    definitions: Vec<ActivityTypeDefinition>,
    /// Deactivated custom types, kept for displaying historical logs
    #[serde(skip)]
    retired: Vec<ActivityTypeDefinition>,
}

impl ActivityCatalog {
    /// The catalog with no customizations applied
    pub fn built_in() -> Self {
        ActivityCatalog {
            definitions: built_in_definitions(),
            retired: Vec::new(),
        }
    }

    /// Merge built-ins, overrides and custom types
    pub fn resolve(customizations: &FacilityCustomizations) -> Self {
        let mut definitions: Vec<ActivityTypeDefinition> = Vec::new();

        for base in built_in_definitions() {
            let overrides: Vec<&ActivityOverride> = customizations
                .overrides
                .iter()
                .filter(|o| o.activity_type_code == base.code)
                .collect();

            if overrides.iter().any(|o| o.is_hidden) {
                debug!(code = %base.code, "built-in activity hidden by facility override");
                continue;
            }

            let mut stack = LayerStack::new(base, LayerSource::BuiltIn);
            for ov in overrides {
                stack.push(LayerSource::FacilityOverride, ov.patch());
            }
            definitions.push(stack.resolve());
        }

        for ov in &customizations.overrides {
            if find_built_in(&ov.activity_type_code).is_none() {
                debug!(code = %ov.activity_type_code, "ignoring override for unknown built-in");
            }
        }

        let mut retired = Vec::new();
        for custom in &customizations.custom_types {
            let def = custom.to_definition();
            if !custom.is_active {
                retired.push(def);
                continue;
            }
            // Custom types take precedence over a built-in with the same code
            definitions.retain(|d| d.code != def.code);
            definitions.push(def);
        }

        // Stable sort keeps built-ins ahead of custom types on equal sort order
        definitions.sort_by_key(|d| d.sort_order);

        debug!(
            count = definitions.len(),
            retired = retired.len(),
            "resolved activity catalog"
        );

        ActivityCatalog {
            definitions,
            retired,
        }
    }

    /// Resolve from a fetch result, falling back to the built-ins on failure
    pub fn resolve_or_default<E: Display>(fetched: Result<FacilityCustomizations, E>) -> Self {
        match fetched {
            Ok(customizations) => Self::resolve(&customizations),
            Err(e) => {
                warn!(error = %e, "activity customizations unavailable; using built-in types");
                Self::built_in()
            }
        }
    }

    pub fn definitions(&self) -> &[ActivityTypeDefinition] {
        &self.definitions
    }

    pub fn into_definitions(self) -> Vec<ActivityTypeDefinition> {
        self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.code.as_str()).collect()
    }

    /// Look up an offered type by code
    pub fn get(&self, code: &str) -> Option<&ActivityTypeDefinition> {
        self.definitions.iter().find(|d| d.code == code)
    }

    /// Look up a custom type by id, including deactivated ones
    pub fn find_by_id(&self, id: Uuid) -> Option<&ActivityTypeDefinition> {
        self.definitions
            .iter()
            .chain(self.retired.iter())
            .find(|d| d.id == Some(id))
    }

    /// Types flagged for the quick-log picker
    pub fn quick_log(&self) -> Vec<&ActivityTypeDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.show_in_quick_log)
            .collect()
    }

    /// The definition that governs a logged activity's timer.
    ///
    /// Falls back to the shipped built-in (e.g. when hidden after the
    /// activity started), then to retired custom types by code. `None` means
    /// the type is unknown.
    pub fn definition_for(&self, log: &ActivityLog) -> Option<ActivityTypeDefinition> {
        if let Some(def) = log.custom_type_id.and_then(|id| self.find_by_id(id)) {
            return Some(def.clone());
        }
        if let Some(def) = self.get(&log.activity_type_code) {
            return Some(def.clone());
        }
        if let Some(built_in) = find_built_in(&log.activity_type_code) {
            return Some(built_in.to_definition());
        }
        self.retired
            .iter()
            .find(|d| d.code == log.activity_type_code)
            .cloned()
    }
}
