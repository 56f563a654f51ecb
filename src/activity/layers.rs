//! Layered resolution of activity type definitions
//!
//! A definition is resolved from a complete base plus an ordered list of
//! partial layers. For every field the last layer that sets it wins; a field
//! no layer sets keeps the base value. Nothing ever resolves to "unset".

use serde::{Deserialize, Serialize};

use super::types::ActivityTypeDefinition;

/// A partial definition: every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionPatch {
    pub label: Option<String>,
    pub icon_name: Option<String>,
    pub color: Option<String>,
    pub max_minutes: Option<i64>,
    pub warning_minutes: Option<i64>,
    pub sort_order: Option<i32>,
    pub show_in_quick_log: Option<bool>,
    pub category: Option<String>,
}

impl DefinitionPatch {
    pub fn is_empty(&self) -> bool {
        self == &DefinitionPatch::default()
    }

    /// Whether this patch sets the given field
    pub fn sets(&self, field: Field) -> bool {
        match field {
            Field::Label => self.label.is_some(),
            Field::IconName => self.icon_name.is_some(),
            Field::Color => self.color.is_some(),
            Field::MaxMinutes => self.max_minutes.is_some(),
            Field::WarningMinutes => self.warning_minutes.is_some(),
            Field::SortOrder => self.sort_order.is_some(),
            Field::ShowInQuickLog => self.show_in_quick_log.is_some(),
            Field::Category => self.category.is_some(),
        }
    }

    /// Write every set field onto `def`
    pub fn apply_to(&self, def: &mut ActivityTypeDefinition) {
        if let Some(label) = &self.label {
            def.label = label.clone();
        }
        if let Some(icon_name) = &self.icon_name {
            def.icon_name = icon_name.clone();
        }
        if let Some(color) = &self.color {
            def.color = color.clone();
        }
        if let Some(max) = self.max_minutes {
            def.max_minutes = max;
        }
        if let Some(warning) = self.warning_minutes {
            def.warning_minutes = warning;
        }
        if let Some(sort_order) = self.sort_order {
            def.sort_order = sort_order;
        }
        if let Some(show) = self.show_in_quick_log {
            def.show_in_quick_log = show;
        }
        if let Some(category) = &self.category {
            def.category = Some(category.clone());
        }
    }
}

/// Fields a layer can set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Label,
    IconName,
    Color,
    MaxMinutes,
    WarningMinutes,
    SortOrder,
    ShowInQuickLog,
    Category,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Label,
        Field::IconName,
        Field::Color,
        Field::MaxMinutes,
        Field::WarningMinutes,
        Field::SortOrder,
        Field::ShowInQuickLog,
        Field::Category,
    ];
}

/// Where a layer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSource {
    BuiltIn,
    FacilityOverride,
    Custom,
}

/// A base definition plus the layers stacked on top of it
#[derive(Debug, Clone)]
pub struct LayerStack {
    base: ActivityTypeDefinition,
    base_source: LayerSource,
    layers: Vec<(LayerSource, DefinitionPatch)>,
}

impl LayerStack {
    pub fn new(base: ActivityTypeDefinition, base_source: LayerSource) -> Self {
        LayerStack {
            base,
            base_source,
            layers: Vec::new(),
        }
    }

    pub fn push(&mut self, source: LayerSource, patch: DefinitionPatch) -> &mut Self {
        self.layers.push((source, patch));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The effective definition
    pub fn resolve(&self) -> ActivityTypeDefinition {
        let mut def = self.base.clone();
        for (_, patch) in &self.layers {
            patch.apply_to(&mut def);
        }
        def
    }

    /// Which layer supplied the effective value of `field`
    pub fn source_of(&self, field: Field) -> LayerSource {
        self.layers
            .iter()
            .rev()
            .find(|(_, patch)| patch.sets(field))
            .map(|(source, _)| *source)
            .unwrap_or(self.base_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::defaults::find_built_in;

    fn potty_stack() -> LayerStack {
        let base = find_built_in("potty").unwrap().to_definition();
        LayerStack::new(base, LayerSource::BuiltIn)
    }

    #[test]
    fn test_no_layers_resolves_to_base() {
        let stack = potty_stack();
        let def = stack.resolve();
        assert_eq!(def.label, "Potty");
        assert_eq!(stack.source_of(Field::MaxMinutes), LayerSource::BuiltIn);
    }

    #[test]
    fn test_later_layer_wins_per_field() {
        let mut stack = potty_stack();
        stack
            .push(
                LayerSource::FacilityOverride,
                DefinitionPatch {
                    label: Some("Bathroom".to_string()),
                    max_minutes: Some(40),
                    ..Default::default()
                },
            )
            .push(
                LayerSource::FacilityOverride,
                DefinitionPatch {
                    max_minutes: Some(35),
                    ..Default::default()
                },
            );

        let def = stack.resolve();
        assert_eq!(def.label, "Bathroom");
        assert_eq!(def.max_minutes, 35);
        assert_eq!(def.warning_minutes, 20);
        assert_eq!(def.color, "amber");
        assert_eq!(stack.source_of(Field::Label), LayerSource::FacilityOverride);
        assert_eq!(stack.source_of(Field::Color), LayerSource::BuiltIn);
    }

    #[test]
    fn test_same_layer_twice_is_idempotent() {
        let patch = DefinitionPatch {
            color: Some("purple".to_string()),
            warning_minutes: Some(10),
            ..Default::default()
        };

        let mut once = potty_stack();
        once.push(LayerSource::FacilityOverride, patch.clone());
        let mut twice = potty_stack();
        twice
            .push(LayerSource::FacilityOverride, patch.clone())
            .push(LayerSource::FacilityOverride, patch);

        assert_eq!(once.resolve(), twice.resolve());
    }

    #[test]
    fn test_empty_patch() {
        assert!(DefinitionPatch::default().is_empty());
        for field in Field::ALL {
            assert!(!DefinitionPatch::default().sets(field));
        }
    }
}
