//! Activity types and timers
//!
//! `catalog` resolves what a facility offers, `timer` derives the live state
//! of a running activity from its start time and definition.

pub mod catalog;
pub mod defaults;
pub mod layers;
pub mod timer;
pub mod types;
pub mod validation;

pub use catalog::{ActivityCatalog, FacilityCustomizations};
pub use layers::{DefinitionPatch, LayerSource, LayerStack};
pub use timer::TimerSnapshot;
pub use types::{
    ActivityLog, ActivityOverride, ActivityTypeDefinition, CustomActivityType, NewActivity,
    NewCustomActivityType, TimerStatus,
};
