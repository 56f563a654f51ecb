//! Built-in activity type definitions and utilities

use super::types::ActivityTypeDefinition;

/// Built-in activity type with its shipped defaults
#[derive(Debug, Clone, Copy)]
pub struct BuiltInActivity {
    pub code: &'static str,
    pub label: &'static str,
    pub icon_name: &'static str,
    pub color: &'static str,
    pub warning_minutes: i64,
    pub max_minutes: i64,
    pub sort_order: i32,
    pub show_in_quick_log: bool,
}

impl BuiltInActivity {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        code: &'static str,
        label: &'static str,
        icon_name: &'static str,
        color: &'static str,
        warning_minutes: i64,
        max_minutes: i64,
        sort_order: i32,
        show_in_quick_log: bool,
    ) -> Self {
        Self {
            code,
            label,
            icon_name,
            color,
            warning_minutes,
            max_minutes,
            sort_order,
            show_in_quick_log,
        }
    }

    pub fn to_definition(&self) -> ActivityTypeDefinition {
        ActivityTypeDefinition {
            id: None,
            code: self.code.to_string(),
            label: self.label.to_string(),
            icon_name: self.icon_name.to_string(),
            color: self.color.to_string(),
            max_minutes: self.max_minutes,
            warning_minutes: self.warning_minutes,
            sort_order: self.sort_order,
            show_in_quick_log: self.show_in_quick_log,
            is_custom: false,
            category: None,
            is_active: true,
        }
    }
}

/// Custom types are numbered from here so they list after the built-ins
pub const CUSTOM_SORT_ORDER_START: i32 = 100;

pub const BUILT_IN_ACTIVITIES: [BuiltInActivity; 10] = [
    BuiltInActivity::new("kennel", "Kennel", "home", "slate", 180, 240, 1, true),
    BuiltInActivity::new("potty", "Potty", "droplets", "amber", 20, 30, 2, true),
    BuiltInActivity::new("training", "Training", "graduation-cap", "blue", 45, 60, 3, true),
    BuiltInActivity::new("play", "Play", "circle-dot", "green", 45, 60, 4, true),
    BuiltInActivity::new("group_play", "Group Play", "users", "emerald", 60, 90, 5, true),
    BuiltInActivity::new("feeding", "Feeding", "utensils", "orange", 20, 30, 6, true),
    BuiltInActivity::new("rest", "Rest", "moon", "indigo", 90, 120, 7, true),
    BuiltInActivity::new("walk", "Walk", "footprints", "teal", 30, 45, 8, true),
    BuiltInActivity::new("grooming", "Grooming", "scissors", "pink", 45, 60, 9, false),
    BuiltInActivity::new("medical", "Medical", "stethoscope", "red", 30, 45, 10, false),
];

/// All built-in types as definitions, in table order
pub fn built_in_definitions() -> Vec<ActivityTypeDefinition> {
    BUILT_IN_ACTIVITIES
        .iter()
        .map(BuiltInActivity::to_definition)
        .collect()
}

pub fn find_built_in(code: &str) -> Option<&'static BuiltInActivity> {
    BUILT_IN_ACTIVITIES.iter().find(|a| a.code == code)
}

pub fn is_built_in(code: &str) -> bool {
    find_built_in(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_well_formed() {
        for activity in BUILT_IN_ACTIVITIES.iter() {
            assert!(
                activity.to_definition().has_valid_thresholds(),
                "{} has inverted thresholds",
                activity.code
            );
            assert!(activity.sort_order < CUSTOM_SORT_ORDER_START);
        }
    }

    #[test]
    fn test_sort_orders_are_one_to_ten() {
        let orders: Vec<i32> = BUILT_IN_ACTIVITIES.iter().map(|a| a.sort_order).collect();
        assert_eq!(orders, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_lookup() {
        let potty = find_built_in("potty").unwrap();
        assert_eq!((potty.warning_minutes, potty.max_minutes), (20, 30));
        let kennel = find_built_in("kennel").unwrap();
        assert_eq!((kennel.warning_minutes, kennel.max_minutes), (180, 240));
        assert!(!is_built_in("fetch_time"));
    }
}

// Made with Bob
