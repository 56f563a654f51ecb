//! Write-boundary validation for overrides and custom types

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

use super::layers::DefinitionPatch;
use super::types::{ActivityTypeDefinition, NewCustomActivityType};

pub const MAX_CODE_LEN: usize = 50;

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("activity code pattern is valid"));

/// Check a user-chosen activity code: lowercase letters, digits, underscores
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    if code.len() > MAX_CODE_LEN || !CODE_PATTERN.is_match(code) {
        return Err(ValidationError::InvalidCode(code.to_string()));
    }
    Ok(())
}

fn validate_positive(field: &str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::InvalidMinutes {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

pub fn validate_thresholds(warning: i64, max: i64) -> Result<(), ValidationError> {
    validate_positive("warning_minutes", warning)?;
    validate_positive("max_minutes", max)?;
    if warning >= max {
        return Err(ValidationError::InvertedThresholds { warning, max });
    }
    Ok(())
}

pub fn validate_new_custom_type(input: &NewCustomActivityType) -> Result<(), ValidationError> {
    validate_code(&input.code)?;
    if input.label.trim().is_empty() {
        return Err(ValidationError::MissingField("label".to_string()));
    }
    validate_thresholds(input.warning_minutes, input.max_minutes)
}

/// Validate an override patch against the definition it would be layered on.
///
/// Individual minute values must be positive, and the thresholds that would
/// result from the merge must stay ordered.
pub fn validate_patch(
    patch: &DefinitionPatch,
    current: &ActivityTypeDefinition,
) -> Result<(), ValidationError> {
    if let Some(max) = patch.max_minutes {
        validate_positive("max_minutes", max)?;
    }
    if let Some(warning) = patch.warning_minutes {
        validate_positive("warning_minutes", warning)?;
    }
    if let Some(label) = &patch.label {
        if label.trim().is_empty() {
            return Err(ValidationError::MissingField("label".to_string()));
        }
    }

    let mut merged = current.clone();
    patch.apply_to(&mut merged);
    if merged.warning_minutes >= merged.max_minutes {
        return Err(ValidationError::InvertedThresholds {
            warning: merged.warning_minutes,
            max: merged.max_minutes,
        });
    }
    Ok(())
}
