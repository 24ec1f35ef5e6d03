//! Configuration validation
//!
//! Rules:
//! - field ranges declared on the config structs (`validator` derive)
//! - finite-difference spans are even
//! - non-matchable type names are non-empty and unique
//! - offset tolerance window fits inside the anchor search radius

use std::collections::HashSet;

use contracts::{ContractError, SyncConfig};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a SyncConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &SyncConfig) -> Result<(), ContractError> {
    validate_ranges(config)?;
    validate_spans(config)?;
    validate_non_matchable_types(config)?;
    validate_offset_windows(config)?;
    Ok(())
}

/// Declared field ranges
fn validate_ranges(config: &SyncConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_error("", &errors);
        ContractError::config_validation(field, message)
    })
}

/// Walk nested validation errors down to the first leaf.
fn first_error(prefix: &str, errors: &ValidationErrors) -> (String, String) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    return (path, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => return first_error(&path, inner),
            ValidationErrorsKind::List(items) => {
                if let Some((idx, inner)) = items.iter().next() {
                    return first_error(&format!("{path}[{idx}]"), inner);
                }
            }
        }
    }
    (prefix.to_string(), "invalid value".to_string())
}

/// Centred differences need an even span
fn validate_spans(config: &SyncConfig) -> Result<(), ContractError> {
    let kin = &config.kinematics;
    for (field, span) in [
        ("kinematics.speed_span", kin.speed_span),
        ("kinematics.acc_span", kin.acc_span),
        ("kinematics.refine_acc_span", kin.refine_acc_span),
    ] {
        if span % 2 != 0 {
            return Err(ContractError::config_validation(
                field,
                format!("span must be even, got {span}"),
            ));
        }
    }
    Ok(())
}

fn validate_non_matchable_types(config: &SyncConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, name) in config.non_matchable_types.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("non_matchable_types[{idx}]"),
                "event type name must not be empty",
            ));
        }
        if !seen.insert(name) {
            return Err(ContractError::config_validation(
                format!("non_matchable_types[{idx}]"),
                format!("duplicate event type '{name}'"),
            ));
        }
    }
    Ok(())
}

fn validate_offset_windows(config: &SyncConfig) -> Result<(), ContractError> {
    let offset = &config.offset;
    if offset.tolerance_frames >= offset.anchor_radius_frames {
        return Err(ContractError::config_validation(
            "offset.tolerance_frames",
            format!(
                "tolerance ({}) must be smaller than anchor_radius_frames ({})",
                offset.tolerance_frames, offset.anchor_radius_frames
            ),
        ));
    }
    if offset.max_score_m >= offset.missing_distance_m {
        return Err(ContractError::config_validation(
            "offset.max_score_m",
            "must be below missing_distance_m",
        ));
    }
    Ok(())
}
