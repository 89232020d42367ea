//! Catalog validation logic.

use crate::Catalog;
use crate::schema::{KlystronDef, MagnetDef};
use lb_core::OUTPUT_DELIMITER;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate variable name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Unknown unit for attribute '{attribute}' of element '{element}'")]
    UnknownUnit { element: String, attribute: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

fn require_name(field: String, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field,
            value: value.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

pub fn validate_magnet(def: &MagnetDef, family: &str, index: usize) -> Result<(), ValidationError> {
    require_name(format!("{family}[{index}] pvname"), &def.pvname)?;
    require_name(format!("{family}[{index}] bmad_name"), &def.bmad_name)?;
    require_name(format!("{family}[{index}] bmad_attribute"), &def.bmad_attribute)?;

    for (bound, value) in [("min_value", def.min_value), ("max_value", def.max_value)] {
        if let Some(v) = value
            && !v.is_finite()
        {
            return Err(ValidationError::InvalidValue {
                field: format!("'{}' {bound}", def.pvname),
                value: v.to_string(),
                reason: "must be finite".to_string(),
            });
        }
    }

    if let (Some(min), Some(max)) = (def.min_value, def.max_value)
        && min > max
    {
        return Err(ValidationError::InvalidValue {
            field: format!("'{}' value range", def.pvname),
            value: format!("[{min}, {max}]"),
            reason: "min_value must not exceed max_value".to_string(),
        });
    }

    Ok(())
}

pub fn validate_klystron(def: &KlystronDef, group: &str) -> Result<(), ValidationError> {
    require_name(format!("{group} ampl_des_pvname"), &def.ampl_des_pvname)?;
    require_name(format!("{group} phase_des_pvname"), &def.phase_des_pvname)?;
    require_name(format!("{group} element"), def.element_name(group))?;
    Ok(())
}

/// Cross-checks that need both halves of the catalog.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    for name in catalog.outputs.keys() {
        if catalog.controls.contains_key(name) {
            return Err(ValidationError::DuplicateName {
                name: name.clone(),
                context: "control and output variables".to_string(),
            });
        }
        if !name.ends_with(OUTPUT_DELIMITER) {
            return Err(ValidationError::InvalidValue {
                field: "output name".to_string(),
                value: name.clone(),
                reason: format!("must end with '{OUTPUT_DELIMITER}'"),
            });
        }
    }

    for (name, variable) in &catalog.controls {
        if variable.read_only {
            return Err(ValidationError::InvalidValue {
                field: format!("control '{name}'"),
                value: "read_only".to_string(),
                reason: "control variables must be writable".to_string(),
            });
        }
        if !catalog.mapping.contains(name) {
            return Err(ValidationError::InvalidValue {
                field: format!("control '{name}'"),
                value: name.clone(),
                reason: "has no lattice mapping".to_string(),
            });
        }
    }

    Ok(())
}
