//! Control variable definitions from the control file.

use crate::schema::{ControlFile, FamilyKind, KlystronDef, MagnetDef, family_kind};
use crate::validate::{ValidationError, validate_klystron, validate_magnet};
use crate::{CatalogError, CatalogResult};
use lb_core::{NameMapping, Target, Variable};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// RF station amplitude attribute and limits (MeV).
pub const RF_AMPLITUDE_ATTRIBUTE: &str = "ENLD_MEV";
pub const RF_AMPLITUDE_RANGE: (f64, f64) = (0.0, 500.0);
/// RF station phase attribute and limits (degrees).
pub const RF_PHASE_ATTRIBUTE: &str = "PHASE_DEG";
pub const RF_PHASE_RANGE: (f64, f64) = (0.0, 360.0);
/// RF station in-use flag attribute.
pub const RF_IN_USE_ATTRIBUTE: &str = "in_use";

/// Writable variables and their lattice mapping.
#[derive(Debug, Clone, Default)]
pub struct ControlDefinitions {
    pub variables: BTreeMap<String, Variable>,
    pub mapping: NameMapping,
}

impl ControlDefinitions {
    fn add(
        &mut self,
        variable: Variable,
        target: Target,
        family: &str,
    ) -> Result<(), ValidationError> {
        if self.variables.contains_key(&variable.name) {
            return Err(ValidationError::DuplicateName {
                name: variable.name,
                context: format!("control family '{family}'"),
            });
        }
        self.mapping.insert(variable.name.clone(), target);
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }
}

pub fn parse_controls(content: &str) -> CatalogResult<ControlDefinitions> {
    let file: ControlFile = serde_yaml::from_str(content).map_err(|source| CatalogError::Yaml {
        context: "control file".to_string(),
        source,
    })?;

    let mut defs = ControlDefinitions::default();
    for (family, records) in &file {
        match family_kind(family) {
            FamilyKind::Magnet => {
                for (index, record) in records_of(records).into_iter().enumerate() {
                    let def: MagnetDef = typed_record(record, family, index)?;
                    validate_magnet(&def, family, index)?;
                    add_magnet(&mut defs, &def, family)?;
                }
            }
            FamilyKind::RfStation => {
                for (index, record) in records_of(records).into_iter().enumerate() {
                    let def: KlystronDef = typed_record(record, family, index)?;
                    if !def.is_enabled() {
                        debug!(group = %family, "skipping RF station without accelerate point");
                        continue;
                    }
                    validate_klystron(&def, family)?;
                    add_klystron(&mut defs, &def, family)?;
                }
            }
            FamilyKind::Cavities => {
                warn!(family = %family, "superconducting cavities are not supported; skipping");
            }
        }
    }

    debug!(
        controls = defs.variables.len(),
        families = file.len(),
        "parsed control definitions"
    );
    Ok(defs)
}

fn records_of(value: &serde_yaml::Value) -> Vec<&serde_yaml::Value> {
    match value {
        serde_yaml::Value::Sequence(items) => items.iter().collect(),
        serde_yaml::Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn typed_record<T: serde::de::DeserializeOwned>(
    record: &serde_yaml::Value,
    family: &str,
    index: usize,
) -> CatalogResult<T> {
    serde_yaml::from_value(record.clone()).map_err(|e| CatalogError::InvalidRecord {
        family: family.to_string(),
        index,
        message: e.to_string(),
    })
}

fn add_magnet(
    defs: &mut ControlDefinitions,
    def: &MagnetDef,
    family: &str,
) -> Result<(), ValidationError> {
    let variable = Variable::control(&def.pvname, &def.bmad_unit, def.min_value, def.max_value);
    let target = Target::magnet(&def.bmad_name, &def.bmad_attribute);
    defs.add(variable, target, family)
}

fn add_klystron(
    defs: &mut ControlDefinitions,
    def: &KlystronDef,
    group: &str,
) -> Result<(), ValidationError> {
    let element = def.element_name(group);
    let (amin, amax) = RF_AMPLITUDE_RANGE;
    let (pmin, pmax) = RF_PHASE_RANGE;

    defs.add(
        Variable::control(&def.ampl_des_pvname, "MeV", Some(amin), Some(amax)),
        Target::rf_station(element, RF_AMPLITUDE_ATTRIBUTE),
        group,
    )?;
    defs.add(
        Variable::control(&def.phase_des_pvname, "deg", Some(pmin), Some(pmax)),
        Target::rf_station(element, RF_PHASE_ATTRIBUTE),
        group,
    )?;
    defs.add(
        Variable::control(&def.accelerate_pvname, "", Some(0.0), Some(1.0)),
        Target::rf_station(element, RF_IN_USE_ATTRIBUTE),
        group,
    )
}
