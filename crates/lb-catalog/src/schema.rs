//! Control and output definition file schemas.
//!
//! The control file is a YAML mapping from device family to a list of
//! records. Magnet families (`quad`, `bend`, ...) hold one record per
//! device; RF station groups are keyed by the station name (`K21_1`) and
//! hold a single record with the station's point names. Datamap dumps carry
//! extra columns, so unknown keys are ignored everywhere.

use lb_core::Value;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Family key prefix that marks an RF station group.
pub const RF_STATION_PREFIX: char = 'K';

/// Family key for superconducting cavities, which are not mapped.
pub const CAVITIES_FAMILY: &str = "cavities";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    Magnet,
    RfStation,
    Cavities,
}

pub fn family_kind(key: &str) -> FamilyKind {
    if key == CAVITIES_FAMILY {
        FamilyKind::Cavities
    } else if key.starts_with(RF_STATION_PREFIX) {
        FamilyKind::RfStation
    } else {
        FamilyKind::Magnet
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MagnetDef {
    pub pvname: String,
    pub bmad_name: String,
    pub bmad_attribute: String,
    #[serde(default = "default_magnet_unit")]
    pub bmad_unit: String,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
}

fn default_magnet_unit() -> String {
    "kG".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KlystronDef {
    /// Lattice element name; defaults to the group key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmad_name: Option<String>,
    #[serde(alias = "enld_pvname")]
    pub ampl_des_pvname: String,
    #[serde(alias = "phase_pvname")]
    pub phase_des_pvname: String,
    /// Empty when the station is not used on this beam path.
    #[serde(default)]
    pub accelerate_pvname: String,
}

impl KlystronDef {
    pub fn is_enabled(&self) -> bool {
        !self.accelerate_pvname.trim().is_empty()
    }

    pub fn element_name<'a>(&'a self, group: &'a str) -> &'a str {
        self.bmad_name.as_deref().unwrap_or(group)
    }
}

/// Raw control file: family -> untyped records, typed per family on load.
pub type ControlFile = BTreeMap<String, serde_yaml::Value>;

/// Output definition file as read: element -> attribute key -> ignored value.
pub type OutputFile = BTreeMap<String, Option<BTreeMap<String, IgnoredAny>>>;

/// Output definition file as written: element -> attribute key -> value.
pub type OutputSnapshot = BTreeMap<String, BTreeMap<String, Value>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_classification() {
        assert_eq!(family_kind("quad"), FamilyKind::Magnet);
        assert_eq!(family_kind("bend"), FamilyKind::Magnet);
        assert_eq!(family_kind("K21_1"), FamilyKind::RfStation);
        assert_eq!(family_kind("cavities"), FamilyKind::Cavities);
    }

    #[test]
    fn klystron_defaults() {
        let def: KlystronDef = serde_yaml::from_str(
            "ampl_des_pvname: KLYS:LI21:11:ADES\nphase_des_pvname: KLYS:LI21:11:PDES\n",
        )
        .unwrap();
        assert!(!def.is_enabled());
        assert_eq!(def.element_name("K21_1"), "K21_1");
    }

    #[test]
    fn magnet_extra_columns_ignored() {
        let def: MagnetDef = serde_yaml::from_str(
            "pvname: QUAD:IN20:511:BCTRL\nbmad_name: Q1\nbmad_attribute: b1_gradient\n\
             bmad_factor: -1.0\nmin_value: -1.0\nmax_value: null\n",
        )
        .unwrap();
        assert_eq!(def.bmad_unit, "kG");
        assert_eq!(def.min_value, Some(-1.0));
        assert_eq!(def.max_value, None);
    }
}
