//! Control-system <-> lattice name and unit translation.
//!
//! A [`Transformer`] is picked per accelerator facility when the model is
//! built. Each facility owns its unit conversions and special cases; adding
//! a facility means adding an implementation, not branching in a shared one.

use crate::error::{ModelError, ModelResult};
use crate::generic::GenericTransformer;
use crate::rf::StatusOverride;
use crate::slac::SlacTransformer;
use lb_core::{NameMapping, Target, TargetKind};
use lb_engine::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Externally supplied per-station status flags, keyed by point name.
pub type StationStatus = BTreeMap<String, f64>;

pub trait Transformer {
    fn facility(&self) -> Facility;

    fn mapping(&self) -> &NameMapping;

    fn resolve(&self, control_name: &str) -> ModelResult<&Target> {
        self.mapping()
            .resolve(control_name)
            .ok_or_else(|| ModelError::UnmappedName {
                name: control_name.to_string(),
            })
    }

    /// Current value of a control point, in control-system units.
    ///
    /// Only issues read-only engine queries.
    fn get_property(&self, engine: &mut dyn Engine, control_name: &str) -> ModelResult<f64>;

    /// Engine commands applying `values` (control-system units).
    ///
    /// RF station commands come first, then magnet commands; within each
    /// group the input order is kept.
    fn get_commands(
        &self,
        engine: &mut dyn Engine,
        values: &[(String, f64)],
        beam_path: &str,
        station_status: &StationStatus,
    ) -> ModelResult<Vec<String>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facility {
    /// SLAC copper and superconducting linacs.
    Slac,
    /// Engine-native units, no special cases.
    Generic,
}

impl Facility {
    pub fn transformer(
        self,
        mapping: NameMapping,
        status_override: Option<StatusOverride>,
    ) -> Box<dyn Transformer> {
        match self {
            Facility::Slac => Box::new(SlacTransformer::new(mapping, status_override)),
            Facility::Generic => {
                if status_override.is_some() {
                    tracing::warn!("station status override is ignored for the generic facility");
                }
                Box::new(GenericTransformer::new(mapping))
            }
        }
    }
}

/// A resolved input value.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Resolved<'a> {
    pub name: &'a str,
    pub target: &'a Target,
    pub value: f64,
}

/// Resolve every input and split into (RF stations, magnets), keeping order.
pub(crate) fn resolve_rf_first<'a>(
    mapping: &'a NameMapping,
    values: &'a [(String, f64)],
) -> ModelResult<(Vec<Resolved<'a>>, Vec<Resolved<'a>>)> {
    let mut rf = Vec::new();
    let mut magnets = Vec::new();
    for (name, value) in values {
        let target = mapping.resolve(name).ok_or_else(|| ModelError::UnmappedName {
            name: name.clone(),
        })?;
        let resolved = Resolved {
            name: name.as_str(),
            target,
            value: *value,
        };
        match target.kind {
            TargetKind::RfStation => rf.push(resolved),
            TargetKind::Magnet => magnets.push(resolved),
        }
    }
    Ok((rf, magnets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facility_names() {
        let f: Facility = serde_yaml::from_str("slac").unwrap();
        assert_eq!(f, Facility::Slac);
        let f: Facility = serde_yaml::from_str("generic").unwrap();
        assert_eq!(f, Facility::Generic);
        assert!(serde_yaml::from_str::<Facility>("fermilab").is_err());
    }

    #[test]
    fn rf_inputs_sorted_ahead_of_magnets() {
        let mapping: NameMapping = [
            ("Q".to_string(), Target::magnet("Q1", "k1")),
            ("A".to_string(), Target::rf_station("K21_1", "ENLD_MEV")),
        ]
        .into_iter()
        .collect();
        let values = vec![("Q".to_string(), 1.0), ("A".to_string(), 2.0)];
        let (rf, magnets) = resolve_rf_first(&mapping, &values).unwrap();
        assert_eq!(rf[0].name, "A");
        assert_eq!(magnets[0].name, "Q");

        let bad = vec![("NOPE".to_string(), 1.0)];
        assert!(matches!(
            resolve_rf_first(&mapping, &bad),
            Err(ModelError::UnmappedName { .. })
        ));
    }

    #[test]
    fn generic_facility_transformer() {
        let t = Facility::Generic.transformer(NameMapping::new(), None);
        assert_eq!(t.facility(), Facility::Generic);
        assert!(t.resolve("X").unwrap_err().is_lookup());
    }
}
