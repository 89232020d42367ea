//! SLAC facility transformer.
//!
//! Quadrupole setpoints are integrated strengths in kG; the lattice stores
//! `b1_gradient` in T/m, so conversions need the element length. RF
//! stations are read back through `show lat`, since `in_use` is not a
//! general element attribute.

use crate::error::{ModelError, ModelResult};
use crate::rf::StatusOverride;
use crate::transformer::{Facility, Resolved, StationStatus, Transformer, resolve_rf_first};
use lb_catalog::controls::{RF_AMPLITUDE_ATTRIBUTE, RF_IN_USE_ATTRIBUTE, RF_PHASE_ATTRIBUTE};
use lb_core::{NameMapping, TargetKind, parse_engine_number};
use lb_engine::parse::parse_show_lat_row;
use lb_engine::{Engine, EngineError, set_element, show_lattice_attributes};
use tracing::debug;

/// Tesla-metre to kilogauss-metre.
pub const TESLA_TO_KILOGAUSS: f64 = 10.0;

const GRADIENT_ATTRIBUTE: &str = "b1_gradient";
const LENGTH_ATTRIBUTE: &str = "L";
const STATION_READBACK: [&str; 3] = [
    RF_AMPLITUDE_ATTRIBUTE,
    RF_PHASE_ATTRIBUTE,
    RF_IN_USE_ATTRIBUTE,
];

/// Integrated strength (kG) from gradient (T/m) and length (m).
pub fn bdes_from_gradient(b1_gradient: f64, length: f64) -> f64 {
    b1_gradient * length * TESLA_TO_KILOGAUSS
}

/// Gradient (T/m) from integrated strength (kG); `None` for zero length.
pub fn gradient_from_bdes(bdes: f64, length: f64) -> Option<f64> {
    if length == 0.0 {
        None
    } else {
        Some(bdes / (length * TESLA_TO_KILOGAUSS))
    }
}

pub struct SlacTransformer {
    mapping: NameMapping,
    status_override: Option<StatusOverride>,
}

impl SlacTransformer {
    pub fn new(mapping: NameMapping, status_override: Option<StatusOverride>) -> Self {
        Self {
            mapping,
            status_override,
        }
    }

    fn read_station(
        &self,
        engine: &mut dyn Engine,
        element: &str,
        attribute: &str,
    ) -> ModelResult<f64> {
        let command = show_lattice_attributes(element, &STATION_READBACK);
        let lines = engine.cmd(&command)?;
        let columns = parse_show_lat_row(&command, &lines, STATION_READBACK.len())?;
        let index = STATION_READBACK
            .iter()
            .position(|a| a.eq_ignore_ascii_case(attribute))
            .ok_or_else(|| EngineError::MissingAttribute {
                element: element.to_string(),
                attribute: attribute.to_string(),
            })?;
        let token = &columns[index];
        parse_engine_number(token).ok_or_else(|| {
            EngineError::Parse {
                command,
                detail: format!("{attribute} = {token}"),
            }
            .into()
        })
    }

    fn magnet_command(&self, engine: &mut dyn Engine, r: &Resolved<'_>) -> ModelResult<String> {
        let target = r.target;
        if !target.attribute.eq_ignore_ascii_case(GRADIENT_ATTRIBUTE) {
            return Ok(set_element(&target.element, &target.attribute, r.value));
        }
        let length = engine
            .ele_gen_attribs(&target.element)?
            .scalar(LENGTH_ATTRIBUTE)?;
        let gradient = gradient_from_bdes(r.value, length).ok_or_else(|| ModelError::Conversion {
            name: r.name.to_string(),
            reason: format!("element {} has zero length", target.element),
        })?;
        Ok(set_element(&target.element, &target.attribute, gradient))
    }
}

impl Transformer for SlacTransformer {
    fn facility(&self) -> Facility {
        Facility::Slac
    }

    fn mapping(&self) -> &NameMapping {
        &self.mapping
    }

    fn get_property(&self, engine: &mut dyn Engine, control_name: &str) -> ModelResult<f64> {
        let target = self.resolve(control_name)?;
        if target.kind == TargetKind::RfStation {
            return self.read_station(engine, &target.element, &target.attribute);
        }
        let attrs = engine.ele_gen_attribs(&target.element)?;
        if target.attribute.eq_ignore_ascii_case(GRADIENT_ATTRIBUTE) {
            let gradient = attrs.scalar(GRADIENT_ATTRIBUTE)?;
            let length = attrs.scalar(LENGTH_ATTRIBUTE)?;
            return Ok(bdes_from_gradient(gradient, length));
        }
        Ok(attrs.scalar(&target.attribute)?)
    }

    fn get_commands(
        &self,
        engine: &mut dyn Engine,
        values: &[(String, f64)],
        beam_path: &str,
        station_status: &StationStatus,
    ) -> ModelResult<Vec<String>> {
        let (rf, magnets) = resolve_rf_first(&self.mapping, values)?;

        let mut rf_commands: Vec<String> = rf
            .iter()
            .map(|r| set_element(&r.target.element, &r.target.attribute, r.value))
            .collect();
        if let Some(policy) = &self.status_override
            && policy.applies(beam_path)
        {
            rf_commands = policy.rewrite(rf_commands, station_status)?;
        }

        let mut commands = rf_commands;
        for r in &magnets {
            commands.push(self.magnet_command(engine, r)?);
        }
        debug!(
            rf = rf.len(),
            magnets = magnets.len(),
            %beam_path,
            "built engine commands"
        );
        Ok(commands)
    }
}
