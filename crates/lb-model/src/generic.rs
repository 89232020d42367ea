//! Transformer for lattices whose control points use engine-native units.

use crate::error::ModelResult;
use crate::transformer::{Facility, StationStatus, Transformer, resolve_rf_first};
use lb_core::NameMapping;
use lb_engine::{Engine, set_element};

pub struct GenericTransformer {
    mapping: NameMapping,
}

impl GenericTransformer {
    pub fn new(mapping: NameMapping) -> Self {
        Self { mapping }
    }
}

impl Transformer for GenericTransformer {
    fn facility(&self) -> Facility {
        Facility::Generic
    }

    fn mapping(&self) -> &NameMapping {
        &self.mapping
    }

    fn get_property(&self, engine: &mut dyn Engine, control_name: &str) -> ModelResult<f64> {
        let target = self.resolve(control_name)?;
        let attrs = engine.ele_gen_attribs(&target.element)?;
        Ok(attrs.scalar(&target.attribute)?)
    }

    fn get_commands(
        &self,
        _engine: &mut dyn Engine,
        values: &[(String, f64)],
        _beam_path: &str,
        _station_status: &StationStatus,
    ) -> ModelResult<Vec<String>> {
        let (rf, magnets) = resolve_rf_first(&self.mapping, values)?;
        Ok(rf
            .iter()
            .chain(&magnets)
            .map(|r| set_element(&r.target.element, &r.target.attribute, r.value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_core::Target;
    use lb_engine::MockEngine;

    #[test]
    fn raw_values_both_ways() {
        let mapping: NameMapping = [("QUAD:X".to_string(), Target::magnet("Q1", "b1_gradient"))]
            .into_iter()
            .collect();
        let t = GenericTransformer::new(mapping);
        let mut engine = MockEngine::builder().element("Q1", 0.2, 3.0).build();

        assert_eq!(t.get_property(&mut engine, "QUAD:X").unwrap(), 3.0);
        let cmds = t
            .get_commands(&mut engine, &[("QUAD:X".to_string(), 1.5)], "any", &StationStatus::new())
            .unwrap();
        assert_eq!(cmds, ["set ele Q1 b1_gradient = 1.5"]);
    }
}
