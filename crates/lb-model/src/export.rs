//! Output definitions regenerated from a live lattice.

use crate::error::ModelResult;
use lb_catalog::{OutputSnapshot, save_output_file};
use lb_core::TRACKED_ATTRIBUTES;
use lb_engine::{Engine, EngineError};
use std::path::Path;
use tracing::info;

/// Every tracked attribute of every element, grouped per element.
pub fn snapshot_outputs(engine: &mut dyn Engine) -> ModelResult<OutputSnapshot> {
    let elements: Vec<String> = engine
        .lat_list("*", "ele.name")?
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut snapshot = OutputSnapshot::new();
    for attr in TRACKED_ATTRIBUTES {
        let values = engine.lat_list("*", attr.key)?;
        if values.len() != elements.len() {
            return Err(EngineError::Shape {
                who: attr.key.to_string(),
                expected: elements.len(),
                found: values.len(),
            }
            .into());
        }
        for (element, value) in elements.iter().zip(values) {
            snapshot
                .entry(element.clone())
                .or_default()
                .insert(attr.key.to_string(), value);
        }
    }
    Ok(snapshot)
}

/// Write an output definition file covering the whole lattice.
pub fn export_output_file(engine: &mut dyn Engine, path: &Path) -> ModelResult<usize> {
    let snapshot = snapshot_outputs(engine)?;
    save_output_file(path, &snapshot)?;
    info!(elements = snapshot.len(), path = %path.display(), "exported output definitions");
    Ok(snapshot.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_core::Value;
    use lb_engine::MockEngine;

    #[test]
    fn groups_attributes_per_element() {
        let mut engine = MockEngine::builder()
            .marker("BEGINNING")
            .element("Q1", 0.1, 1.0)
            .marker("END")
            .build();
        let snapshot = snapshot_outputs(&mut engine).unwrap();

        assert_eq!(snapshot.len(), 3);
        let q1 = &snapshot["Q1"];
        assert_eq!(q1.len(), TRACKED_ATTRIBUTES.len());
        assert_eq!(q1["ele.name"], Value::Text("Q1".into()));
        assert_eq!(q1["ele.l"], Value::Scalar(0.1));
        assert!(matches!(&q1["ele.vec0"], Value::Array(v) if v.len() == 6));
    }

    #[test]
    fn engine_rejection_propagates() {
        let mut engine = MockEngine::builder().element("Q1", 0.1, 1.0).build();
        engine.reject_containing("ele.mat6");
        assert!(snapshot_outputs(&mut engine).is_err());
    }
}
