//! Read-only output variables from the output definition file.

use crate::schema::OutputFile;
use crate::validate::ValidationError;
use crate::{CatalogError, CatalogResult};
use lb_core::{Variable, output_name, tracked_attribute};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct OutputDefinitions {
    pub variables: BTreeMap<String, Variable>,
    /// Canonical engine keys referenced by at least one element.
    pub attributes: BTreeSet<String>,
}

pub fn parse_outputs(content: &str) -> CatalogResult<OutputDefinitions> {
    let file: OutputFile = serde_yaml::from_str(content).map_err(|source| CatalogError::Yaml {
        context: "output file".to_string(),
        source,
    })?;

    let mut defs = OutputDefinitions::default();
    // composed name -> (element, attribute) that produced it
    let mut origin: BTreeMap<String, (String, String)> = BTreeMap::new();

    for (element, attributes) in &file {
        let Some(attributes) = attributes else {
            continue;
        };
        for key in attributes.keys() {
            let tracked = tracked_attribute(key).ok_or_else(|| ValidationError::UnknownUnit {
                element: element.clone(),
                attribute: key.clone(),
            })?;

            let name = output_name(element, tracked.key);
            if let Some((prev_element, prev_key)) = origin.get(&name) {
                return Err(ValidationError::DuplicateName {
                    name,
                    context: format!(
                        "outputs '{prev_element}'/'{prev_key}' and '{element}'/'{key}'"
                    ),
                }
                .into());
            }
            origin.insert(name.clone(), (element.clone(), key.clone()));
            defs.attributes.insert(tracked.key.to_string());
            defs.variables
                .insert(name.clone(), Variable::output(name, tracked.unit));
        }
    }

    debug!(
        outputs = defs.variables.len(),
        elements = file.len(),
        "parsed output definitions"
    );
    Ok(defs)
}
