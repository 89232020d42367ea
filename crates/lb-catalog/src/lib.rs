//! lb-catalog: control/output variable definition files and the variable catalog.

pub mod controls;
pub mod outputs;
pub mod schema;
pub mod validate;

pub use controls::{ControlDefinitions, parse_controls};
pub use outputs::{OutputDefinitions, parse_outputs};
pub use schema::{KlystronDef, MagnetDef, OutputSnapshot};
pub use validate::{ValidationError, validate_catalog};

use lb_core::{NameMapping, Variable};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid record {index} in '{family}': {message}")]
    InvalidRecord {
        family: String,
        index: usize,
        message: String,
    },

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error in {context}: {source}")]
    Yaml {
        context: String,
        source: serde_yaml::Error,
    },
}

/// Every variable the model supports plus the control name mapping.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub controls: BTreeMap<String, Variable>,
    pub outputs: BTreeMap<String, Variable>,
    pub mapping: NameMapping,
    /// Engine attribute keys that must be listed to refresh the outputs.
    pub output_attributes: BTreeSet<String>,
}

impl Catalog {
    pub fn from_parts(
        controls: ControlDefinitions,
        outputs: OutputDefinitions,
    ) -> CatalogResult<Self> {
        let catalog = Self {
            controls: controls.variables,
            outputs: outputs.variables,
            mapping: controls.mapping,
            output_attributes: outputs.attributes,
        };
        validate_catalog(&catalog)?;
        Ok(catalog)
    }

    pub fn load(control_file: &Path, output_file: &Path) -> CatalogResult<Self> {
        load_catalog(control_file, output_file)
    }

    pub fn from_yaml_strs(control_yaml: &str, output_yaml: &str) -> CatalogResult<Self> {
        Self::from_parts(parse_controls(control_yaml)?, parse_outputs(output_yaml)?)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.controls.get(name).or_else(|| self.outputs.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.controls.len() + self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Controls and outputs in one map.
    pub fn supported_variables(&self) -> BTreeMap<String, Variable> {
        self.controls
            .iter()
            .chain(&self.outputs)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn read_file(path: &Path) -> CatalogResult<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_catalog(control_file: &Path, output_file: &Path) -> CatalogResult<Catalog> {
    let controls = parse_controls(&read_file(control_file)?)?;
    let outputs = parse_outputs(&read_file(output_file)?)?;
    let catalog = Catalog::from_parts(controls, outputs)?;
    tracing::info!(
        controls = catalog.controls.len(),
        outputs = catalog.outputs.len(),
        "loaded variable catalog"
    );
    Ok(catalog)
}

/// Write an output definition file (element -> attribute -> value).
pub fn save_output_file(path: &Path, snapshot: &OutputSnapshot) -> CatalogResult<()> {
    let content = serde_yaml::to_string(snapshot).map_err(|source| CatalogError::Yaml {
        context: format!("output snapshot for {}", path.display()),
        source,
    })?;
    std::fs::write(path, content).map_err(|source| CatalogError::Write {
        path: path.to_path_buf(),
        source,
    })
}
