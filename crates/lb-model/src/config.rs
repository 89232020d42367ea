//! Model configuration files.
//!
//! A model file names the facility, the beam path, the two variable
//! definition files and how to start the engine. Relative paths resolve
//! against the directory holding the model file.

use crate::error::{ModelError, ModelResult};
use crate::rf::StatusOverride;
use crate::state::LatticeModel;
use crate::transformer::Facility;
use lb_catalog::{Catalog, load_catalog};
use lb_engine::tao::{DEFAULT_EXECUTABLE, DEFAULT_PROMPT};
use lb_engine::{Engine, TaoOptions, TaoProcess};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default = "default_facility")]
    pub facility: Facility,
    pub beam_path: String,
    pub control_file: PathBuf,
    pub output_file: PathBuf,
    pub engine: EngineConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_override: Option<StatusOverride>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// May reference environment variables as `$VAR` or `${VAR}`.
    pub init_file: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_facility() -> Facility {
    Facility::Slac
}

fn default_executable() -> PathBuf {
    PathBuf::from(DEFAULT_EXECUTABLE)
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

/// Load, validate and resolve a model file.
pub fn load_config(path: &Path) -> ModelResult<ModelConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ModelConfig = serde_yaml::from_str(&content).map_err(|e| ModelError::Config {
        what: format!("{}: {e}", path.display()),
    })?;
    config.validate()?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    Ok(config)
}

impl ModelConfig {
    pub fn validate(&self) -> ModelResult<()> {
        for (field, value) in [
            ("name", self.name.as_str()),
            ("beam_path", self.beam_path.as_str()),
            ("engine.init_file", self.engine.init_file.as_str()),
            ("engine.prompt", self.engine.prompt.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError::Config {
                    what: format!("'{field}' must not be empty"),
                });
            }
        }
        if self.facility == Facility::Generic && self.status_override.is_some() {
            return Err(ModelError::Config {
                what: "status_override requires facility 'slac'".to_string(),
            });
        }
        Ok(())
    }

    /// Make definition file paths absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.control_file = base.join(&self.control_file);
        self.output_file = base.join(&self.output_file);
    }

    pub fn load_catalog(&self) -> ModelResult<Catalog> {
        Ok(load_catalog(&self.control_file, &self.output_file)?)
    }

    /// Engine start options with environment references expanded.
    pub fn tao_options(&self, base: &Path) -> ModelResult<TaoOptions> {
        let init_file = PathBuf::from(expand_vars(&self.engine.init_file)?);
        Ok(TaoOptions {
            executable: self.engine.executable.clone(),
            init_file: base.join(init_file),
            prompt: self.engine.prompt.clone(),
            extra_args: self.engine.extra_args.clone(),
        })
    }
}

/// Build a model over an already running engine.
pub fn build_model<E: Engine>(config: &ModelConfig, engine: E) -> ModelResult<LatticeModel<E>> {
    let catalog = config.load_catalog()?;
    let transformer = config
        .facility
        .transformer(catalog.mapping.clone(), config.status_override.clone());
    LatticeModel::new(engine, catalog, transformer, config.beam_path.clone())
}

/// Start Tao for the model file at `path` and build the model.
pub fn open_model(path: &Path) -> ModelResult<LatticeModel<TaoProcess>> {
    let config = load_config(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let options = config.tao_options(base)?;
    info!(model = %config.name, beam_path = %config.beam_path, "opening lattice model");
    let engine = TaoProcess::spawn(&options)?;
    build_model(&config, engine)
}

/// Expand `$VAR` and `${VAR}` from the process environment.
pub fn expand_vars(input: &str) -> ModelResult<String> {
    expand_vars_with(input, |name| std::env::var(name).ok())
}

pub fn expand_vars_with(
    input: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> ModelResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, tail) = if let Some(braced) = after.strip_prefix('{') {
            let end = braced.find('}').ok_or_else(|| ModelError::Config {
                what: format!("unterminated '${{' in '{input}'"),
            })?;
            (&braced[..end], &braced[end + 1..])
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], &after[end..])
        };
        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }
        let value = lookup(name).ok_or_else(|| ModelError::Config {
            what: format!("environment variable '{name}' is not set (in '{input}')"),
        })?;
        out.push_str(&value);
        rest = tail;
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "LCLS_LATTICE" => Some("/opt/lcls-lattice".to_string()),
            "MODEL" => Some("cu_hxr".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expands_both_forms() {
        let out = expand_vars_with("${LCLS_LATTICE}/bmad/models/$MODEL/tao.init", env).unwrap();
        assert_eq!(out, "/opt/lcls-lattice/bmad/models/cu_hxr/tao.init");
        assert_eq!(expand_vars_with("no vars", env).unwrap(), "no vars");
        assert_eq!(expand_vars_with("cost: $", env).unwrap(), "cost: $");
    }

    #[test]
    fn unset_variable_is_a_config_error() {
        let err = expand_vars_with("$NOT_SET/tao.init", env).unwrap_err();
        assert!(matches!(err, ModelError::Config { .. }));
        assert!(err.to_string().contains("NOT_SET"));
        assert!(expand_vars_with("${LCLS_LATTICE", env).is_err());
    }

    #[test]
    fn defaults_and_validation() {
        let yaml = "name: m\nbeam_path: sc_sxr\ncontrol_file: c.yaml\noutput_file: o.yaml\n\
                    engine:\n  init_file: tao.init\n";
        let config: ModelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.facility, Facility::Slac);
        assert_eq!(config.engine.executable, PathBuf::from("tao"));
        assert_eq!(config.engine.prompt, "Tao>");
        assert!(config.status_override.is_none());
        config.validate().unwrap();

        let mut generic = config.clone();
        generic.facility = Facility::Generic;
        generic.status_override = Some(StatusOverride::default());
        assert!(generic.validate().is_err());

        let mut unnamed = config;
        unnamed.beam_path = " ".to_string();
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn relative_paths_join_the_config_dir() {
        let yaml = "name: m\nbeam_path: cu_hxr\ncontrol_file: c.yaml\noutput_file: /abs/o.yaml\n\
                    engine:\n  init_file: lattice/tao.init\n";
        let mut config: ModelConfig = serde_yaml::from_str(yaml).unwrap();
        config.resolve_paths(Path::new("/models/cu"));
        assert_eq!(config.control_file, PathBuf::from("/models/cu/c.yaml"));
        assert_eq!(config.output_file, PathBuf::from("/abs/o.yaml"));

        let options = config.tao_options(Path::new("/models/cu")).unwrap();
        assert_eq!(options.init_file, PathBuf::from("/models/cu/lattice/tao.init"));
    }
}
