//! Read/modify-write state cache over one owned engine.

use crate::error::{ModelError, ModelResult};
use crate::transformer::{StationStatus, Transformer};
use lb_catalog::Catalog;
use lb_core::{Value, Variable, output_name};
use lb_engine::{Engine, EngineError, evaluate};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Cached variable values keyed by variable name.
pub type State = BTreeMap<String, Value>;

const ELEMENT_NAMES: &str = "ele.name";

/// Lattice model state cache.
///
/// Owns the engine for its whole lifetime. Reads are served from the cache;
/// every successful write re-reads the full state from the engine, and the
/// cache is only replaced once that read succeeds.
pub struct LatticeModel<E: Engine> {
    engine: E,
    catalog: Catalog,
    transformer: Box<dyn Transformer>,
    beam_path: String,
    station_status: StationStatus,
    state: State,
    initial: State,
}

impl<E: Engine> LatticeModel<E> {
    pub fn new(
        mut engine: E,
        catalog: Catalog,
        transformer: Box<dyn Transformer>,
        beam_path: impl Into<String>,
    ) -> ModelResult<Self> {
        let beam_path = beam_path.into();
        let state = read_state(&mut engine, &catalog, transformer.as_ref())?;
        info!(
            facility = ?transformer.facility(),
            %beam_path,
            variables = state.len(),
            "lattice model initialized"
        );
        Ok(Self {
            engine,
            catalog,
            transformer,
            beam_path,
            station_status: StationStatus::new(),
            initial: state.clone(),
            state,
        })
    }

    pub fn supported_variables(&self) -> BTreeMap<String, Variable> {
        self.catalog.supported_variables()
    }

    pub fn control_variables(&self) -> &BTreeMap<String, Variable> {
        &self.catalog.controls
    }

    pub fn output_variables(&self) -> &BTreeMap<String, Variable> {
        &self.catalog.outputs
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn transformer(&self) -> &dyn Transformer {
        self.transformer.as_ref()
    }

    pub fn beam_path(&self) -> &str {
        &self.beam_path
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Current cache contents.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// State captured at construction.
    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    /// Replace the station status flags used by the status override policy.
    pub fn set_station_status(&mut self, flags: StationStatus) {
        self.station_status = flags;
    }

    /// Cached values for `names`. Never touches the engine.
    pub fn get<S: AsRef<str>>(&self, names: &[S]) -> ModelResult<BTreeMap<String, Value>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.cached(name).map(|v| (name.to_string(), v.clone()))
            })
            .collect()
    }

    pub fn get_scalar(&self, name: &str) -> ModelResult<f64> {
        self.cached(name)?
            .scalar(name)
            .map_err(|e| ModelError::Conversion {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    fn cached(&self, name: &str) -> ModelResult<&Value> {
        if !self.catalog.contains(name) {
            return Err(ModelError::UnknownVariable {
                name: name.to_string(),
            });
        }
        self.state.get(name).ok_or_else(|| ModelError::Uninitialized {
            name: name.to_string(),
        })
    }

    /// Write control values, recompute once, and refresh the cache.
    pub fn set<I, S>(&mut self, values: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let values = self.validated(values)?;
        if values.is_empty() {
            debug!("set called without values");
            return Ok(());
        }
        self.apply(&values)
    }

    /// Engine commands `set` would evaluate for `values`, without running them.
    pub fn commands<I, S>(&mut self, values: I) -> ModelResult<Vec<String>>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let values = self.validated(values)?;
        self.transformer
            .get_commands(&mut self.engine, &values, &self.beam_path, &self.station_status)
    }

    /// Restore the control values captured at construction.
    ///
    /// Snapshot values came from the engine, so range checks are skipped.
    pub fn reset(&mut self) -> ModelResult<()> {
        let values: Vec<(String, f64)> = self
            .catalog
            .controls
            .keys()
            .filter_map(|name| {
                let value = self.initial.get(name)?.as_scalar()?;
                Some((name.clone(), value))
            })
            .collect();
        info!(controls = values.len(), "resetting lattice model");
        self.apply(&values)
    }

    /// Re-read the full state from the engine.
    pub fn refresh(&mut self) -> ModelResult<()> {
        self.state = read_state(&mut self.engine, &self.catalog, self.transformer.as_ref())?;
        Ok(())
    }

    fn validated<I, S>(&self, values: I) -> ModelResult<Vec<(String, f64)>>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        values
            .into_iter()
            .map(|(name, value)| {
                let name = name.into();
                self.check_writable(&name, value)?;
                Ok((name, value))
            })
            .collect()
    }

    fn check_writable(&self, name: &str, value: f64) -> ModelResult<()> {
        match self.catalog.controls.get(name) {
            Some(variable) => variable.check_value(value).map_err(|e| ModelError::OutOfRange {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None if self.catalog.outputs.contains_key(name) => Err(ModelError::ReadOnly {
                name: name.to_string(),
            }),
            None => Err(ModelError::UnknownVariable {
                name: name.to_string(),
            }),
        }
    }

    fn apply(&mut self, values: &[(String, f64)]) -> ModelResult<()> {
        let commands = self.transformer.get_commands(
            &mut self.engine,
            values,
            &self.beam_path,
            &self.station_status,
        )?;
        debug!(values = values.len(), commands = commands.len(), "applying control values");
        evaluate(&mut self.engine, &commands)?;
        self.refresh()
    }
}

/// Read every control variable and every catalog output from the engine.
pub fn read_state(
    engine: &mut dyn Engine,
    catalog: &Catalog,
    transformer: &dyn Transformer,
) -> ModelResult<State> {
    let mut state = State::new();
    for name in catalog.controls.keys() {
        let value = transformer.get_property(engine, name)?;
        state.insert(name.clone(), Value::Scalar(value));
    }

    if catalog.output_attributes.is_empty() {
        return Ok(state);
    }
    let elements = engine.lat_list("*", ELEMENT_NAMES)?;
    for key in &catalog.output_attributes {
        let values = engine.lat_list("*", key)?;
        if values.len() != elements.len() {
            return Err(EngineError::Shape {
                who: key.clone(),
                expected: elements.len(),
                found: values.len(),
            }
            .into());
        }
        for (element, value) in elements.iter().zip(values) {
            let name = output_name(&element.to_string(), key);
            if catalog.outputs.contains_key(&name) {
                state.insert(name, value);
            }
        }
    }
    debug!(variables = state.len(), "read lattice state");
    Ok(state)
}
