//! Engine trait for pluggable lattice-physics backends.

use crate::error::{EngineError, EngineResult};
use lb_core::Value;
use std::collections::BTreeMap;

/// General attributes of one lattice element, keyed by upper-case name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementAttributes {
    element: String,
    values: BTreeMap<String, Value>,
}

impl ElementAttributes {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_ascii_uppercase(), value.into());
    }

    /// Case-insensitive lookup (`b1_gradient` finds `B1_GRADIENT`).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&name.to_ascii_uppercase())
    }

    pub fn scalar(&self, name: &str) -> EngineResult<f64> {
        self.get(name)
            .and_then(Value::as_scalar)
            .ok_or_else(|| EngineError::MissingAttribute {
                element: self.element.clone(),
                attribute: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Command and query interface to a lattice-physics engine.
///
/// The engine is authoritative for everything it reports; implementations
/// surface its rejections as [`EngineError::Rejected`] and never retry.
/// Methods take `&mut self` because a single engine instance processes one
/// command at a time.
pub trait Engine {
    /// Execute one engine command and return its output lines.
    fn cmd(&mut self, command: &str) -> EngineResult<Vec<String>>;

    /// Execute commands in order, stopping at the first rejection.
    fn cmds(&mut self, commands: &[String]) -> EngineResult<()> {
        for command in commands {
            self.cmd(command)?;
        }
        Ok(())
    }

    /// General attributes of `element` (length, strengths, ...).
    fn ele_gen_attribs(&mut self, element: &str) -> EngineResult<ElementAttributes>;

    /// One value per matching element for lattice property `who`.
    fn lat_list(&mut self, elements: &str, who: &str) -> EngineResult<Vec<Value>>;
}
