//! Engine boundary for lattice bridge.
//!
//! Provides:
//! - `Engine` trait: commands, element attribute queries, per-element listings
//! - Command vocabulary (`set ele`, lattice calculation toggles, `show lat`)
//! - `LatticeCalcGuard` + `evaluate`: batched commands with one recomputation
//! - `TaoProcess`: Tao driven as a subprocess
//! - `MockEngine` (feature `mock`): in-memory lattice for tests

pub mod command;
pub mod engine;
pub mod error;
pub mod guard;
pub mod parse;
pub mod tao;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use command::{
    LATTICE_CALC_OFF, LATTICE_CALC_ON, SetElement, set_element, show_lattice_attributes,
};
pub use engine::{ElementAttributes, Engine};
pub use error::{EngineError, EngineResult};
pub use guard::{LatticeCalcGuard, evaluate};
pub use tao::{TaoOptions, TaoProcess};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockEngine;
