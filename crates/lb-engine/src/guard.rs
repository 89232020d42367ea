//! Batched evaluation with lattice recomputation suspended.
//!
//! Every `set` statement would otherwise trigger a full lattice
//! recomputation. [`LatticeCalcGuard`] turns recomputation off on creation
//! and back on when released or dropped, so a failing batch can never leave
//! the engine in non-recomputing mode.

use crate::command::{LATTICE_CALC_OFF, LATTICE_CALC_ON};
use crate::engine::Engine;
use crate::error::EngineResult;
use tracing::{debug, warn};

pub struct LatticeCalcGuard<'a> {
    engine: &'a mut dyn Engine,
    released: bool,
}

impl<'a> LatticeCalcGuard<'a> {
    /// Suspend lattice recomputation.
    pub fn suspend(engine: &'a mut dyn Engine) -> EngineResult<Self> {
        engine.cmd(LATTICE_CALC_OFF)?;
        Ok(Self {
            engine,
            released: false,
        })
    }

    pub fn engine(&mut self) -> &mut dyn Engine {
        &mut *self.engine
    }

    /// Resume recomputation, reporting any engine error.
    pub fn release(mut self) -> EngineResult<()> {
        self.released = true;
        self.engine.cmd(LATTICE_CALC_ON).map(|_| ())
    }
}

impl Drop for LatticeCalcGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.engine.cmd(LATTICE_CALC_ON) {
            warn!(error = %e, "failed to re-enable lattice calculation");
        }
    }
}

/// Run `commands` in order with recomputation suspended, then recompute once.
///
/// The first rejected command aborts the batch; recomputation is still
/// re-enabled. No outputs are read here.
pub fn evaluate(engine: &mut dyn Engine, commands: &[String]) -> EngineResult<()> {
    debug!(count = commands.len(), "evaluating engine commands");
    let mut guard = LatticeCalcGuard::suspend(engine)?;
    guard.engine().cmds(commands)?;
    guard.release()
}
