//! lb-model: name translation, command building and the lattice state cache.
//!
//! Contains:
//! - transformer (facility capability trait + selection)
//! - slac / generic (facility implementations)
//! - rf (station status override policy)
//! - state (`LatticeModel` cache over one owned engine)
//! - config (model files, engine startup)
//! - export (output definitions from a live lattice)

pub mod config;
pub mod error;
pub mod export;
pub mod generic;
pub mod rf;
pub mod slac;
pub mod state;
pub mod transformer;

pub use config::{EngineConfig, ModelConfig, build_model, expand_vars, load_config, open_model};
pub use error::{ModelError, ModelResult};
pub use export::{export_output_file, snapshot_outputs};
pub use generic::GenericTransformer;
pub use rf::{StationId, StatusOverride};
pub use slac::SlacTransformer;
pub use state::{LatticeModel, State, read_state};
pub use transformer::{Facility, StationStatus, Transformer};
