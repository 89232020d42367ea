//! lb-core: shared vocabulary for lattice bridge.
//!
//! Contains:
//! - value (engine quantities coerced to scalars, arrays or text)
//! - variable (control and output variable definitions)
//! - mapping (control point name -> lattice element/attribute)
//! - attributes (tracked lattice attributes, units and output naming)
//! - numeric (tolerances + engine number parsing)
//! - error (shared error types)

pub mod attributes;
pub mod error;
pub mod mapping;
pub mod numeric;
pub mod value;
pub mod variable;

pub use attributes::{
    OUTPUT_DELIMITER, TRACKED_ATTRIBUTES, TrackedAttribute, attribute_suffix, output_name,
    tracked_attribute,
};
pub use error::{LbError, LbResult};
pub use mapping::{NameMapping, Target, TargetKind};
pub use numeric::*;
pub use value::Value;
pub use variable::Variable;
