//! Control and output variable definitions.

use crate::error::{LbError, LbResult};
use crate::numeric::Real;
use serde::{Deserialize, Serialize};

/// A named model variable.
///
/// Control variables are writable and may carry a value range; outputs are
/// read-only and never do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub unit: String,
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_range: Option<(Real, Real)>,
}

impl Variable {
    pub fn control(
        name: impl Into<String>,
        unit: impl Into<String>,
        min: Option<Real>,
        max: Option<Real>,
    ) -> Self {
        let value_range = match (min, max) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(Real::NEG_INFINITY), max.unwrap_or(Real::INFINITY))),
        };
        Self {
            name: name.into(),
            unit: unit.into(),
            read_only: false,
            value_range,
        }
    }

    pub fn output(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            read_only: true,
            value_range: None,
        }
    }

    /// Reject non-finite values and values outside the declared range.
    pub fn check_value(&self, value: Real) -> LbResult<()> {
        if !value.is_finite() {
            return Err(LbError::NonFinite {
                what: self.name.clone(),
                value,
            });
        }
        if let Some((min, max)) = self.value_range
            && (value < min || value > max)
        {
            return Err(LbError::OutOfRange {
                name: self.name.clone(),
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}
