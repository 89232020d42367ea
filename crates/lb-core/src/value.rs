//! Engine quantities as stored in the model state.

use crate::error::{LbError, LbResult};
use crate::numeric::Real;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value reported by the engine.
///
/// Integer and floating point scalars are both stored as `Scalar(f64)`;
/// per-element matrices (`ele.mat6`) and vectors (`ele.vec0`) are flattened
/// row-major into `Array`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Real),
    Array(Vec<Real>),
    Text(String),
}

impl Value {
    pub fn as_scalar(&self) -> Option<Real> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Like [`Value::as_scalar`] but reports what was found instead.
    pub fn scalar(&self, what: &str) -> LbResult<Real> {
        self.as_scalar().ok_or_else(|| LbError::NotScalar {
            what: what.to_string(),
            found: self.kind(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Array(_) => "array",
            Value::Text(_) => "text",
        }
    }
}

impl From<Real> for Value {
    fn from(v: Real) -> Self {
        Value::Scalar(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(v as Real)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(if v { 1.0 } else { 0.0 })
    }
}

impl From<Vec<Real>> for Value {
    fn from(v: Vec<Real>) -> Self {
        Value::Array(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "{v}"),
            Value::Array(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}
