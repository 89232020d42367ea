use thiserror::Error;

pub type LbResult<T> = Result<T, LbError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LbError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: String, value: f64 },

    #[error("Value {value} for {name} is outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Expected a scalar for {what}, found {found}")]
    NotScalar { what: String, found: &'static str },
}
