use crate::LbError;

/// Floating point type used for every cached quantity
pub type Real = f64;

/// Absolute/relative tolerance pair for comparing engine round trips.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        // Engine values pass through text formatting, so allow a few ulps.
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &str) -> Result<Real, LbError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(LbError::NonFinite {
            what: what.to_string(),
            value: v,
        })
    }
}

/// Parse a number as printed by the engine.
///
/// Accepts plain integers and floats, Fortran double exponents (`1.5D-03`)
/// and the logicals `T`/`F` (mapped to 1.0/0.0). Anything else is `None`.
pub fn parse_engine_number(token: &str) -> Option<Real> {
    let token = token.trim();
    match token {
        "T" | "True" | "true" => return Some(1.0),
        "F" | "False" | "false" => return Some(0.0),
        _ => {}
    }
    if let Ok(v) = token.parse::<Real>() {
        return Some(v);
    }
    if token.contains(['D', 'd']) {
        return token.replace(['D', 'd'], "E").parse::<Real>().ok();
    }
    None
}

/// Format a value for an engine `set` command.
///
/// Very small or very large magnitudes switch to exponent notation so the
/// command stays short; everything else uses the shortest round-trip form.
pub fn format_engine_number(v: Real) -> String {
    let mag = v.abs();
    if v == 0.0 || (1e-4..1e12).contains(&mag) {
        format!("{v}")
    } else {
        format!("{v:e}")
    }
}
