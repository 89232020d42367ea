//! Lattice attributes exposed as output variables.
//!
//! Output variables are named `<element><suffix>_`, where the suffix is the
//! engine attribute key with its leading `ele` namespace removed and dots
//! replaced by underscores. The trailing delimiter keeps output names apart
//! from control point names, which never end in `_`.

/// Trailing character appended to every composed output name.
pub const OUTPUT_DELIMITER: char = '_';

const NAMESPACE: &str = "ele.";

/// A per-element lattice quantity the engine can list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedAttribute {
    /// Engine key, e.g. `ele.a.beta`.
    pub key: &'static str,
    pub unit: &'static str,
    /// Number of values the engine reports per element.
    pub width: usize,
    /// Reported as text (element names); never coerced to numbers.
    pub text: bool,
}

const fn attr(key: &'static str, unit: &'static str) -> TrackedAttribute {
    TrackedAttribute {
        key,
        unit,
        width: 1,
        text: false,
    }
}

pub const TRACKED_ATTRIBUTES: &[TrackedAttribute] = &[
    TrackedAttribute {
        key: "ele.name",
        unit: "",
        width: 1,
        text: true,
    },
    attr("ele.ix_ele", ""),
    attr("ele.ix_branch", ""),
    attr("ele.a.beta", "m"),
    attr("ele.a.alpha", ""),
    attr("ele.a.eta", "m"),
    attr("ele.a.etap", ""),
    attr("ele.a.gamma", "1/m"),
    attr("ele.a.phi", ""),
    attr("ele.b.beta", "m"),
    attr("ele.b.alpha", ""),
    attr("ele.b.eta", "m"),
    attr("ele.b.etap", ""),
    attr("ele.b.gamma", "1/m"),
    attr("ele.b.phi", ""),
    attr("ele.x.eta", "m"),
    attr("ele.x.etap", ""),
    attr("ele.y.eta", "m"),
    attr("ele.y.etap", ""),
    attr("ele.s", "m"),
    attr("ele.l", "m"),
    attr("ele.e_tot", "eV"),
    attr("ele.p0c", "eV"),
    TrackedAttribute {
        key: "ele.mat6",
        unit: "",
        width: 36,
        text: false,
    },
    TrackedAttribute {
        key: "ele.vec0",
        unit: "m",
        width: 6,
        text: false,
    },
];

/// Look up an attribute by engine key; the `ele.` namespace is optional.
pub fn tracked_attribute(key: &str) -> Option<&'static TrackedAttribute> {
    let bare = key.strip_prefix(NAMESPACE).unwrap_or(key);
    TRACKED_ATTRIBUTES
        .iter()
        .find(|a| &a.key[NAMESPACE.len()..] == bare)
}

/// `ele.a.beta` -> `_a_beta`
pub fn attribute_suffix(key: &str) -> String {
    let bare = key.strip_prefix(NAMESPACE).unwrap_or(key);
    format!("_{}", bare.replace('.', "_"))
}

/// `("Q1", "ele.a.beta")` -> `Q1_a_beta_`
pub fn output_name(element: &str, key: &str) -> String {
    let mut name = String::with_capacity(element.len() + key.len() + 1);
    name.push_str(element);
    name.push_str(&attribute_suffix(key));
    name.push(OUTPUT_DELIMITER);
    name
}
