//! Control point name to lattice element/attribute mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What kind of device a control point drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Magnet,
    RfStation,
}

/// Lattice element and attribute addressed by a control point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub element: String,
    pub attribute: String,
    pub kind: TargetKind,
}

impl Target {
    pub fn magnet(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            attribute: attribute.into(),
            kind: TargetKind::Magnet,
        }
    }

    pub fn rf_station(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            attribute: attribute.into(),
            kind: TargetKind::RfStation,
        }
    }
}

/// Static control name -> target table, built once by the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NameMapping {
    entries: BTreeMap<String, Target>,
}

impl NameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous target for `name` if any.
    pub fn insert(&mut self, name: impl Into<String>, target: Target) -> Option<Target> {
        self.entries.insert(name.into(), target)
    }

    pub fn resolve(&self, name: &str) -> Option<&Target> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Target)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Target)> for NameMapping {
    fn from_iter<I: IntoIterator<Item = (String, Target)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
