//! In-memory engine for tests and offline runs.
//!
//! Models a straight lattice of magnets, RF stations and markers with toy
//! optics: integrated gradients accumulate along the line into beta/alpha,
//! enabled stations add energy. Outputs are only recomputed when lattice
//! calculation is on, which makes recomputation batching observable.

use crate::command::{LATTICE_CALC_OFF, LATTICE_CALC_ON, SetElement};
use crate::engine::{ElementAttributes, Engine};
use crate::error::{EngineError, EngineResult};
use lb_core::{TRACKED_ATTRIBUTES, Value, format_engine_number, parse_engine_number};
use std::collections::BTreeMap;

const BASE_BETA: f64 = 10.0;
const BASE_ENERGY_EV: f64 = 135.0e6;
const STATION_LENGTH: f64 = 3.0;

#[derive(Clone, Debug)]
struct MockElement {
    name: String,
    kind: &'static str,
    attributes: BTreeMap<String, f64>,
}

impl MockElement {
    fn get(&self, name: &str) -> f64 {
        self.attributes.get(name).copied().unwrap_or(0.0)
    }
}

#[derive(Default)]
pub struct MockEngineBuilder {
    elements: Vec<MockElement>,
}

impl MockEngineBuilder {
    fn push(mut self, name: &str, kind: &'static str, attributes: &[(&str, f64)]) -> Self {
        self.elements.push(MockElement {
            name: name.to_string(),
            kind,
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_ascii_uppercase(), *v))
                .collect(),
        });
        self
    }

    /// Quadrupole with length (m) and gradient (T/m).
    pub fn element(self, name: &str, length: f64, b1_gradient: f64) -> Self {
        self.push(name, "Quadrupole", &[("L", length), ("B1_GRADIENT", b1_gradient)])
    }

    /// RF station with amplitude (MeV), phase (deg) and in-use flag.
    pub fn klystron(self, name: &str, enld_mev: f64, phase_deg: f64, in_use: bool) -> Self {
        self.push(
            name,
            "Lcavity",
            &[
                ("L", STATION_LENGTH),
                ("ENLD_MEV", enld_mev),
                ("PHASE_DEG", phase_deg),
                ("IN_USE", if in_use { 1.0 } else { 0.0 }),
            ],
        )
    }

    pub fn marker(self, name: &str) -> Self {
        self.push(name, "Marker", &[("L", 0.0)])
    }

    pub fn build(self) -> MockEngine {
        let mut engine = MockEngine {
            elements: self.elements,
            calc_on: true,
            recomputes: 0,
            history: Vec::new(),
            computed: BTreeMap::new(),
            rejected_patterns: Vec::new(),
        };
        engine.recompute();
        engine.recomputes = 0;
        engine
    }
}

pub struct MockEngine {
    elements: Vec<MockElement>,
    calc_on: bool,
    recomputes: usize,
    history: Vec<String>,
    /// tracked key -> one value per element, as of the last recompute
    computed: BTreeMap<&'static str, Vec<Value>>,
    rejected_patterns: Vec<String>,
}

impl MockEngine {
    pub fn builder() -> MockEngineBuilder {
        MockEngineBuilder::default()
    }

    /// Reject every command or query containing `pattern`.
    pub fn reject_containing(&mut self, pattern: &str) {
        self.rejected_patterns.push(pattern.to_string());
    }

    pub fn clear_rejections(&mut self) {
        self.rejected_patterns.clear();
    }

    pub fn lattice_calc_on(&self) -> bool {
        self.calc_on
    }

    /// Recomputations since the engine was built.
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }

    /// Every command passed to [`Engine::cmd`], in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn attribute(&self, element: &str, attribute: &str) -> Option<f64> {
        self.elements
            .iter()
            .find(|e| e.name == element)
            .and_then(|e| e.attributes.get(&attribute.to_ascii_uppercase()).copied())
    }

    fn check_rejected(&self, command: &str) -> EngineResult<()> {
        match self.rejected_patterns.iter().find(|p| command.contains(p.as_str())) {
            Some(p) => Err(EngineError::Rejected {
                command: command.to_string(),
                message: format!("[ERROR | mock] rejected by pattern '{p}'"),
            }),
            None => Ok(()),
        }
    }

    fn element_index(&self, command: &str, name: &str) -> EngineResult<usize> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| EngineError::Rejected {
                command: command.to_string(),
                message: format!("[ERROR | tao_set_elements] No elements match: {name}"),
            })
    }

    fn recompute(&mut self) {
        self.recomputes += 1;
        let n = self.elements.len();
        let mut s = 0.0;
        let mut k_int = 0.0;
        let mut energy = BASE_ENERGY_EV;
        let mut rows: Vec<BTreeMap<&'static str, Value>> = Vec::with_capacity(n);

        for (ix, ele) in self.elements.iter().enumerate() {
            let l = ele.get("L");
            s += l;
            k_int += ele.get("B1_GRADIENT") * l;
            if ele.get("IN_USE") != 0.0 {
                energy += ele.get("ENLD_MEV") * 1e6 * ele.get("PHASE_DEG").to_radians().cos();
            }
            let a_beta = BASE_BETA + k_int;
            let b_beta = BASE_BETA - k_int;
            let a_alpha = -0.5 * k_int;
            let b_alpha = 0.5 * k_int;

            let mut mat6 = vec![0.0; 36];
            for i in 0..6 {
                mat6[i * 6 + i] = 1.0;
            }
            mat6[1] = s;
            mat6[2 * 6 + 3] = s;

            let mut row = BTreeMap::new();
            for attr in TRACKED_ATTRIBUTES {
                let value = match attr.key {
                    "ele.name" => Value::Text(ele.name.clone()),
                    "ele.ix_ele" => Value::Scalar(ix as f64),
                    "ele.ix_branch" => Value::Scalar(0.0),
                    "ele.a.beta" => Value::Scalar(a_beta),
                    "ele.a.alpha" => Value::Scalar(a_alpha),
                    "ele.a.gamma" => Value::Scalar((1.0 + a_alpha * a_alpha) / a_beta),
                    "ele.a.phi" => Value::Scalar(s / a_beta),
                    "ele.b.beta" => Value::Scalar(b_beta),
                    "ele.b.alpha" => Value::Scalar(b_alpha),
                    "ele.b.gamma" => Value::Scalar((1.0 + b_alpha * b_alpha) / b_beta),
                    "ele.b.phi" => Value::Scalar(s / b_beta),
                    "ele.s" => Value::Scalar(s),
                    "ele.l" => Value::Scalar(l),
                    "ele.e_tot" | "ele.p0c" => Value::Scalar(energy),
                    "ele.mat6" => Value::Array(mat6.clone()),
                    "ele.vec0" => Value::Array(vec![0.0; 6]),
                    _ => Value::Scalar(0.0),
                };
                row.insert(attr.key, value);
            }
            rows.push(row);
        }

        self.computed = TRACKED_ATTRIBUTES
            .iter()
            .map(|attr| {
                let column = rows.iter().map(|row| row[attr.key].clone()).collect();
                (attr.key, column)
            })
            .collect();
    }

    fn set_element(&mut self, command: &str, set: &SetElement<'_>) -> EngineResult<()> {
        let ix = self.element_index(command, set.element)?;
        let value = parse_engine_number(set.value).ok_or_else(|| EngineError::Rejected {
            command: command.to_string(),
            message: format!("[ERROR | tao_set_elements] Bad value: {}", set.value),
        })?;
        self.elements[ix]
            .attributes
            .insert(set.attribute.to_ascii_uppercase(), value);
        if self.calc_on {
            self.recompute();
        }
        Ok(())
    }

    fn show_lat(&self, command: &str) -> EngineResult<Vec<String>> {
        let mut words = command.split_whitespace().skip(2);
        let name = words.next().unwrap_or_default();
        let ix = self.element_index(command, name)?;
        let ele = &self.elements[ix];
        let s: f64 = self.elements[..=ix].iter().map(|e| e.get("L")).sum();

        let mut row = format!("{ix:>6}  {}  {}  {s:.6}  {:.6}", ele.name, ele.kind, ele.get("L"));
        let mut words = command.split_whitespace().peekable();
        while let Some(word) = words.next() {
            if word != "-attr" {
                continue;
            }
            let Some(attr) = words.next() else { break };
            let attr = attr.to_ascii_uppercase();
            let value = ele.get(&attr);
            if attr == "IN_USE" {
                row.push_str(if value != 0.0 { "  T" } else { "  F" });
            } else {
                row.push_str("  ");
                row.push_str(&format_engine_number(value));
            }
        }
        Ok(vec![row])
    }
}

impl Engine for MockEngine {
    fn cmd(&mut self, command: &str) -> EngineResult<Vec<String>> {
        self.history.push(command.to_string());
        self.check_rejected(command)?;

        match command.trim() {
            LATTICE_CALC_OFF => {
                self.calc_on = false;
                return Ok(Vec::new());
            }
            LATTICE_CALC_ON => {
                self.calc_on = true;
                self.recompute();
                return Ok(Vec::new());
            }
            _ => {}
        }

        if let Some(set) = SetElement::parse(command) {
            self.set_element(command, &set)?;
            return Ok(Vec::new());
        }
        if command.starts_with("show lat ") {
            return self.show_lat(command);
        }
        Err(EngineError::Rejected {
            command: command.to_string(),
            message: "[ERROR | tao_command] Unrecognized command".to_string(),
        })
    }

    fn ele_gen_attribs(&mut self, element: &str) -> EngineResult<ElementAttributes> {
        let query = crate::command::gen_attribs_query(element);
        self.check_rejected(&query)?;
        let ix = self.element_index(&query, element)?;
        let mut attrs = ElementAttributes::new(element);
        for (name, value) in &self.elements[ix].attributes {
            attrs.insert(name, *value);
        }
        Ok(attrs)
    }

    fn lat_list(&mut self, elements: &str, who: &str) -> EngineResult<Vec<Value>> {
        let query = crate::command::lat_list_query(elements, who);
        self.check_rejected(&query)?;
        let key = lb_core::tracked_attribute(who)
            .map(|a| a.key)
            .ok_or_else(|| EngineError::Rejected {
                command: query.clone(),
                message: format!("[ERROR | tao_python_cmd] Bad who: {who}"),
            })?;
        let column = &self.computed[key];
        Ok(self
            .elements
            .iter()
            .zip(column)
            .filter(|(e, _)| elements == "*" || e.name == elements)
            .map(|(_, v)| v.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice() -> MockEngine {
        MockEngine::builder()
            .marker("BEGINNING")
            .element("Q1", 0.1, 2.0)
            .klystron("K21_1", 200.0, 0.0, true)
            .marker("END")
            .build()
    }

    #[test]
    fn outputs_follow_recompute_only() {
        let mut engine = lattice();
        let beta_before = engine.lat_list("*", "ele.a.beta").unwrap();

        engine.cmd(LATTICE_CALC_OFF).unwrap();
        engine.cmd("set ele Q1 b1_gradient = 4").unwrap();
        assert_eq!(engine.lat_list("*", "ele.a.beta").unwrap(), beta_before);

        engine.cmd(LATTICE_CALC_ON).unwrap();
        let beta_after = engine.lat_list("*", "ele.a.beta").unwrap();
        assert_ne!(beta_after, beta_before);
        assert_eq!(engine.recompute_count(), 1);
    }

    #[test]
    fn energy_gain_from_enabled_station() {
        let mut engine = lattice();
        let energy = engine.lat_list("*", "ele.e_tot").unwrap();
        assert_eq!(energy[3], Value::Scalar(BASE_ENERGY_EV + 200.0e6));

        engine.cmd("set ele K21_1 in_use = 0").unwrap();
        let energy = engine.lat_list("*", "ele.e_tot").unwrap();
        assert_eq!(energy[3], Value::Scalar(BASE_ENERGY_EV));
    }

    #[test]
    fn show_lat_reports_requested_attributes() {
        let mut engine = lattice();
        let rows = engine
            .cmd("show lat K21_1 -attr ENLD_MEV -attr PHASE_DEG -attr in_use -no_label_lines")
            .unwrap();
        let cols: Vec<&str> = rows[0].split_whitespace().collect();
        assert_eq!(&cols[cols.len() - 3..], ["200", "0", "T"]);
    }

    #[test]
    fn wide_attributes_and_names() {
        let mut engine = lattice();
        let names = engine.lat_list("*", "ele.name").unwrap();
        assert_eq!(names[1], Value::Text("Q1".into()));
        let mat6 = engine.lat_list("Q1", "ele.mat6").unwrap();
        assert!(matches!(&mat6[0], Value::Array(v) if v.len() == 36));
    }

    #[test]
    fn unknown_element_is_rejected() {
        let mut engine = lattice();
        assert!(matches!(
            engine.ele_gen_attribs("QX"),
            Err(EngineError::Rejected { .. })
        ));
    }
}
