//! Engine command vocabulary.

use lb_core::format_engine_number;

/// Suspend automatic lattice recomputation.
pub const LATTICE_CALC_OFF: &str = "set global lattice_calc_on = F";

/// Resume automatic lattice recomputation; the engine recomputes once.
pub const LATTICE_CALC_ON: &str = "set global lattice_calc_on = T";

/// `set ele <element> <attribute> = <value>`
pub fn set_element(element: &str, attribute: &str, value: f64) -> String {
    format!(
        "set ele {element} {attribute} = {}",
        format_engine_number(value)
    )
}

/// Parsed form of a `set ele` command.
#[derive(Clone, Debug, PartialEq)]
pub struct SetElement<'a> {
    pub element: &'a str,
    pub attribute: &'a str,
    pub value: &'a str,
}

impl<'a> SetElement<'a> {
    pub fn parse(command: &'a str) -> Option<Self> {
        let mut words = command.split_whitespace();
        if words.next()? != "set" || words.next()? != "ele" {
            return None;
        }
        let element = words.next()?;
        let attribute = words.next()?;
        if words.next()? != "=" {
            return None;
        }
        let value = words.next()?;
        if words.next().is_some() {
            return None;
        }
        Some(Self {
            element,
            attribute,
            value,
        })
    }

    /// Render with a different value, keeping element and attribute.
    pub fn with_value(&self, value: f64) -> String {
        set_element(self.element, self.attribute, value)
    }
}

/// `show lat <element> -attr A -attr B ... -no_label_lines`
pub fn show_lattice_attributes(element: &str, attributes: &[&str]) -> String {
    let mut cmd = format!("show lat {element}");
    for attribute in attributes {
        cmd.push_str(" -attr ");
        cmd.push_str(attribute);
    }
    cmd.push_str(" -no_label_lines");
    cmd
}

/// Structured element attribute query.
pub fn gen_attribs_query(element: &str) -> String {
    format!("python ele:gen_attribs {element}")
}

/// Structured per-element listing query.
pub fn lat_list_query(elements: &str, who: &str) -> String {
    format!("python lat_list {elements}|model {who}")
}
