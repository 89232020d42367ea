//! Parsing of Tao's text output.

use crate::engine::ElementAttributes;
use crate::error::{EngineError, EngineResult};
use lb_core::{Value, parse_engine_number, tracked_attribute};

const ERROR_MARKERS: [&str; 2] = ["[ERROR", "[FATAL"];

/// Error lines reported by the engine, joined, if any.
pub fn error_message(lines: &[String]) -> Option<String> {
    let errors: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| ERROR_MARKERS.iter().any(|m| l.starts_with(m)))
        .collect();
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}

/// Parse `python ele:gen_attribs` output: `NAME;TYPE;SETTABLE;VALUE[;VALUE..]`.
pub fn parse_gen_attribs(element: &str, lines: &[String]) -> EngineResult<ElementAttributes> {
    let mut attrs = ElementAttributes::new(element);
    for line in lines {
        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        if fields.len() < 4 || fields[0].is_empty() {
            continue;
        }
        let (name, kind, values) = (fields[0], fields[1], &fields[3..]);
        let value = match kind {
            "REAL" | "INT" | "LOGIC" => match parse_engine_number(values[0]) {
                Some(v) => Value::Scalar(v),
                None => {
                    return Err(EngineError::Parse {
                        command: format!("python ele:gen_attribs {element}"),
                        detail: format!("{name} = {}", values[0]),
                    });
                }
            },
            "REAL_ARR" | "INT_ARR" => Value::Array(
                values
                    .iter()
                    .filter_map(|v| parse_engine_number(v))
                    .collect(),
            ),
            _ => Value::Text(values.join(";")),
        };
        attrs.insert(name, value);
    }
    if attrs.is_empty() {
        return Err(EngineError::Parse {
            command: format!("python ele:gen_attribs {element}"),
            detail: "no attributes reported".to_string(),
        });
    }
    Ok(attrs)
}

/// How the values of one `lat_list` attribute are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListShape {
    /// Values per element.
    pub width: usize,
    /// Text values, kept verbatim.
    pub text: bool,
}

impl ListShape {
    pub const SCALAR: Self = Self {
        width: 1,
        text: false,
    };

    /// Shape of a tracked attribute; unknown keys are scalars.
    pub fn of(who: &str) -> Self {
        tracked_attribute(who)
            .map(|a| Self {
                width: a.width,
                text: a.text,
            })
            .unwrap_or(Self::SCALAR)
    }
}

/// Parse `python lat_list` output into one value per element.
///
/// Values are separated by `;` or newlines. Attributes wider than one value
/// (`ele.mat6`, `ele.vec0`) are chunked into arrays of `shape.width`. Text
/// attributes (`ele.name`) are never coerced, so an element named `T` or
/// `INF` stays a name.
pub fn parse_lat_list(
    command: &str,
    lines: &[String],
    shape: ListShape,
) -> EngineResult<Vec<Value>> {
    let tokens: Vec<&str> = lines
        .iter()
        .flat_map(|l| l.split(';'))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    if shape.text {
        return Ok(tokens.into_iter().map(Value::from).collect());
    }

    let width = shape.width;
    if width <= 1 {
        return Ok(tokens
            .into_iter()
            .map(|t| match parse_engine_number(t) {
                Some(v) => Value::Scalar(v),
                None => Value::Text(t.to_string()),
            })
            .collect());
    }

    if tokens.len() % width != 0 {
        return Err(EngineError::Parse {
            command: command.to_string(),
            detail: format!("{} values is not a multiple of {width}", tokens.len()),
        });
    }
    tokens
        .chunks(width)
        .map(|chunk| {
            chunk
                .iter()
                .map(|t| {
                    parse_engine_number(t).ok_or_else(|| EngineError::Parse {
                        command: command.to_string(),
                        detail: format!("non-numeric entry '{t}'"),
                    })
                })
                .collect::<EngineResult<Vec<f64>>>()
                .map(Value::Array)
        })
        .collect()
}

/// Last `count` columns of the first row of a label-free `show lat` table.
pub fn parse_show_lat_row(
    command: &str,
    lines: &[String],
    count: usize,
) -> EngineResult<Vec<String>> {
    let row = lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .ok_or_else(|| EngineError::Parse {
            command: command.to_string(),
            detail: "empty table".to_string(),
        })?;
    let columns: Vec<&str> = row.split_whitespace().collect();
    if columns.len() < count {
        return Err(EngineError::Parse {
            command: command.to_string(),
            detail: format!("expected at least {count} columns in '{row}'"),
        });
    }
    Ok(columns[columns.len() - count..]
        .iter()
        .map(|c| c.to_string())
        .collect())
}
