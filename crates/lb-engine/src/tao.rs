//! Tao subprocess driver.
//!
//! Runs `tao -noplot -init <file>` with piped stdin/stdout, writes one
//! command per line and collects output up to the next prompt.

use crate::command::{gen_attribs_query, lat_list_query};
use crate::engine::{ElementAttributes, Engine};
use crate::error::{EngineError, EngineResult};
use crate::parse::{ListShape, error_message, parse_gen_attribs, parse_lat_list};
use lb_core::Value;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

pub const DEFAULT_EXECUTABLE: &str = "tao";
pub const DEFAULT_PROMPT: &str = "Tao>";

const QUIT_POLLS: usize = 50;
const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How to start the engine process.
#[derive(Clone, Debug, PartialEq)]
pub struct TaoOptions {
    pub executable: PathBuf,
    pub init_file: PathBuf,
    pub prompt: String,
    pub extra_args: Vec<String>,
}

impl TaoOptions {
    pub fn new(init_file: impl Into<PathBuf>) -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            init_file: init_file.into(),
            prompt: DEFAULT_PROMPT.to_string(),
            extra_args: Vec::new(),
        }
    }
}

pub struct TaoProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    prompt: String,
}

impl TaoProcess {
    pub fn spawn(options: &TaoOptions) -> EngineResult<Self> {
        info!(
            executable = %options.executable.display(),
            init = %options.init_file.display(),
            "starting Tao"
        );
        let mut child = Command::new(&options.executable)
            .arg("-noplot")
            .arg("-init")
            .arg(&options.init_file)
            .args(&options.extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: options.executable.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| EngineError::Closed {
            what: "stdin not captured".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| EngineError::Closed {
            what: "stdout not captured".to_string(),
        })?;

        let mut process = Self {
            child,
            stdin,
            stdout,
            prompt: options.prompt.clone(),
        };
        let banner = process.read_until_prompt()?;
        let startup = split_response(&banner, &process.prompt, "");
        if let Some(message) = error_message(&startup) {
            return Err(EngineError::Rejected {
                command: format!("-init {}", options.init_file.display()),
                message,
            });
        }
        debug!(lines = startup.len(), "Tao ready");
        Ok(process)
    }

    fn read_until_prompt(&mut self) -> EngineResult<String> {
        let mut raw = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let n = self.stdout.read(&mut chunk)?;
            if n == 0 {
                return Err(EngineError::Closed {
                    what: "end of output before prompt".to_string(),
                });
            }
            raw.extend_from_slice(&chunk[..n]);
            if ends_with_prompt(&raw, self.prompt.as_bytes()) {
                return Ok(String::from_utf8_lossy(&raw).into_owned());
            }
        }
    }
}

/// Whether `raw`, ignoring trailing whitespace, ends with `prompt`.
fn ends_with_prompt(raw: &[u8], prompt: &[u8]) -> bool {
    let end = raw
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    raw[..end].ends_with(prompt)
}

/// Output lines of one command: the trailing prompt and any echo of the
/// command itself are removed.
pub fn split_response(raw: &str, prompt: &str, command: &str) -> Vec<String> {
    let body = raw.trim_end();
    let body = body.strip_suffix(prompt).unwrap_or(body);
    body.lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.trim().is_empty())
        .filter(|l| command.is_empty() || l.trim() != command.trim())
        .collect()
}

impl Engine for TaoProcess {
    fn cmd(&mut self, command: &str) -> EngineResult<Vec<String>> {
        trace!(%command, "tao");
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        let raw = self.read_until_prompt()?;
        let lines = split_response(&raw, &self.prompt, command);
        if let Some(message) = error_message(&lines) {
            return Err(EngineError::Rejected {
                command: command.to_string(),
                message,
            });
        }
        Ok(lines)
    }

    fn ele_gen_attribs(&mut self, element: &str) -> EngineResult<ElementAttributes> {
        let lines = self.cmd(&gen_attribs_query(element))?;
        parse_gen_attribs(element, &lines)
    }

    fn lat_list(&mut self, elements: &str, who: &str) -> EngineResult<Vec<Value>> {
        let query = lat_list_query(elements, who);
        let lines = self.cmd(&query)?;
        parse_lat_list(&query, &lines, ListShape::of(who))
    }
}

impl Drop for TaoProcess {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "quit");
        let _ = self.stdin.flush();
        for _ in 0..QUIT_POLLS {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            std::thread::sleep(QUIT_POLL_INTERVAL);
        }
        warn!("Tao did not exit after quit; killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_strips_prompt_and_echo() {
        let raw = "set ele Q1 k1 = 1\n\n[ERROR | x]\n  detail  \nTao> ";
        let lines = split_response(raw, "Tao>", "set ele Q1 k1 = 1");
        assert_eq!(lines, ["[ERROR | x]", "  detail"]);
    }

    #[test]
    fn prompt_detection_ignores_trailing_whitespace() {
        assert!(ends_with_prompt(b"L;REAL;F;0.1\nTao> ", b"Tao>"));
        assert!(ends_with_prompt(b"Tao>\n", b"Tao>"));
        assert!(!ends_with_prompt(b"Tao> partial", b"Tao>"));
        assert!(!ends_with_prompt(b"  \n", b"Tao>"));
        assert!(!ends_with_prompt(b"", b"Tao>"));
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let mut options = TaoOptions::new("/nonexistent/tao.init");
        options.executable = PathBuf::from("/nonexistent/bin/tao-does-not-exist");
        let err = TaoProcess::spawn(&options).err().unwrap();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }
}
