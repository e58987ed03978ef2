//! Running tool calls as processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::builder::call::ToolCall;
use crate::builder::plan::JUNIT_CONSOLE_MODULE;
use crate::core::source_path::join_paths;
use crate::util::process::{find_executable, CancelToken, Interrupt, ProcessBuilder};

/// Exit code reported when a tool could not run to completion.
pub const NOT_RUN: i32 = -1;

/// What a tool produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub output: String,
    pub errors: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        ToolOutput {
            code: 0,
            output: output.into(),
            errors: String::new(),
        }
    }

    pub fn failure(code: i32, errors: impl Into<String>) -> Self {
        ToolOutput {
            code,
            output: String::new(),
            errors: errors.into(),
        }
    }
}

/// Runs one tool call to completion.
///
/// Failures to start or finish a tool are reported through the output's
/// exit code, never as an error.
pub trait ToolRunner: Send + Sync {
    fn run_tool(&self, call: &ToolCall, cancel: &CancelToken) -> ToolOutput;
}

/// Runs JDK tools from `JAVA_HOME/bin`, falling back to `PATH`.
///
/// `junit` calls launch the JUnit console module with the call's module scope
/// as module path.
#[derive(Debug, Clone, Default)]
pub struct ProcessToolRunner {
    java_home: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `JAVA_HOME` from the environment when it points to a JDK.
    pub fn from_env() -> Self {
        let java_home = std::env::var_os("JAVA_HOME").map(PathBuf::from);
        let java_home = java_home.filter(|home| {
            let valid = is_java_home(home);
            if !valid {
                tracing::warn!("JAVA_HOME {} holds no javac, using PATH", home.display());
            }
            valid
        });
        Self::new().with_java_home(java_home)
    }

    pub fn with_java_home(mut self, java_home: Option<PathBuf>) -> Self {
        self.java_home = java_home;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Locate the executable of a JDK tool.
    pub fn executable(&self, tool: &str) -> Option<PathBuf> {
        if let Some(home) = &self.java_home {
            let candidate = home.join("bin").join(executable_name(tool));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        find_executable(tool)
    }

    fn process(&self, call: &ToolCall) -> Result<ProcessBuilder, String> {
        if call.tool == "junit" {
            let scope = call
                .scope
                .as_ref()
                .ok_or_else(|| "junit call without module scope".to_string())?;
            let java = self.require("java")?;
            return Ok(ProcessBuilder::new(java)
                .arg("--module-path")
                .arg(join_paths(&scope.module_path))
                .arg("--add-modules")
                .arg(&scope.module)
                .arg("--module")
                .arg(JUNIT_CONSOLE_MODULE)
                .arg("execute")
                .args(&call.args));
        }
        Ok(ProcessBuilder::new(self.require(&call.tool)?).args(&call.args))
    }

    fn require(&self, tool: &str) -> Result<PathBuf, String> {
        self.executable(tool)
            .ok_or_else(|| format!("tool `{}` not found in JAVA_HOME or PATH", tool))
    }
}

fn executable_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool)
    } else {
        tool.to_string()
    }
}

impl ToolRunner for ProcessToolRunner {
    fn run_tool(&self, call: &ToolCall, cancel: &CancelToken) -> ToolOutput {
        let process = match self.process(call) {
            Ok(process) => process,
            Err(message) => return ToolOutput::failure(NOT_RUN, message),
        };
        tracing::debug!("running {}", process.display_command());
        let captured = match process.exec(Some(cancel), self.timeout) {
            Ok(captured) => captured,
            Err(e) => return ToolOutput::failure(NOT_RUN, format!("{:#}", e)),
        };
        let mut errors = captured.stderr;
        match captured.interrupted {
            Some(Interrupt::Cancelled) => errors.push_str("\ncancelled"),
            Some(Interrupt::TimedOut) => errors.push_str(&format!(
                "\ntimed out after {}s",
                self.timeout.map(|t| t.as_secs()).unwrap_or_default()
            )),
            None => {}
        }
        ToolOutput {
            code: captured.code.unwrap_or(NOT_RUN),
            output: captured.stdout,
            errors,
        }
    }
}

/// Check whether `path` looks like a JDK home.
pub fn is_java_home(path: &Path) -> bool {
    path.join("bin").join(executable_name("javac")).is_file()
}
