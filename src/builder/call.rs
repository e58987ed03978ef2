//! Tool invocations produced by the plan builder.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Modules visible to a tool that resolves modules itself, in lookup order.
///
/// The first entry providing a module wins, so a test archive listed before
/// the main modules shadows the main module of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleScope {
    /// Root module to run.
    pub module: String,
    /// Archives and directories of archives.
    pub module_path: Vec<PathBuf>,
}

impl ModuleScope {
    pub fn new(module: impl Into<String>) -> Self {
        ModuleScope {
            module: module.into(),
            module_path: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_path.push(path.into());
        self
    }
}

/// One invocation of a named tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCall {
    pub tool: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ModuleScope>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>) -> Self {
        ToolCall {
            tool: tool.into(),
            args: Vec::new(),
            scope: None,
        }
    }

    pub fn with(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append an option followed by its value.
    pub fn with_option(self, option: &str, value: impl Into<String>) -> Self {
        self.with(option).with(value)
    }

    pub fn with_path(self, option: &str, path: &Path) -> Self {
        self.with_option(option, path.display().to_string())
    }

    pub fn with_all<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_scope(mut self, scope: ModuleScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Number of occurrences of `arg`.
    pub fn count(&self, arg: &str) -> usize {
        self.args.iter().filter(|a| *a == arg).count()
    }

    /// Value following the first occurrence of `option`.
    pub fn value_of(&self, option: &str) -> Option<&str> {
        let index = self.args.iter().position(|a| a == option)?;
        self.args.get(index + 1).map(String::as_str)
    }
}

impl fmt::Display for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tool)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
