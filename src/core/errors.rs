//! Errors raised while reading module declarations.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Structural problem with the declared module graph.
///
/// All variants are fatal: the module graph cannot be trusted once one of
/// them occurs.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("malformed module declaration{}: {reason}", display_path(.path))]
    MalformedDeclaration {
        path: Option<PathBuf>,
        reason: String,
    },

    #[error("duplicate module name `{name}`")]
    DuplicateModuleName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("unsupported module layout at {}: {reason}", .path.display())]
    InvalidLayout { path: PathBuf, reason: String },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} module declaration(s) could not be read", .0.len())]
    Declarations(Vec<ModuleError>),
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

impl ModuleError {
    /// Create a malformed-declaration error for the given file.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ModuleError::MalformedDeclaration {
            path: Some(path.into()),
            reason: reason.into(),
        }
    }

    /// Attach a path to a malformed-declaration error that has none yet.
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            ModuleError::MalformedDeclaration { path: None, reason } => {
                ModuleError::MalformedDeclaration {
                    path: Some(file.into()),
                    reason,
                }
            }
            other => other,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ModuleError::MalformedDeclaration { path, reason } => {
                let mut diag =
                    Diagnostic::error(format!("malformed module declaration: {}", reason));
                if let Some(path) = path {
                    diag = diag.with_location(path);
                }
                diag.with_suggestion("A declaration needs a `module <name> {` clause")
            }

            ModuleError::DuplicateModuleName {
                name,
                first,
                second,
            } => Diagnostic::error(format!("module `{}` is declared twice", name))
                .with_context(format!("first declaration: {}", first.display()))
                .with_context(format!("second declaration: {}", second.display()))
                .with_suggestion("Rename one of the modules or exclude one path from the scan"),

            ModuleError::InvalidLayout { path, reason } => {
                Diagnostic::error(format!("unsupported module layout: {}", reason))
                    .with_location(path)
                    .with_suggestion(
                        "Place `module-info.java` in a directory named after the module",
                    )
            }

            ModuleError::Io { path, source } => {
                Diagnostic::error(format!("failed to read {}: {}", path.display(), source))
            }

            ModuleError::Declarations(errors) => {
                let mut diag = Diagnostic::error(format!(
                    "{} module declaration(s) could not be read",
                    errors.len()
                ));
                for error in errors {
                    diag = diag.with_context(error.to_string());
                }
                diag
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_includes_path() {
        let err = ModuleError::malformed("src/foo/module-info.java", "no module clause");
        let message = err.to_string();
        assert!(message.contains("src/foo/module-info.java"));
        assert!(message.contains("no module clause"));
    }

    #[test]
    fn test_with_path_fills_missing_location() {
        let err = ModuleError::MalformedDeclaration {
            path: None,
            reason: "empty".to_string(),
        }
        .with_path("a/module-info.java");
        assert!(err.to_string().contains("a/module-info.java"));
    }

    #[test]
    fn test_aggregated_diagnostic_lists_every_problem() {
        let err = ModuleError::Declarations(vec![
            ModuleError::malformed("a/module-info.java", "no module clause"),
            ModuleError::malformed("b/module-info.java", "no module clause"),
        ]);
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("2 module declaration(s)"));
        assert!(output.contains("a/module-info.java"));
        assert!(output.contains("b/module-info.java"));
    }
}
