//! Resolution error types and diagnostics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Failure to fetch one located module.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {uri} failed: {message}")]
    Transfer { uri: String, message: String },

    #[error("checksum mismatch for {uri}: expected {expected}, got {actual}")]
    Checksum {
        uri: String,
        expected: String,
        actual: String,
    },

    #[error("size mismatch for {uri}: expected {expected} bytes, got {actual}")]
    Size { uri: String, expected: u64, actual: u64 },

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error closing the set of external modules.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ResolveError {
    /// A fetch did not make a missing module available.
    #[error("could not resolve {} module(s): {}", .missing.len(), .missing.join(", "))]
    #[diagnostic(
        code(modweave::resolve::unresolvable),
        help("the fetched archives do not provide the listed modules")
    )]
    Unresolvable {
        missing: Vec<String>,
        /// Fetch failures of the previous iteration, by module name.
        failures: BTreeMap<String, String>,
    },

    /// No locator knows where to find these modules.
    #[error("no locator knows {}", .names.join(", "))]
    #[diagnostic(code(modweave::resolve::not_locatable))]
    NotLocatable { names: Vec<String> },

    #[error("external modules directory {} is unusable: {message}", .path.display())]
    #[diagnostic(code(modweave::resolve::directory))]
    Directory { path: PathBuf, message: String },

    #[error(
        "invalid maven coordinates `{coordinates}`: expected group:artifact:version[:classifier]"
    )]
    #[diagnostic(code(modweave::resolve::coordinates))]
    InvalidCoordinates { coordinates: String },

    #[error("resolution cancelled with {} module(s) fetched", .fetched.len())]
    #[diagnostic(code(modweave::resolve::cancelled))]
    Cancelled { fetched: Vec<String> },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::Unresolvable { missing, failures } => {
                let mut diag = Diagnostic::error(format!(
                    "could not resolve {} module(s)",
                    missing.len()
                ))
                .with_context(format!("still missing: {}", missing.join(", ")));
                for (name, failure) in failures {
                    diag = diag.with_context(format!("fetching `{}` failed: {}", name, failure));
                }
                if failures.is_empty() {
                    diag.with_suggestion(suggestions::ARCHIVE_NAMES)
                } else {
                    diag.with_suggestion(suggestions::FETCH_FAILED)
                }
            }

            ResolveError::NotLocatable { names } => {
                let mut diag = Diagnostic::error(format!(
                    "no locator knows {} required module(s)",
                    names.len()
                ));
                for name in names {
                    diag = diag.with_context(format!("`{}` is required but unknown", name));
                }
                diag.with_suggestion(suggestions::NOT_LOCATABLE)
                    .with_suggestion(suggestions::SYSTEM_MODULE)
            }

            ResolveError::Directory { path, message } => {
                Diagnostic::error(format!("external modules directory is unusable: {}", message))
                    .with_location(path)
                    .with_suggestion("Run `modweave clean --externals` and resolve again")
            }

            ResolveError::InvalidCoordinates { coordinates } => {
                Diagnostic::error(format!("invalid maven coordinates `{}`", coordinates))
                    .with_suggestion("Use the form `group:artifact:version[:classifier]`")
            }

            ResolveError::Cancelled { fetched } => {
                let diag = Diagnostic::error("resolution cancelled");
                if fetched.is_empty() {
                    diag
                } else {
                    diag.with_context(format!("already fetched: {}", fetched.join(", ")))
                }
            }
        }
    }
}
