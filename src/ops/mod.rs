//! High-level operations.
//!
//! This module contains the implementation of modweave commands:
//! scan the project, resolve external modules, plan and run the build.

pub mod build;
pub mod resolve;
pub mod scan;

pub use build::{build, plan_build, BuildOptions, BuildPaths, BuildSummary};
pub use resolve::{configure_jobs, resolve_externals, resolve_with, ResolveOptions};
pub use scan::scan_project;
