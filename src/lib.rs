//! modweave - a module-aware build orchestrator for modular Java
//!
//! This crate provides the library behind the `modweave` CLI: scanning
//! `module-info.java` declarations, resolving external modules into a
//! local directory, planning JDK tool calls and running them.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use builder::{BuildPlan, Executor, ToolCall};
pub use core::{DeclaredModule, DeclaredModuleFinder, ModuleDescriptor, Project};
pub use resolver::{MissingModuleResolver, Resolution};
pub use util::context::GlobalContext;
