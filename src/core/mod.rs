//! Core data model: module descriptors, declared modules and code spaces.

pub mod class_file;
pub mod declared;
pub mod descriptor;
pub mod errors;
pub mod finder;
pub mod folder;
pub mod project;
pub mod source_path;
pub mod space;
pub mod system;

pub use declared::DeclaredModule;
pub use descriptor::{ModuleDescriptor, Requires, RequiresModifier};
pub use errors::ModuleError;
pub use finder::DeclaredModuleFinder;
pub use folder::{SourceFolder, SourceFolders};
pub use project::Project;
pub use space::{CodeSpace, SpaceKind, SpaceSelector};
pub use system::SystemModules;
