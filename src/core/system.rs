//! Modules provided by the Java platform itself.

use std::collections::BTreeSet;

/// Name prefixes of platform modules.
pub const SYSTEM_MODULE_PREFIXES: &[&str] = &["java.", "jdk."];

/// The set of module names that never need to be fetched.
#[derive(Debug, Clone, Default)]
pub struct SystemModules {
    extra: BTreeSet<String>,
}

impl SystemModules {
    /// Platform modules plus additional names treated as provided.
    pub fn new(extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        SystemModules {
            extra: extra.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        SYSTEM_MODULE_PREFIXES.iter().any(|p| name.starts_with(p)) || self.extra.contains(name)
    }
}
