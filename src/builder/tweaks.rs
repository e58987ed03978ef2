//! Extra tool arguments supplied by the project configuration.
//!
//! Keys select the calls they apply to:
//!
//! - `javac` applies to every `javac` call
//! - `javac(17)` applies to calls compiling for release 17
//! - `javac(com.greetings)` applies to calls concerning one module
//! - `javac(com.greetings@17)` combines both
//!
//! Arguments are appended in that order, from general to specific.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Tweaks {
    entries: BTreeMap<String, Vec<String>>,
}

impl Tweaks {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Tweaks { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arguments for a call of `tool`, optionally scoped to a module and release.
    pub fn args(&self, tool: &str, module: Option<&str>, release: Option<u32>) -> Vec<String> {
        let mut keys = vec![tool.to_string()];
        if let Some(release) = release {
            keys.push(format!("{}({})", tool, release));
        }
        if let Some(module) = module {
            keys.push(format!("{}({})", tool, module));
            if let Some(release) = release {
                keys.push(format!("{}({}@{})", tool, module, release));
            }
        }
        keys.iter()
            .filter_map(|key| self.entries.get(key))
            .flatten()
            .cloned()
            .collect()
    }
}
