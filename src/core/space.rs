//! Code spaces partition declared modules by purpose.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::core::finder::DeclaredModuleFinder;

/// The purpose of a code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceKind {
    Main,
    Test,
}

impl SpaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceKind::Main => "main",
            SpaceKind::Test => "test",
        }
    }
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns declaration paths to code spaces.
///
/// Explicit glob patterns win. A space without patterns receives the paths
/// the default heuristic assigns to it: a path with an element named `test`
/// or starting with `test-` is test code, everything else main code.
#[derive(Debug, Clone, Default)]
pub struct SpaceSelector {
    main: Vec<glob::Pattern>,
    test: Vec<glob::Pattern>,
}

impl SpaceSelector {
    /// Compile the configured patterns.
    pub fn new(main: &[String], test: &[String]) -> Result<Self, glob::PatternError> {
        let compile = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| glob::Pattern::new(p))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(SpaceSelector {
            main: compile(main)?,
            test: compile(test)?,
        })
    }

    /// Classify a declaration by its path relative to the project root.
    pub fn classify(&self, relative: &Path) -> Option<SpaceKind> {
        let text = relative.to_string_lossy().replace('\\', "/");
        if self.test.iter().any(|p| p.matches(&text)) {
            return Some(SpaceKind::Test);
        }
        if self.main.iter().any(|p| p.matches(&text)) {
            return Some(SpaceKind::Main);
        }
        let guess = if is_test_path(relative) {
            SpaceKind::Test
        } else {
            SpaceKind::Main
        };
        let configured = match guess {
            SpaceKind::Main => &self.main,
            SpaceKind::Test => &self.test,
        };
        configured.is_empty().then_some(guess)
    }
}

/// Whether any path element is `test` or starts with `test-`.
pub fn is_test_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name == "test" || name.starts_with("test-")
        }
        _ => false,
    })
}

/// A set of declared modules compiled together.
#[derive(Debug, Clone)]
pub struct CodeSpace {
    pub kind: SpaceKind,
    pub modules: DeclaredModuleFinder,
    /// Base `--release` for untargeted sources.
    pub release: Option<u32>,
}

impl CodeSpace {
    pub fn new(kind: SpaceKind, modules: DeclaredModuleFinder) -> Self {
        CodeSpace {
            kind,
            modules,
            release: None,
        }
    }

    pub fn with_release(mut self, release: Option<u32>) -> Self {
        self.release = release;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_heuristic() {
        let selector = SpaceSelector::default();
        assert_eq!(
            selector.classify(Path::new("m/main/java/module-info.java")),
            Some(SpaceKind::Main)
        );
        assert_eq!(
            selector.classify(Path::new("m/test/java/module-info.java")),
            Some(SpaceKind::Test)
        );
        assert_eq!(
            selector.classify(Path::new("test-integration/foo/module-info.java")),
            Some(SpaceKind::Test)
        );
        assert_eq!(
            selector.classify(Path::new("testing/foo/module-info.java")),
            Some(SpaceKind::Main)
        );
    }

    #[test]
    fn test_patterns_override_heuristic() {
        let selector = SpaceSelector::new(&["src/*/main/**".to_string()], &[]).unwrap();
        assert_eq!(
            selector.classify(Path::new("src/a/main/java/module-info.java")),
            Some(SpaceKind::Main)
        );
        // Main patterns are configured, so unmatched main-looking paths are ignored.
        assert_eq!(selector.classify(Path::new("tools/b/module-info.java")), None);
        assert_eq!(
            selector.classify(Path::new("src/a/test/java/module-info.java")),
            Some(SpaceKind::Test)
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(SpaceSelector::new(&["[".to_string()], &[]).is_err());
    }
}
