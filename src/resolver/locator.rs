//! Mapping external module names to fetchable locations.

use std::fmt;

use serde::Serialize;

/// How much a location can be trusted to stay the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Unknown,
    /// Computed from naming conventions; may point to nothing.
    Dynamic,
    /// Explicitly configured.
    Stable,
}

/// Expected properties of a fetched file, taken from a location's fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expected {
    pub sha256: Option<String>,
    pub size: Option<u64>,
}

impl Expected {
    pub fn is_empty(&self) -> bool {
        self.sha256.is_none() && self.size.is_none()
    }
}

/// Where to fetch one module from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// URI, optionally carrying `#sha256=...&size=...`.
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub stability: Stability,
}

impl Location {
    pub fn new(uri: impl Into<String>) -> Self {
        Location {
            uri: uri.into(),
            version: None,
            stability: Stability::Unknown,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_stability(mut self, stability: Stability) -> Self {
        self.stability = stability;
        self
    }

    /// The URI without its fragment.
    pub fn target(&self) -> &str {
        match self.uri.split_once('#') {
            Some((target, _)) => target,
            None => &self.uri,
        }
    }

    /// Checksum and size expectations encoded in the fragment.
    pub fn expected(&self) -> Expected {
        let Some((_, fragment)) = self.uri.split_once('#') else {
            return Expected::default();
        };
        let mut expected = Expected::default();
        for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
            match key.as_ref() {
                "sha256" => expected.sha256 = Some(value.to_lowercase()),
                "size" => expected.size = value.parse().ok(),
                other => tracing::debug!("ignoring fragment key `{}` in {}", other, self.uri),
            }
        }
        expected
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target())?;
        if let Some(version) = &self.version {
            write!(f, " ({})", version)?;
        }
        Ok(())
    }
}

/// A strategy mapping a module name to a location.
///
/// Implementations hold no mutable state and may be queried from several
/// threads at once.
pub trait ExternalModuleLocator: Send + Sync {
    /// Short description used in logs.
    fn name(&self) -> &str;

    fn locate(&self, module: &str) -> Option<Location>;
}

/// Locators queried in order; the first answer wins.
#[derive(Default)]
pub struct LocatorChain {
    locators: Vec<Box<dyn ExternalModuleLocator>>,
}

impl LocatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, locator: impl ExternalModuleLocator + 'static) {
        self.locators.push(Box::new(locator));
    }

    pub fn with(mut self, locator: impl ExternalModuleLocator + 'static) -> Self {
        self.push(locator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.locators.iter().map(|l| l.name()).collect()
    }

    /// Query every locator in order and return the first location found.
    pub fn locate(&self, module: &str) -> Option<Location> {
        self.locators.iter().find_map(|locator| {
            let location = locator.locate(module)?;
            tracing::debug!("{} located `{}` at {}", locator.name(), module, location);
            Some(location)
        })
    }
}

impl fmt::Debug for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, &'static str, &'static str);

    impl ExternalModuleLocator for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn locate(&self, module: &str) -> Option<Location> {
            module.starts_with(self.1).then(|| Location::new(self.2))
        }
    }

    #[test]
    fn test_first_match_wins() {
        let chain = LocatorChain::new()
            .with(Fixed("exact", "a", "https://host/a.jar"))
            .with(Fixed("convention", "", "https://central/any.jar"));
        assert_eq!(chain.locate("a").unwrap().uri, "https://host/a.jar");
        assert_eq!(chain.locate("x.y").unwrap().uri, "https://central/any.jar");
        assert_eq!(chain.names(), vec!["exact", "convention"]);
    }

    #[test]
    fn test_empty_chain_locates_nothing() {
        assert!(LocatorChain::new().locate("a").is_none());
    }

    #[test]
    fn test_fragment_expectations() {
        let location = Location::new("https://host/a.jar#sha256=ABC123&size=42");
        assert_eq!(location.target(), "https://host/a.jar");
        assert_eq!(
            location.expected(),
            Expected {
                sha256: Some("abc123".to_string()),
                size: Some(42)
            }
        );
        assert!(Location::new("https://host/a.jar").expected().is_empty());
    }
}
