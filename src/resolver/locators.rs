//! Built-in locator strategies.
//!
//! - [`LinkTable`]: explicit module to URI links, optionally per platform
//! - [`MavenLocator`]: explicit module to Maven coordinates
//! - [`JUnitLocator`], [`JavaFxLocator`], [`LwjglLocator`]: naming conventions
//!   of well-known libraries published to Maven Central
//! - [`ConventionLocator`]: a configurable prefix to coordinates template

use std::collections::BTreeMap;
use std::fmt;

use crate::resolver::locator::{ExternalModuleLocator, Location, Stability};
use crate::resolver::maven::{Coordinates, CENTRAL};

/// Operating system family of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Mac,
    Windows,
}

/// Processor architecture of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_32,
    X86_64,
    Arm32,
    Arm64,
    Other,
}

/// Platform used to pick native classifiers and platform-specific links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Platform { os, arch }
    }

    /// The platform this binary was built for.
    pub fn host() -> Self {
        let os = match std::env::consts::OS {
            "windows" => Os::Windows,
            "macos" | "ios" => Os::Mac,
            _ => Os::Linux,
        };
        let arch = match std::env::consts::ARCH {
            "x86" => Arch::X86_32,
            "x86_64" => Arch::X86_64,
            "arm" => Arch::Arm32,
            "aarch64" => Arch::Arm64,
            _ => Arch::Other,
        };
        Platform { os, arch }
    }

    pub fn os_name(&self) -> &'static str {
        match self.os {
            Os::Linux => "linux",
            Os::Mac => "mac",
            Os::Windows => "windows",
        }
    }

    pub fn arch_name(&self) -> &'static str {
        match self.arch {
            Arch::X86_32 => "x86_32",
            Arch::X86_64 => "x86_64",
            Arch::Arm32 => "arm_32",
            Arch::Arm64 => "arm_64",
            Arch::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os_name(), self.arch_name())
    }
}

/// Explicit links, looked up as `name|os-arch`, then `name|os`, then `name`.
#[derive(Debug, Clone)]
pub struct LinkTable {
    name: String,
    links: BTreeMap<String, String>,
    platform: Platform,
}

impl LinkTable {
    pub fn new(links: BTreeMap<String, String>, platform: Platform) -> Self {
        let modules: std::collections::BTreeSet<&str> = links
            .keys()
            .map(|k| k.split_once('|').map_or(k.as_str(), |(m, _)| m))
            .collect();
        LinkTable {
            name: format!("links [{}/{}]", modules.len(), links.len()),
            links,
            platform,
        }
    }
}

impl ExternalModuleLocator for LinkTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn locate(&self, module: &str) -> Option<Location> {
        let os = format!("{}|{}", module, self.platform.os_name());
        let os_arch = format!("{}-{}", os, self.platform.arch_name());
        [os_arch.as_str(), os.as_str(), module]
            .iter()
            .find_map(|key| self.links.get(*key))
            .map(|uri| Location::new(uri.clone()).with_stability(Stability::Stable))
    }
}

/// Explicit module name to Maven coordinates.
#[derive(Debug, Clone)]
pub struct MavenLocator {
    repository: String,
    coordinates: BTreeMap<String, Coordinates>,
}

impl MavenLocator {
    pub fn new(repository: impl Into<String>, coordinates: BTreeMap<String, Coordinates>) -> Self {
        MavenLocator {
            repository: repository.into(),
            coordinates,
        }
    }
}

impl ExternalModuleLocator for MavenLocator {
    fn name(&self) -> &str {
        "maven"
    }

    fn locate(&self, module: &str) -> Option<Location> {
        let coordinates = self.coordinates.get(module)?;
        Some(
            Location::new(coordinates.to_uri(&self.repository))
                .with_version(coordinates.version.clone())
                .with_stability(Stability::Stable),
        )
    }
}

fn dynamic(repository: &str, coordinates: Coordinates) -> Location {
    Location::new(coordinates.to_uri(repository))
        .with_version(coordinates.version.clone())
        .with_stability(Stability::Dynamic)
}

/// Whether `module` is `prefix` or a dotted child of it.
fn has_prefix(module: &str, prefix: &str) -> bool {
    module == prefix
        || module
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// JUnit platform, Jupiter and Vintage modules plus their companions.
#[derive(Debug, Clone)]
pub struct JUnitLocator {
    repository: String,
    jupiter: String,
    platform: String,
}

impl JUnitLocator {
    /// Locate JUnit modules of the given Jupiter version.
    ///
    /// The platform version follows the JUnit 5 numbering: Jupiter `5.x.y`
    /// ships with platform `1.x.y`.
    pub fn new(version: impl Into<String>) -> Self {
        let jupiter = version.into();
        let platform = match jupiter.strip_prefix("5.") {
            Some(rest) => format!("1.{}", rest),
            None => jupiter.clone(),
        };
        JUnitLocator {
            repository: CENTRAL.to_string(),
            jupiter,
            platform,
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }
}

impl ExternalModuleLocator for JUnitLocator {
    fn name(&self) -> &str {
        "junit"
    }

    fn locate(&self, module: &str) -> Option<Location> {
        let companion = match module {
            "org.apiguardian.api" => Some(("org.apiguardian", "apiguardian-api", "1.1.2")),
            "org.opentest4j" => Some(("org.opentest4j", "opentest4j", "1.3.0")),
            "junit" => Some(("junit", "junit", "4.13.2")),
            "org.hamcrest" => Some(("org.hamcrest", "hamcrest", "2.2")),
            _ => None,
        };
        if let Some((group, artifact, version)) = companion {
            return Some(dynamic(&self.repository, Coordinates::new(group, artifact, version)));
        }
        let (group, version) = [
            ("org.junit.jupiter", &self.jupiter),
            ("org.junit.vintage", &self.jupiter),
            ("org.junit.platform", &self.platform),
        ]
        .into_iter()
        .find(|(group, _)| has_prefix(module, group))?;
        let artifact = module["org.".len()..].replace('.', "-");
        Some(dynamic(&self.repository, Coordinates::new(group, artifact, version.as_str())))
    }
}

/// OpenJFX modules with a platform classifier.
#[derive(Debug, Clone)]
pub struct JavaFxLocator {
    repository: String,
    version: String,
    classifier: String,
}

impl JavaFxLocator {
    /// The classifier is computed from `platform` once, here.
    /// [`Externals::from_config`](super::Externals::from_config) is always
    /// called with [`Platform::host`], so lookups use the running machine.
    pub fn new(version: impl Into<String>, platform: Platform) -> Self {
        let os = match platform.os {
            Os::Windows => "win",
            Os::Mac => "mac",
            Os::Linux => "linux",
        };
        let classifier = match (platform.os, platform.arch) {
            (Os::Mac | Os::Linux, Arch::Arm64) => format!("{}-aarch64", os),
            _ => os.to_string(),
        };
        JavaFxLocator {
            repository: CENTRAL.to_string(),
            version: version.into(),
            classifier,
        }
    }
}

impl ExternalModuleLocator for JavaFxLocator {
    fn name(&self) -> &str {
        "javafx"
    }

    fn locate(&self, module: &str) -> Option<Location> {
        let suffix = module.strip_prefix("javafx.")?;
        let coordinates =
            Coordinates::new("org.openjfx", format!("javafx-{}", suffix), &*self.version)
                .with_classifier(&*self.classifier);
        Some(dynamic(&self.repository, coordinates))
    }
}

/// LWJGL modules; `*.natives` names map to the platform natives classifier.
#[derive(Debug, Clone)]
pub struct LwjglLocator {
    repository: String,
    version: String,
    classifier: String,
}

impl LwjglLocator {
    /// Like [`JavaFxLocator::new`], the natives classifier is fixed from
    /// `platform`, which is the host platform outside of tests.
    pub fn new(version: impl Into<String>, platform: Platform) -> Self {
        let classifier = match (platform.os, platform.arch) {
            (Os::Linux, Arch::Arm64) => "natives-linux-arm64",
            (Os::Linux, Arch::Arm32) => "natives-linux-arm32",
            (Os::Linux, _) => "natives-linux",
            (Os::Windows, Arch::X86_32) => "natives-windows-x86",
            (Os::Windows, Arch::Arm64) => "natives-windows-arm64",
            (Os::Windows, _) => "natives-windows",
            (Os::Mac, Arch::Arm64) => "natives-macos-arm64",
            (Os::Mac, _) => "natives-macos",
        };
        LwjglLocator {
            repository: CENTRAL.to_string(),
            version: version.into(),
            classifier: classifier.to_string(),
        }
    }
}

impl ExternalModuleLocator for LwjglLocator {
    fn name(&self) -> &str {
        "lwjgl"
    }

    fn locate(&self, module: &str) -> Option<Location> {
        if !has_prefix(module, "org.lwjgl") {
            return None;
        }
        let (base, natives) = match module.strip_suffix(".natives") {
            Some(base) => (base, true),
            None => (module, false),
        };
        let artifact = format!("lwjgl{}", base["org.lwjgl".len()..].replace('.', "-"));
        let mut coordinates = Coordinates::new("org.lwjgl", artifact, &*self.version);
        if natives {
            coordinates = coordinates.with_classifier(&*self.classifier);
        }
        Some(dynamic(&self.repository, coordinates))
    }
}

/// Coordinates computed from a name prefix and templates.
///
/// Templates may use `{module}`, `{module-dashed}`, `{suffix}` (the name
/// after the prefix and its dot), `{suffix-dashed}`, `{os}` and `{arch}`.
#[derive(Debug, Clone)]
pub struct ConventionLocator {
    name: String,
    repository: String,
    prefix: String,
    group: String,
    artifact: String,
    version: String,
    classifier: Option<String>,
    platform: Platform,
}

impl ConventionLocator {
    /// `{os}` and `{arch}` expand from `platform`; configured chains pass
    /// [`Platform::host`].
    pub fn new(
        prefix: impl Into<String>,
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
        platform: Platform,
    ) -> Self {
        let prefix = prefix.into();
        ConventionLocator {
            name: format!("convention {}", prefix),
            repository: CENTRAL.to_string(),
            prefix,
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            platform,
        }
    }

    pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    fn render(&self, template: &str, module: &str) -> String {
        let suffix = module[self.prefix.len()..].trim_start_matches('.');
        template
            .replace("{module}", module)
            .replace("{module-dashed}", &module.replace('.', "-"))
            .replace("{suffix-dashed}", &suffix.replace('.', "-"))
            .replace("{suffix}", suffix)
            .replace("{os}", self.platform.os_name())
            .replace("{arch}", self.platform.arch_name())
    }
}

impl ExternalModuleLocator for ConventionLocator {
    fn name(&self) -> &str {
        &self.name
    }

    fn locate(&self, module: &str) -> Option<Location> {
        if !has_prefix(module, &self.prefix) {
            return None;
        }
        let mut coordinates = Coordinates::new(
            self.render(&self.group, module),
            self.render(&self.artifact, module),
            self.render(&self.version, module),
        );
        if let Some(classifier) = &self.classifier {
            coordinates = coordinates.with_classifier(self.render(classifier, module));
        }
        Some(dynamic(&self.repository, coordinates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::locator::LocatorChain;

    const LINUX: Platform = Platform {
        os: Os::Linux,
        arch: Arch::X86_64,
    };

    #[test]
    fn test_link_table_prefers_platform_specific_entries() {
        let mut links = BTreeMap::new();
        links.insert("a".to_string(), "https://host/a.jar".to_string());
        links.insert("a|linux".to_string(), "https://host/a-linux.jar".to_string());
        links.insert("a|linux-arm_64".to_string(), "https://host/a-linux-arm64.jar".to_string());

        let table = LinkTable::new(links.clone(), LINUX);
        assert_eq!(table.locate("a").unwrap().uri, "https://host/a-linux.jar");
        assert_eq!(table.name(), "links [1/3]");

        let arm = LinkTable::new(links.clone(), Platform::new(Os::Linux, Arch::Arm64));
        assert_eq!(arm.locate("a").unwrap().uri, "https://host/a-linux-arm64.jar");

        let mac = LinkTable::new(links, Platform::new(Os::Mac, Arch::X86_64));
        let location = mac.locate("a").unwrap();
        assert_eq!(location.uri, "https://host/a.jar");
        assert_eq!(location.stability, Stability::Stable);
        assert!(mac.locate("b").is_none());
    }

    #[test]
    fn test_junit_convention() {
        let junit = JUnitLocator::new("5.10.2");
        let api = junit.locate("org.junit.jupiter.api").unwrap();
        assert_eq!(
            api.uri,
            concat!(
                "https://repo.maven.apache.org/maven2/",
                "org/junit/jupiter/junit-jupiter-api/5.10.2/junit-jupiter-api-5.10.2.jar"
            )
        );
        assert_eq!(api.stability, Stability::Dynamic);

        let console = junit.locate("org.junit.platform.console").unwrap();
        assert_eq!(console.version.as_deref(), Some("1.10.2"));
        assert!(console.uri.ends_with("/junit-platform-console-1.10.2.jar"));

        assert!(junit.locate("org.opentest4j").is_some());
        assert!(junit.locate("org.junitx").is_none());
        assert!(junit.locate("com.acme").is_none());
    }

    #[test]
    fn test_javafx_classifier() {
        let fx = JavaFxLocator::new("21", Platform::new(Os::Windows, Arch::X86_64));
        assert!(fx
            .locate("javafx.controls")
            .unwrap()
            .uri
            .ends_with("/org/openjfx/javafx-controls/21/javafx-controls-21-win.jar"));
        let fx = JavaFxLocator::new("21", Platform::new(Os::Mac, Arch::Arm64));
        assert!(fx.locate("javafx.base").unwrap().uri.ends_with("-21-mac-aarch64.jar"));
        assert!(fx.locate("javafxx").is_none());
    }

    #[test]
    fn test_lwjgl_natives() {
        let lwjgl = LwjglLocator::new("3.3.3", LINUX);
        assert!(lwjgl
            .locate("org.lwjgl")
            .unwrap()
            .uri
            .ends_with("/org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar"));
        assert!(lwjgl
            .locate("org.lwjgl.glfw.natives")
            .unwrap()
            .uri
            .ends_with("/org/lwjgl/lwjgl-glfw/3.3.3/lwjgl-glfw-3.3.3-natives-linux.jar"));
    }

    #[test]
    fn test_convention_templates() {
        let convention =
            ConventionLocator::new("com.acme", "com.acme", "acme-{suffix-dashed}", "2.0", LINUX)
                .with_classifier(Some("{os}".to_string()));
        let location = convention.locate("com.acme.net.http").unwrap();
        assert!(location
            .uri
            .ends_with("/com/acme/acme-net-http/2.0/acme-net-http-2.0-linux.jar"));
        assert!(convention.locate("com.acmex").is_none());
    }

    #[test]
    fn test_exact_link_beats_convention() {
        let mut links = BTreeMap::new();
        links.insert("org.junit.jupiter.api".to_string(), "file:///opt/api.jar".to_string());
        let chain = LocatorChain::new()
            .with(LinkTable::new(links, LINUX))
            .with(JUnitLocator::new("5.10.2"));
        assert_eq!(chain.locate("org.junit.jupiter.api").unwrap().uri, "file:///opt/api.jar");
        assert!(chain.locate("org.junit.jupiter.engine").unwrap().uri.starts_with("https://"));
    }
}
