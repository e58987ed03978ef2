//! Module descriptors parsed from `module-info.java` declarations.
//!
//! Parsing is pattern based rather than a full grammar: comments are removed
//! first, then the `module` clause and each directive are matched on their
//! own, so directive order in the source does not matter. A block comment
//! holding a single version token directly before `;` or `{` is kept and read
//! as a version annotation, e.g. `requires org.astro /*1.2*/;`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::errors::ModuleError;

static MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(open\s+)?module\s+([\w.]+)\s*(?:/\*\s*([\w.\-+]+)\s*\*/\s*)?\{")
        .expect("module clause pattern")
});

static REQUIRES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\brequires\s+((?:(?:transitive|static)\s+)*)([\w.]+)\s*(?:/\*\s*([\w.\-+]+)\s*\*/\s*)?;",
    )
    .expect("requires pattern")
});

static EXPORTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(exports|opens)\s+([\w.]+)(?:\s+to\s+([\w.,\s]+?))?\s*;")
        .expect("exports pattern")
});

static USES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\buses\s+([\w.]+)\s*;").expect("uses pattern"));

static PROVIDES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bprovides\s+([\w.]+)\s+with\s+([\w.,\s]+?)\s*;").expect("provides pattern")
});

static VERSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.\-+]+$").expect("version token pattern"));

/// Modifier flags of a requires edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiresModifier {
    /// Readability is passed on to modules reading the requiring module.
    Transitive,
    /// Required at compile time only.
    Static,
    /// Not explicitly or implicitly declared in the source.
    Synthetic,
    /// Implicitly declared, e.g. `java.base`.
    Mandated,
}

impl RequiresModifier {
    fn keyword(self) -> Option<&'static str> {
        match self {
            RequiresModifier::Transitive => Some("transitive"),
            RequiresModifier::Static => Some("static"),
            RequiresModifier::Synthetic | RequiresModifier::Mandated => None,
        }
    }
}

/// A single `requires` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requires {
    pub name: String,
    pub modifiers: BTreeSet<RequiresModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiled_version: Option<String>,
}

impl Requires {
    pub fn new(name: impl Into<String>) -> Self {
        Requires {
            name: name.into(),
            modifiers: BTreeSet::new(),
            compiled_version: None,
        }
    }

    pub fn with_modifier(mut self, modifier: RequiresModifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.compiled_version = Some(version.into());
        self
    }

    pub fn has(&self, modifier: RequiresModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether this edge must be satisfied by a module present at build time.
    ///
    /// Mandated, synthetic and static edges never turn into fetchable
    /// dependencies.
    pub fn is_materialized(&self) -> bool {
        !(self.has(RequiresModifier::Mandated)
            || self.has(RequiresModifier::Synthetic)
            || self.has(RequiresModifier::Static))
    }
}

/// An `exports` or `opens` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageAccess {
    pub package: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

/// A `provides ... with ...` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provides {
    pub service: String,
    pub providers: Vec<String>,
}

/// Immutable description of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    name: String,
    open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    requires: BTreeMap<String, Requires>,
    exports: Vec<PackageAccess>,
    opens: Vec<PackageAccess>,
    uses: Vec<String>,
    provides: Vec<Provides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_class: Option<String>,
}

impl ModuleDescriptor {
    /// Create a descriptor with no directives.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleDescriptor {
            name: name.into(),
            open: false,
            version: None,
            requires: BTreeMap::new(),
            exports: Vec::new(),
            opens: Vec::new(),
            uses: Vec::new(),
            provides: Vec::new(),
            main_class: None,
        }
    }

    /// Parse the text of a module declaration.
    pub fn parse(source: &str) -> Result<Self, ModuleError> {
        let source = strip_comments(source);

        let header = MODULE
            .captures(&source)
            .ok_or_else(|| ModuleError::MalformedDeclaration {
                path: None,
                reason: "expected a `module <name> {` clause".to_string(),
            })?;
        let body_start = header.get(0).map_or(0, |m| m.end());
        let body = &source[body_start..];

        let mut descriptor = ModuleDescriptor::new(&header[2]);
        descriptor.open = header.get(1).is_some();
        descriptor.version = header.get(3).map(|m| m.as_str().to_string());

        for caps in REQUIRES.captures_iter(body) {
            let mut requires = Requires::new(&caps[2]);
            for keyword in caps[1].split_whitespace() {
                match keyword {
                    "transitive" => requires.modifiers.insert(RequiresModifier::Transitive),
                    "static" => requires.modifiers.insert(RequiresModifier::Static),
                    _ => false,
                };
            }
            requires.compiled_version = caps.get(3).map(|m| m.as_str().to_string());
            descriptor.insert_requires(requires);
        }

        for caps in EXPORTS.captures_iter(body) {
            let access = PackageAccess {
                package: caps[2].to_string(),
                targets: caps.get(3).map(|m| split_names(m.as_str())).unwrap_or_default(),
            };
            if &caps[1] == "exports" {
                descriptor.exports.push(access);
            } else {
                descriptor.opens.push(access);
            }
        }

        descriptor.uses = USES.captures_iter(body).map(|c| c[1].to_string()).collect();
        descriptor.provides = PROVIDES
            .captures_iter(body)
            .map(|c| Provides {
                service: c[1].to_string(),
                providers: split_names(&c[2]),
            })
            .collect();

        Ok(descriptor)
    }

    /// Read and parse a declaration file.
    ///
    /// When `infer_main_class` is set, a `<module-as-path>/Main.java` file next
    /// to the declaration makes `<module>.Main` the main class.
    pub fn read(info: &Path, infer_main_class: bool) -> Result<Self, ModuleError> {
        let source = std::fs::read_to_string(info).map_err(|source| ModuleError::Io {
            path: info.to_path_buf(),
            source,
        })?;
        let mut descriptor = Self::parse(&source).map_err(|e| e.with_path(info))?;
        if infer_main_class {
            if let Some(main_class) = infer_main_class_name(info, &descriptor.name) {
                descriptor.main_class = Some(main_class);
            }
        }
        Ok(descriptor)
    }

    /// Insert a requires edge, reconciling duplicates with last-wins.
    fn insert_requires(&mut self, requires: Requires) {
        if let Some(previous) = self.requires.get(&requires.name) {
            if previous.compiled_version != requires.compiled_version {
                tracing::warn!(
                    "module `{}` requires `{}` twice with versions {:?} and {:?}, using the latter",
                    self.name,
                    requires.name,
                    previous.compiled_version,
                    requires.compiled_version
                );
            }
        }
        self.requires.insert(requires.name.clone(), requires);
    }

    pub fn with_requires(mut self, requires: Requires) -> Self {
        self.insert_requires(requires);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_main_class(mut self, main_class: impl Into<String>) -> Self {
        self.main_class = Some(main_class.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    /// Requires edges, sorted by module name.
    pub fn requires(&self) -> impl Iterator<Item = &Requires> {
        self.requires.values()
    }

    pub fn exports(&self) -> &[PackageAccess] {
        &self.exports
    }

    pub fn opens(&self) -> &[PackageAccess] {
        &self.opens
    }

    pub fn uses(&self) -> &[String] {
        &self.uses
    }

    pub fn provides(&self) -> &[Provides] {
        &self.provides
    }

    /// Names of modules that must be present for this module to build.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.requires
            .values()
            .filter(|r| r.is_materialized())
            .map(|r| r.name.as_str())
    }

    /// Render this descriptor back into declaration source.
    pub fn to_declaration(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.open {
            write!(f, "open ")?;
        }
        write!(f, "module {}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, " /*{}*/", version)?;
        }
        writeln!(f, " {{")?;
        for requires in self.requires.values() {
            write!(f, "  requires ")?;
            for keyword in requires.modifiers.iter().filter_map(|m| m.keyword()) {
                write!(f, "{} ", keyword)?;
            }
            write!(f, "{}", requires.name)?;
            if let Some(version) = &requires.compiled_version {
                write!(f, " /*{}*/", version)?;
            }
            writeln!(f, ";")?;
        }
        for (keyword, list) in [("exports", &self.exports), ("opens", &self.opens)] {
            for access in list {
                write!(f, "  {} {}", keyword, access.package)?;
                if !access.targets.is_empty() {
                    write!(f, " to {}", access.targets.join(", "))?;
                }
                writeln!(f, ";")?;
            }
        }
        for service in &self.uses {
            writeln!(f, "  uses {};", service)?;
        }
        for provides in &self.provides {
            writeln!(
                f,
                "  provides {} with {};",
                provides.service,
                provides.providers.join(", ")
            )?;
        }
        write!(f, "}}")
    }
}

/// Conventional main class of a module: `<module>.Main` if its source exists.
pub fn infer_main_class_name(info: &Path, module: &str) -> Option<String> {
    let parent = info.parent()?;
    let candidate = parent.join(module.replace('.', "/")).join("Main.java");
    candidate
        .is_file()
        .then(|| format!("{}.Main", module))
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove line and block comments, keeping version annotations.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    while i < source.len() {
        let rest = &source[i..];
        if rest.starts_with("//") {
            i += rest.find('\n').unwrap_or(rest.len());
        } else if rest.starts_with("/*") {
            let end = rest[2..].find("*/").map_or(rest.len(), |n| n + 4);
            let comment = &rest[..end];
            if is_version_annotation(comment, &rest[end..]) {
                out.push_str(comment);
            } else {
                out.push(' ');
            }
            i += end;
        } else {
            let ch = rest.chars().next().unwrap_or(' ');
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

fn is_version_annotation(comment: &str, following: &str) -> bool {
    let inner = comment
        .strip_prefix("/*")
        .and_then(|c| c.strip_suffix("*/"))
        .map(str::trim)
        .unwrap_or("");
    let next = following.trim_start();
    !inner.is_empty()
        && VERSION_TOKEN.is_match(inner)
        && (next.starts_with(';') || next.starts_with('{'))
}
