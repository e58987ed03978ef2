//! Build plan generation.
//!
//! A BuildPlan is an ordered list of phases. Calls within one phase are
//! independent of each other; every phase depends on all phases before it.
//! The main space is planned before the test space because test modules are
//! compiled against main archives.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::call::{ModuleScope, ToolCall};
use crate::builder::layout::WorkspaceLayout;
use crate::builder::tweaks::Tweaks;
use crate::core::declared::DeclaredModule;
use crate::core::errors::ModuleError;
use crate::core::folder::{SourceFolder, MODULE_INFO_JAVA};
use crate::core::project::Project;
use crate::core::source_path::join_paths;
use crate::core::space::{CodeSpace, SpaceKind};
use crate::util::fs::files_with_extension;

/// Module launching the JUnit platform.
pub const JUNIT_CONSOLE_MODULE: &str = "org.junit.platform.console";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
    Compile,
    /// Sources targeted at a release above the base.
    CompileReleases,
    Archive,
    Document,
    Link,
    Test,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::Compile => "compile",
            PhaseKind::CompileReleases => "compile-releases",
            PhaseKind::Archive => "archive",
            PhaseKind::Document => "document",
            PhaseKind::Link => "link",
            PhaseKind::Test => "test",
        };
        f.write_str(name)
    }
}

/// Calls of one step of one space.
#[derive(Debug, Clone, Serialize)]
pub struct Phase {
    pub space: SpaceKind,
    pub kind: PhaseKind,
    /// Whether the calls may run concurrently.
    pub parallel: bool,
    pub calls: Vec<ToolCall>,
}

impl Phase {
    pub fn new(space: SpaceKind, kind: PhaseKind, calls: Vec<ToolCall>) -> Self {
        Phase {
            space,
            kind,
            parallel: true,
            calls,
        }
    }

    /// Run calls in list order.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn caption(&self) -> String {
        match self.kind {
            PhaseKind::Compile => format!("Compile {} modules", self.space),
            PhaseKind::CompileReleases => {
                format!("Compile targeted releases of {} modules", self.space)
            }
            PhaseKind::Archive => format!("Archive {} modules", self.space),
            PhaseKind::Document => format!("Document {} modules", self.space),
            PhaseKind::Link => "Link runtime image".to_string(),
            PhaseKind::Test => format!("Run tests of {} module(s)", self.calls.len()),
        }
    }
}

/// A complete build plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildPlan {
    pub phases: Vec<Phase>,
}

impl BuildPlan {
    /// Append a phase; phases without calls are dropped.
    pub fn push(&mut self, phase: Phase) {
        if !phase.calls.is_empty() {
            self.phases.push(phase);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// All calls in plan order.
    pub fn calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.phases.iter().flat_map(|p| p.calls.iter())
    }

    pub fn call_count(&self) -> usize {
        self.phases.iter().map(|p| p.calls.len()).sum()
    }

    /// Calls of one tool in one space.
    pub fn calls_of(&self, space: SpaceKind, tool: &str) -> Vec<&ToolCall> {
        self.phases
            .iter()
            .filter(|p| p.space == space)
            .flat_map(|p| p.calls.iter())
            .filter(|c| c.tool == tool)
            .collect()
    }

    pub fn phase(&self, space: SpaceKind, kind: PhaseKind) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|p| p.space == space && p.kind == kind)
    }
}

/// What to plan beyond compiling and archiving.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub document: bool,
    pub link: bool,
    pub run_tests: bool,
    pub main_tweaks: Tweaks,
    pub test_tweaks: Tweaks,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            document: false,
            link: false,
            run_tests: true,
            main_tweaks: Tweaks::default(),
            test_tweaks: Tweaks::default(),
        }
    }
}

/// Inputs of plan builders.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub project: &'a Project,
    pub layout: &'a WorkspaceLayout,
    pub external_modules: &'a Path,
    pub options: &'a PlanOptions,
}

/// Plans the main and test spaces of a project.
pub struct SpacePlanBuilder<'a> {
    context: PlanContext<'a>,
}

impl<'a> SpacePlanBuilder<'a> {
    pub fn new(context: PlanContext<'a>) -> Self {
        SpacePlanBuilder { context }
    }

    pub fn plan(&self) -> Result<BuildPlan, ModuleError> {
        let mut plan = BuildPlan::default();
        for phase in self.main_phases()? {
            plan.push(phase);
        }
        for phase in self.test_phases()? {
            plan.push(phase);
        }
        Ok(plan)
    }

    fn project(&self) -> &Project {
        self.context.project
    }

    fn layout(&self) -> &WorkspaceLayout {
        self.context.layout
    }

    fn external_modules(&self) -> PathBuf {
        self.context.external_modules.to_path_buf()
    }

    pub fn main_phases(&self) -> Result<Vec<Phase>, ModuleError> {
        let space = self.project().main();
        if space.is_empty() {
            return Ok(Vec::new());
        }
        let tweaks = &self.context.options.main_tweaks;
        let mut phases = vec![Phase::new(
            SpaceKind::Main,
            PhaseKind::Compile,
            vec![self.compile_space(space, tweaks, &[self.external_modules()], &BTreeMap::new())?],
        )];

        let mut targeted = Vec::new();
        let mut compiled: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for module in space.modules.modules() {
            for (release, call) in self.compile_targeted(module, tweaks)? {
                compiled
                    .entry(module.name().to_string())
                    .or_default()
                    .push(release);
                targeted.push(call);
            }
        }
        phases.push(Phase::new(SpaceKind::Main, PhaseKind::CompileReleases, targeted));

        let archives = space
            .modules
            .modules()
            .map(|module| {
                let releases = compiled.get(module.name()).map(Vec::as_slice).unwrap_or(&[]);
                self.archive_main(module, releases, tweaks)
            })
            .collect();
        phases.push(Phase::new(SpaceKind::Main, PhaseKind::Archive, archives));

        if self.context.options.document {
            phases.push(self.document(space, tweaks)?);
        }
        if self.context.options.link {
            if let Some(call) = self.link(space, tweaks) {
                phases.push(Phase::new(SpaceKind::Main, PhaseKind::Link, vec![call]));
            }
        }
        Ok(phases)
    }

    pub fn test_phases(&self) -> Result<Vec<Phase>, ModuleError> {
        let space = self.project().test();
        if space.is_empty() {
            return Ok(Vec::new());
        }
        let tweaks = &self.context.options.test_tweaks;
        let patches = space.modules.to_module_patches(&self.project().main().modules)?;
        let module_path = [self.layout().modules(SpaceKind::Main), self.external_modules()];
        let mut phases = vec![Phase::new(
            SpaceKind::Test,
            PhaseKind::Compile,
            vec![self.compile_space(space, tweaks, &module_path, &patches)?],
        )];

        let archives = space
            .modules
            .modules()
            .map(|module| self.archive_test(module, tweaks))
            .collect();
        phases.push(Phase::new(SpaceKind::Test, PhaseKind::Archive, archives));

        if self.context.options.run_tests {
            let runs = space
                .modules
                .modules()
                .map(|module| self.run_tests(space, module, tweaks))
                .collect();
            phases.push(Phase::new(SpaceKind::Test, PhaseKind::Test, runs));
        }
        Ok(phases)
    }

    /// One `javac` call compiling the untargeted sources of every module.
    fn compile_space(
        &self,
        space: &CodeSpace,
        tweaks: &Tweaks,
        module_path: &[PathBuf],
        patches: &BTreeMap<String, String>,
    ) -> Result<ToolCall, ModuleError> {
        let mut javac =
            ToolCall::new("javac").with_option("--module", space.modules.names().join(","));
        if let Some(release) = space.release {
            javac = javac.with_option("--release", release.to_string());
        }
        for entry in space.modules.to_module_source_paths(false)? {
            javac = javac.with_option("--module-source-path", entry);
        }
        javac = javac.with_option("--module-path", join_paths(module_path));
        for (module, patch) in patches {
            javac = javac.with_option("--patch-module", format!("{}={}", module, patch));
        }
        if let Some(version) = self.project().version() {
            javac = javac.with_option("--module-version", version);
        }
        Ok(javac
            .with_all(["-encoding", "UTF-8"])
            .with_path("-d", &self.layout().classes(space.kind, None))
            .with_all(tweaks.args("javac", None, space.release)))
    }

    /// `javac` calls for sources targeted above the base release.
    ///
    /// Folders that hold `module-info.java` compile in module mode patching
    /// the base classes; others compile against the base classes on the
    /// class path. Folders already part of the module source path and
    /// folders without sources are skipped.
    fn compile_targeted(
        &self,
        module: &DeclaredModule,
        tweaks: &Tweaks,
    ) -> Result<Vec<(u32, ToolCall)>, ModuleError> {
        let name = module.name();
        let in_source_path = module.module_specific_paths()?;
        let base_classes = self.layout().module_classes(SpaceKind::Main, None, name);
        let mut calls = Vec::new();

        for folder in module.sources().targeted() {
            if in_source_path.contains(&folder.path) {
                continue;
            }
            let sources = java_sources(folder)?;
            if sources.is_empty() {
                continue;
            }
            let release = folder.release;
            let mut javac = ToolCall::new("javac").with_option("--release", release.to_string());
            if folder.is_module_info_java_present() {
                javac = javac
                    .with_option("--module", name)
                    .with_option(
                        "--module-source-path",
                        format!("{}={}", name, folder.path.display()),
                    )
                    .with_option("--module-path", join_paths(&[self.external_modules()]))
                    .with_option("--patch-module", format!("{}={}", name, base_classes.display()))
                    .with_path("-d", &self.layout().classes(SpaceKind::Main, Some(release)));
            } else {
                let mut class_path = vec![base_classes.clone()];
                class_path.extend(files_with_extension(&self.external_modules(), "jar").map_err(
                    |source| ModuleError::Io {
                        path: self.external_modules(),
                        source,
                    },
                )?);
                javac = javac
                    .with_option("--class-path", join_paths(&class_path))
                    .with("-implicit:none")
                    .with_path(
                        "-d",
                        &self.layout().module_classes(SpaceKind::Main, Some(release), name),
                    )
                    .with_all(
                        sources
                            .iter()
                            .filter(|p| !p.ends_with(MODULE_INFO_JAVA))
                            .map(|p| p.display().to_string()),
                    );
            }
            javac = javac.with_all(tweaks.args("javac", Some(name), Some(release)));
            calls.push((release, javac));
        }
        Ok(calls)
    }

    /// Multi-release archive: base classes first, then one `--release`
    /// group per targeted release.
    fn archive_main(&self, module: &DeclaredModule, compiled: &[u32], tweaks: &Tweaks) -> ToolCall {
        let name = module.name();
        let version = self.project().module_version(name);
        let mut jar = ToolCall::new("jar")
            .with("--create")
            .with_path("--file", &self.layout().jar(SpaceKind::Main, name, &version))
            .with_option("--module-version", version.as_str());
        if let Some(main_class) = module.descriptor().main_class() {
            jar = jar.with_option("--main-class", main_class);
        }
        jar = jar
            .with_path("-C", &self.layout().module_classes(SpaceKind::Main, None, name))
            .with(".");
        for resources in module.resources().base() {
            jar = jar.with_path("-C", &resources.path).with(".");
        }

        let mut releases: Vec<u32> = compiled.to_vec();
        releases.extend(module.resources().targeted().map(|f| f.release));
        releases.sort_unstable();
        releases.dedup();
        for release in releases {
            jar = jar.with_option("--release", release.to_string());
            if compiled.contains(&release) {
                jar = jar
                    .with_path(
                        "-C",
                        &self.layout().module_classes(SpaceKind::Main, Some(release), name),
                    )
                    .with(".");
            }
            for resources in module.resources().list().iter().filter(|f| f.release == release) {
                jar = jar.with_path("-C", &resources.path).with(".");
            }
        }
        jar.with_all(tweaks.args("jar", Some(name), None))
    }

    /// `javadoc` over all modules, then an archive of the generated pages.
    fn document(&self, space: &CodeSpace, tweaks: &Tweaks) -> Result<Phase, ModuleError> {
        let api = self.layout().api_documentation();
        let mut javadoc = ToolCall::new("javadoc")
            .with_option("--module", space.modules.names().join(","));
        for entry in space.modules.to_module_source_paths(false)? {
            javadoc = javadoc.with_option("--module-source-path", entry);
        }
        let javadoc = javadoc
            .with_option("--module-path", join_paths(&[self.external_modules()]))
            .with_all(["-encoding", "UTF-8", "-quiet", "-Xdoclint:-missing"])
            .with_path("-d", &api)
            .with_all(tweaks.args("javadoc", None, None));
        let jar = ToolCall::new("jar")
            .with("--create")
            .with_path("--file", &self.layout().api_jar(self.project().name()))
            .with("--no-manifest")
            .with_path("-C", &api)
            .with(".");
        Ok(Phase::new(SpaceKind::Main, PhaseKind::Document, vec![javadoc, jar]).sequential())
    }

    /// `jlink` call when exactly one main module declares a main class.
    fn link(&self, space: &CodeSpace, tweaks: &Tweaks) -> Option<ToolCall> {
        let launchable: Vec<&DeclaredModule> = space
            .modules
            .modules()
            .filter(|m| m.descriptor().main_class().is_some())
            .collect();
        let module = match launchable.as_slice() {
            [module] => module.name(),
            [] => {
                tracing::warn!("no main module declares a main class, skipping runtime image");
                return None;
            }
            many => {
                let names: Vec<&str> = many.iter().map(|m| m.name()).collect();
                tracing::warn!(
                    "several main modules declare a main class ({}), skipping runtime image",
                    names.join(", ")
                );
                return None;
            }
        };
        let module_path = [self.layout().modules(SpaceKind::Main), self.external_modules()];
        Some(
            ToolCall::new("jlink")
                .with_option("--add-modules", module)
                .with_option("--module-path", join_paths(&module_path))
                .with_option("--launcher", format!("{}={}", self.project().name(), module))
                .with_path("--output", &self.layout().image())
                .with_all(tweaks.args("jlink", Some(module), None)),
        )
    }

    fn archive_test(&self, module: &DeclaredModule, tweaks: &Tweaks) -> ToolCall {
        let name = module.name();
        let version = self.project().module_version(name);
        let mut jar = ToolCall::new("jar")
            .with("--create")
            .with_path("--file", &self.layout().jar(SpaceKind::Test, name, &version))
            .with_option("--module-version", version.as_str())
            .with_path("-C", &self.layout().module_classes(SpaceKind::Test, None, name))
            .with(".");
        for resources in module.resources().base() {
            jar = jar.with_path("-C", &resources.path).with(".");
        }
        jar.with_all(tweaks.args("jar", Some(name), None))
    }

    /// Launch the test runner on one test module.
    ///
    /// The module path lists this module's test archive first, so it shadows
    /// a main module of the same name, followed by the main archives, the
    /// other test archives and the external modules.
    fn run_tests(&self, space: &CodeSpace, module: &DeclaredModule, tweaks: &Tweaks) -> ToolCall {
        let name = module.name();
        let jar = |m: &str| {
            self.layout()
                .jar(SpaceKind::Test, m, &self.project().module_version(m))
        };
        let mut scope = ModuleScope::new(name)
            .with_path(jar(name))
            .with_path(self.layout().modules(SpaceKind::Main));
        for other in space.modules.names() {
            if other != name {
                scope = scope.with_path(jar(&other));
            }
        }
        scope = scope.with_path(self.external_modules());

        ToolCall::new("junit")
            .with_option("--select-module", name)
            .with_path("--reports-dir", &self.layout().test_reports(name))
            .with_all(tweaks.args("junit", Some(name), None))
            .with_scope(scope)
    }
}

/// Java sources in a folder, sorted.
fn java_sources(folder: &SourceFolder) -> Result<Vec<PathBuf>, ModuleError> {
    files_with_extension(&folder.path, "java").map_err(|source| ModuleError::Io {
        path: folder.path.clone(),
        source,
    })
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use crate::core::finder::{find_declarations, DeclaredModuleFinder};
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn plan(project: &Project, options: &PlanOptions) -> BuildPlan {
        let layout = WorkspaceLayout::new("/w");
        let external = PathBuf::from("/x");
        SpacePlanBuilder::new(PlanContext {
            project,
            layout: &layout,
            external_modules: &external,
            options,
        })
        .plan()
        .unwrap()
    }

    fn scanned(root: &Path) -> DeclaredModuleFinder {
        let infos = find_declarations(root).unwrap();
        DeclaredModuleFinder::scan(root, &infos, true).unwrap()
    }

    #[test]
    fn test_sibling_modules_share_one_compile_call() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("com.greetings/module-info.java"),
            "module com.greetings { requires org.astro; }",
        );
        write(
            &tmp.path().join("com.greetings/com/greetings/Main.java"),
            "package com.greetings; public class Main {}",
        );
        write(&tmp.path().join("org.astro/module-info.java"), "module org.astro {}");
        let project = Project::new("greetings", tmp.path())
            .with_main(CodeSpace::new(SpaceKind::Main, scanned(tmp.path())));

        let plan = plan(&project, &PlanOptions::default());
        let javac = plan.calls_of(SpaceKind::Main, "javac");
        assert_eq!(javac.len(), 1);
        assert_eq!(javac[0].value_of("--module"), Some("com.greetings,org.astro"));
        assert_eq!(javac[0].count("--module-source-path"), 1);
        assert_eq!(
            javac[0].value_of("--module-source-path").map(String::from),
            Some(tmp.path().display().to_string())
        );
        assert_eq!(javac[0].value_of("-d"), Some("/w/classes/main/base"));

        let jars = plan.calls_of(SpaceKind::Main, "jar");
        assert_eq!(jars.len(), 2);
        assert_eq!(jars[0].value_of("--file"), Some("/w/modules/com.greetings@0-ea.jar"));
        assert_eq!(jars[0].value_of("--main-class"), Some("com.greetings.Main"));
        assert!(plan.phase(SpaceKind::Test, PhaseKind::Compile).is_none());
    }

    #[test]
    fn test_multi_release_module() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("m/main/java");
        write(&base.join("module-info.java"), "module m {}");
        write(&base.join("m/A.java"), "package m; class A {}");
        write(&tmp.path().join("m/main/java-11/m/A.java"), "package m; class A {}");
        write(&tmp.path().join("m/main/java-17/m/A.java"), "package m; class A {}");
        let module = DeclaredModule::of(tmp.path(), &base, false).unwrap();
        assert_eq!(module.sources().releases(), vec![11, 17]);

        let main = DeclaredModuleFinder::new([module]).unwrap();
        let project = Project::new("p", tmp.path())
            .with_version(Some("1.2".to_string()))
            .with_main(CodeSpace::new(SpaceKind::Main, main).with_release(Some(8)));
        let plan = plan(&project, &PlanOptions::default());

        let javac = plan.calls_of(SpaceKind::Main, "javac");
        assert_eq!(javac.len(), 3);
        assert_eq!(javac[0].value_of("--release"), Some("8"));
        assert_eq!(javac[1].value_of("--release"), Some("11"));
        assert_eq!(javac[1].value_of("--class-path"), Some("/w/classes/main/base/m"));
        assert_eq!(javac[1].value_of("-d"), Some("/w/classes/main/11/m"));
        assert_eq!(javac[2].value_of("--release"), Some("17"));
        assert!(javac[2]
            .args
            .last()
            .unwrap()
            .ends_with("java-17/m/A.java"));

        let jars = plan.calls_of(SpaceKind::Main, "jar");
        assert_eq!(jars.len(), 1);
        assert_eq!(jars[0].count("--release"), 2);
        assert_eq!(jars[0].value_of("--file"), Some("/w/modules/m@1.2.jar"));
        let args = jars[0].args.join(" ");
        assert!(args.contains(concat!(
            "-C /w/classes/main/base/m . ",
            "--release 11 -C /w/classes/main/11/m . ",
            "--release 17 -C /w/classes/main/17/m ."
        )));

        let kinds: Vec<PhaseKind> = plan.phases.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![PhaseKind::Compile, PhaseKind::CompileReleases, PhaseKind::Archive]
        );
    }

    #[test]
    fn test_targeted_module_info_compiles_in_module_mode() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("m/java");
        write(&base.join("module-info.java"), "module m {}");
        write(
            &tmp.path().join("m/java-11/module-info.java"),
            "module m { requires java.net.http; }",
        );
        write(&tmp.path().join("m/java-11/m/A.java"), "package m; class A {}");
        let module = DeclaredModule::of(tmp.path(), &base, false).unwrap();
        let project = Project::new("p", tmp.path()).with_main(CodeSpace::new(
            SpaceKind::Main,
            DeclaredModuleFinder::new([module]).unwrap(),
        ));

        let plan = plan(&project, &PlanOptions::default());
        let javac = plan.calls_of(SpaceKind::Main, "javac");
        assert_eq!(javac.len(), 2);
        assert_eq!(javac[1].value_of("--patch-module"), Some("m=/w/classes/main/base/m"));
        assert_eq!(javac[1].value_of("-d"), Some("/w/classes/main/11"));
    }

    #[test]
    fn test_test_space_patches_and_scopes() {
        let tmp = TempDir::new().unwrap();
        let main_info = tmp.path().join("m/main/java/module-info.java");
        let patch_info = tmp.path().join("m/test/java-module/module-info.java");
        let test_info = tmp.path().join("t/test/java/module-info.java");
        write(&main_info, "module m {}");
        write(&patch_info, "open module m { requires org.junit.jupiter.api; }");
        write(&test_info, "open module t { requires m; }");

        let declared = |info: &Path| DeclaredModule::of(tmp.path(), info, false).unwrap();
        let main = DeclaredModuleFinder::new([declared(&main_info)]).unwrap();
        let test =
            DeclaredModuleFinder::new([declared(&patch_info), declared(&test_info)]).unwrap();
        let project = Project::new("p", tmp.path())
            .with_main(CodeSpace::new(SpaceKind::Main, main))
            .with_test(CodeSpace::new(SpaceKind::Test, test));

        let mut options = PlanOptions::default();
        options.test_tweaks = Tweaks::new(
            [("junit(t)".to_string(), vec!["--fail-if-no-tests".to_string()])]
                .into_iter()
                .collect(),
        );
        let plan = plan(&project, &options);

        let javac = plan.calls_of(SpaceKind::Test, "javac");
        assert_eq!(javac.len(), 1);
        let patch = format!("m={}", tmp.path().join("m/main/java").display());
        assert_eq!(javac[0].value_of("--patch-module"), Some(patch.as_str()));
        assert_eq!(javac[0].value_of("--module-path"), Some("/w/modules:/x"));

        let runs = plan.calls_of(SpaceKind::Test, "junit");
        assert_eq!(runs.len(), 2);
        let scope = runs[0].scope.as_ref().unwrap();
        assert_eq!(scope.module, "m");
        assert_eq!(
            scope.module_path,
            vec![
                PathBuf::from("/w/modules-test/m@0-ea+test.jar"),
                PathBuf::from("/w/modules"),
                PathBuf::from("/w/modules-test/t@0-ea+test.jar"),
                PathBuf::from("/x"),
            ]
        );
        assert_eq!(runs[1].args.last().map(String::as_str), Some("--fail-if-no-tests"));

        // Main archives precede test compilation.
        let order: Vec<(SpaceKind, PhaseKind)> =
            plan.phases.iter().map(|p| (p.space, p.kind)).collect();
        assert_eq!(
            order,
            vec![
                (SpaceKind::Main, PhaseKind::Compile),
                (SpaceKind::Main, PhaseKind::Archive),
                (SpaceKind::Test, PhaseKind::Compile),
                (SpaceKind::Test, PhaseKind::Archive),
                (SpaceKind::Test, PhaseKind::Test),
            ]
        );
    }

    #[test]
    fn test_document_and_link() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("app/module-info.java"), "module app { requires lib; }");
        write(&tmp.path().join("app/app/Main.java"), "package app; class Main {}");
        write(&tmp.path().join("lib/module-info.java"), "module lib {}");
        let project = Project::new("demo", tmp.path())
            .with_main(CodeSpace::new(SpaceKind::Main, scanned(tmp.path())));
        let options = PlanOptions {
            document: true,
            link: true,
            ..Default::default()
        };
        let plan = plan(&project, &options);

        let document = plan.phase(SpaceKind::Main, PhaseKind::Document).unwrap();
        assert!(!document.parallel);
        assert_eq!(document.calls[0].tool, "javadoc");
        assert_eq!(document.calls[0].value_of("--module"), Some("app,lib"));
        assert_eq!(document.calls[1].value_of("--file"), Some("/w/documentation/demo-api.jar"));

        let link = &plan.phase(SpaceKind::Main, PhaseKind::Link).unwrap().calls[0];
        assert_eq!(link.value_of("--add-modules"), Some("app"));
        assert_eq!(link.value_of("--module-path"), Some("/w/modules:/x"));
        assert_eq!(link.value_of("--launcher"), Some("demo=app"));
        assert_eq!(link.value_of("--output"), Some("/w/image"));
    }

    #[test]
    fn test_link_skipped_without_single_main_class() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("lib/module-info.java"), "module lib {}");
        let project = Project::new("demo", tmp.path())
            .with_main(CodeSpace::new(SpaceKind::Main, scanned(tmp.path())));
        let options = PlanOptions {
            link: true,
            ..Default::default()
        };
        assert!(plan(&project, &options)
            .phase(SpaceKind::Main, PhaseKind::Link)
            .is_none());
    }
}
