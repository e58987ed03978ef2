//! Scanning a project directory for module declarations.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::finder::{find_declarations, DeclaredModuleFinder};
use crate::core::project::Project;
use crate::core::space::{CodeSpace, SpaceKind, SpaceSelector};
use crate::util::config::Config;

/// Read every declaration below `root` and sort it into the main or test space.
///
/// Declarations no space selects are ignored.
pub fn scan_project(root: &Path, config: &Config) -> Result<Project> {
    let selector = SpaceSelector::new(&config.main.patterns, &config.test.patterns)
        .context("invalid space pattern in configuration")?;

    let mut main = Vec::new();
    let mut test = Vec::new();
    for info in find_declarations(root)? {
        let relative = info.strip_prefix(root).unwrap_or(&info);
        match selector.classify(relative) {
            Some(SpaceKind::Main) => main.push(info),
            Some(SpaceKind::Test) => test.push(info),
            None => tracing::debug!("{} belongs to no space", relative.display()),
        }
    }

    let infer = config.main.infer_main_class;
    let main = DeclaredModuleFinder::scan(root, &main, infer)?;
    let test = DeclaredModuleFinder::scan(root, &test, false)?;
    tracing::debug!("found {} main and {} test module(s)", main.len(), test.len());

    Ok(Project::new(project_name(root, config), root)
        .with_version(config.project.version.clone())
        .with_main(CodeSpace::new(SpaceKind::Main, main).with_release(config.main.release))
        .with_test(CodeSpace::new(SpaceKind::Test, test).with_release(config.main.release)))
}

fn project_name(root: &Path, config: &Config) -> String {
    config
        .project
        .name
        .clone()
        .or_else(|| {
            root.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "project".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ModuleError;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_scan_sorts_spaces() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "com.greetings/main/java/module-info.java",
            "module com.greetings { requires org.astro; }",
        );
        write(
            tmp.path(),
            "org.astro/main/java/module-info.java",
            "module org.astro { exports org.astro; }",
        );
        write(
            tmp.path(),
            "com.greetings/test/java/module-info.java",
            "open module com.greetings { requires org.junit.jupiter.api; }",
        );

        let config = Config::parse("[project]\nversion = \"1.2\"\n").unwrap();
        let project = scan_project(tmp.path(), &config).unwrap();
        assert_eq!(project.main().modules.names(), vec!["com.greetings", "org.astro"]);
        assert_eq!(project.test().modules.names(), vec!["com.greetings"]);
        assert_eq!(project.version(), Some("1.2"));
        assert_eq!(
            project.name(),
            tmp.path().file_name().unwrap().to_string_lossy()
        );
    }

    #[test]
    fn test_scan_configured_name_and_release() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/module-info.java", "module a {}");
        let config = Config::parse("[project]\nname = \"demo\"\n[main]\nrelease = 17\n").unwrap();
        let project = scan_project(tmp.path(), &config).unwrap();
        assert_eq!(project.name(), "demo");
        assert_eq!(project.main().release, Some(17));
        assert!(project.test().is_empty());
    }

    #[test]
    fn test_scan_reports_duplicates() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "one/a/module-info.java", "module a {}");
        write(tmp.path(), "two/a/module-info.java", "module a {}");
        let err = scan_project(tmp.path(), &Config::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModuleError>(),
            Some(ModuleError::DuplicateModuleName { .. })
        ));
    }
}
