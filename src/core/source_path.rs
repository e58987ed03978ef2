//! Module source path expressions handed to `javac --module-source-path`.
//!
//! Two forms exist. The pattern form is one shared expression in which the
//! path element naming a module is replaced by `*`; it covers any number of
//! modules. The module-specific form is `name=path[:path...]` and works for
//! any layout. Modules whose paths cannot be reduced to a pattern fall back to
//! the specific form individually.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};

/// Separator between entries of a path list.
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

/// Join paths with the platform path-list separator.
pub fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// Reduce `path` to the pattern form for `module`.
///
/// Returns `None` when no element of the path equals the module name.
pub fn to_pattern_form(path: &Path, module: &str) -> Option<String> {
    let mut elements: Vec<String> = Vec::new();
    let mut found = false;
    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::RootDir => elements.push(String::new()),
            Component::Prefix(prefix) => {
                elements.push(prefix.as_os_str().to_string_lossy().into_owned())
            }
            Component::ParentDir => elements.push("..".to_string()),
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                if name == "module-info.java" {
                    continue;
                }
                if name == module {
                    found = true;
                    elements.push("*".to_string());
                } else {
                    elements.push(name.into_owned());
                }
            }
        }
    }
    if !found {
        return None;
    }
    let pattern = elements.join(MAIN_SEPARATOR_STR);
    if pattern == "*" {
        return Some(".".to_string());
    }
    let suffix = format!("{}*", MAIN_SEPARATOR_STR);
    if let Some(stripped) = pattern.strip_suffix(&suffix) {
        return Some(stripped.to_string());
    }
    if pattern.starts_with('*') {
        return Some(format!(".{}{}", MAIN_SEPARATOR_STR, pattern));
    }
    Some(pattern)
}

/// Render the module-specific form `name=path[:path...]`.
pub fn to_specific_form(module: &str, paths: &[PathBuf]) -> String {
    format!("{}={}", module, join_paths(paths))
}

/// Compute `--module-source-path` values for a name to paths mapping.
///
/// All reducible modules share one leading entry (sorted patterns joined by
/// the path separator); every other module gets its own specific-form entry,
/// sorted by name. With `force_specific` every module uses the specific form.
pub fn compute(map: &BTreeMap<String, Vec<PathBuf>>, force_specific: bool) -> Vec<String> {
    let mut patterns = BTreeSet::new();
    let mut specific = Vec::new();
    for (name, paths) in map {
        if force_specific {
            specific.push(to_specific_form(name, paths));
            continue;
        }
        let reduced: Option<Vec<String>> =
            paths.iter().map(|p| to_pattern_form(p, name)).collect();
        match reduced {
            Some(forms) if !forms.is_empty() => patterns.extend(forms),
            _ => specific.push(to_specific_form(name, paths)),
        }
    }
    let mut entries = Vec::with_capacity(specific.len() + 1);
    if !patterns.is_empty() {
        entries.push(patterns.into_iter().collect::<Vec<_>>().join(PATH_SEPARATOR));
    }
    entries.extend(specific);
    entries
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_form_variants() {
        assert_eq!(to_pattern_form(Path::new("foo"), "foo").as_deref(), Some("."));
        assert_eq!(
            to_pattern_form(Path::new("src/foo"), "foo").as_deref(),
            Some("src")
        );
        assert_eq!(
            to_pattern_form(Path::new("foo/main/java"), "foo").as_deref(),
            Some("./*/main/java")
        );
        assert_eq!(
            to_pattern_form(Path::new("./src/foo/main/java"), "foo").as_deref(),
            Some("src/*/main/java")
        );
        assert_eq!(
            to_pattern_form(Path::new("/abs/foo/java"), "foo").as_deref(),
            Some("/abs/*/java")
        );
        assert_eq!(to_pattern_form(Path::new("src/main/java"), "foo"), None);
    }

    #[test]
    fn test_sibling_modules_share_one_pattern() {
        let mut map = BTreeMap::new();
        map.insert("com.greetings".to_string(), vec![PathBuf::from("ROOT/com.greetings")]);
        map.insert("org.astro".to_string(), vec![PathBuf::from("ROOT/org.astro")]);
        assert_eq!(compute(&map, false), vec!["ROOT".to_string()]);
    }

    #[test]
    fn test_irregular_layout_falls_back_per_module() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![PathBuf::from("src/a/main/java")]);
        map.insert("b".to_string(), vec![PathBuf::from("src/b/main/java")]);
        map.insert("c".to_string(), vec![PathBuf::from("lib/java"), PathBuf::from("lib/java-9")]);
        assert_eq!(
            compute(&map, false),
            vec!["src/*/main/java".to_string(), "c=lib/java:lib/java-9".to_string()]
        );
    }

    #[test]
    fn test_forced_specific_form() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), vec![PathBuf::from("b")]);
        map.insert("a".to_string(), vec![PathBuf::from("a")]);
        assert_eq!(compute(&map, true), vec!["a=a".to_string(), "b=b".to_string()]);
    }

    #[test]
    fn test_distinct_patterns_are_joined() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![PathBuf::from("src/a/java")]);
        map.insert("b".to_string(), vec![PathBuf::from("etc/b/java")]);
        assert_eq!(compute(&map, false), vec!["etc/*/java:src/*/java".to_string()]);
    }
}
