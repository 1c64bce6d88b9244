use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::{
    analysis::tree::{TreeSnapshot, INIT_FILE},
    config::Config,
    core::{log, LogLevel},
    domain::{is_stdlib_module, ModuleName},
};

/// Maps dotted module references to on-disk files, mimicking the host
/// language's import search: sibling names at the referencing directory make
/// a reference relative, anything else is taken from the project root.
///
/// Results are memoized per (reference, referencing directory); the snapshot
/// never changes during a run, so a cached miss stays a miss.
pub struct Resolver<'a> {
    tree: &'a TreeSnapshot,
    config: &'a Config,
    cache: FxHashMap<(String, PathBuf), Option<PathBuf>>,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a TreeSnapshot, config: &'a Config) -> Self {
        Resolver {
            tree,
            config,
            cache: FxHashMap::default(),
        }
    }

    /// Resolves `reference` as seen from `rel_dir` (root-relative). Returns
    /// the root-relative path of the backing file, or `None` when the
    /// reference does not land on a file in the tree. Misses emit a stderr
    /// diagnostic unless `silent`.
    pub fn resolve(
        &mut self,
        reference: &ModuleName,
        rel_dir: &Path,
        silent: bool,
    ) -> Option<PathBuf> {
        if reference.is_empty() {
            return None;
        }
        let key = (reference.as_str(), rel_dir.to_path_buf());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let resolved = self.resolve_uncached(reference, rel_dir, silent);
        log(LogLevel::Trace, || {
            format!("resolve {reference} from {:?} -> {resolved:?}", rel_dir)
        });
        self.cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_uncached(
        &self,
        reference: &ModuleName,
        rel_dir: &Path,
        silent: bool,
    ) -> Option<PathBuf> {
        let head = reference.head()?;
        if is_stdlib_module(head) {
            return None;
        }
        if self.config.excludes_toplevel(head) {
            return None;
        }

        // A first component naming a sibling file or subdirectory makes the
        // whole reference relative to the referencing directory.
        let sibling = self.tree.entries(rel_dir).is_some_and(|entries| {
            let with_ext = format!("{head}.py");
            entries.files.iter().any(|f| f == head || *f == with_ext)
                || entries.subdirs.iter().any(|d| d == head)
        });

        let mut candidate = PathBuf::new();
        if sibling {
            candidate.push(rel_dir);
        }
        for segment in reference.segments() {
            candidate.push(segment);
        }

        if self.tree.is_dir(&candidate) {
            let init = candidate.join(INIT_FILE);
            if self.tree.is_file(&init) {
                return Some(init);
            }
            // A directory without an init file is not importable.
            return None;
        }

        let file = candidate.with_extension("py");
        if self.tree.is_file(&file) {
            return Some(file);
        }

        if !silent {
            eprintln!(
                "Unknown module {reference}: path_rel={}, used in {}",
                candidate.display(),
                rel_dir.display()
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tree::tests::fixture;

    fn resolve_one(
        tree: &TreeSnapshot,
        config: &Config,
        reference: &str,
        rel_dir: &str,
    ) -> Option<PathBuf> {
        let mut resolver = Resolver::new(tree, config);
        resolver.resolve(&ModuleName::from_dotted(reference), Path::new(rel_dir), true)
    }

    #[test]
    fn stdlib_references_stay_unresolved() {
        let (_tmp, tree) = fixture(&["os.py", "json.py"]);
        let config = Config::default();

        // The stdlib check wins even when a same-named sibling file exists.
        assert_eq!(resolve_one(&tree, &config, "os", ""), None);
        assert_eq!(resolve_one(&tree, &config, "json.decoder", ""), None);
    }

    #[test]
    fn excluded_toplevel_stays_unresolved() {
        let (_tmp, tree) = fixture(&["vendor/__init__.py", "vendor/blob.py"]);
        let config = Config::for_tests(&[], &["vendor"]);

        assert_eq!(resolve_one(&tree, &config, "vendor", ""), None);
        assert_eq!(resolve_one(&tree, &config, "vendor.blob", ""), None);
    }

    #[test]
    fn absolute_reference_from_root() {
        let (_tmp, tree) = fixture(&["pkg/__init__.py", "pkg/util.py"]);
        let config = Config::default();

        assert_eq!(
            resolve_one(&tree, &config, "pkg.util", "app"),
            Some(PathBuf::from("pkg/util.py"))
        );
    }

    #[test]
    fn package_reference_prefers_init_file() {
        let (_tmp, tree) = fixture(&["pkg/__init__.py", "pkg/util.py", "bare/stuff.py"]);
        let config = Config::default();

        assert_eq!(
            resolve_one(&tree, &config, "pkg", ""),
            Some(PathBuf::from("pkg/__init__.py"))
        );
        // A directory without an init file is not importable.
        assert_eq!(resolve_one(&tree, &config, "bare", ""), None);
    }

    #[test]
    fn sibling_match_makes_reference_relative() {
        let (_tmp, tree) = fixture(&["pkg/__init__.py", "pkg/util.py", "pkg/sub/mod.py"]);
        let config = Config::default();

        assert_eq!(
            resolve_one(&tree, &config, "util", "pkg"),
            Some(PathBuf::from("pkg/util.py"))
        );
        assert_eq!(
            resolve_one(&tree, &config, "sub.mod", "pkg"),
            Some(PathBuf::from("pkg/sub/mod.py"))
        );
    }

    #[test]
    fn unknown_reference_is_unresolved() {
        let (_tmp, tree) = fixture(&["pkg/util.py"]);
        let config = Config::default();

        assert_eq!(resolve_one(&tree, &config, "nope", ""), None);
        assert_eq!(resolve_one(&tree, &config, "", ""), None);
    }

    #[test]
    fn repeated_calls_are_stable() {
        let (_tmp, tree) = fixture(&["pkg/__init__.py", "pkg/util.py"]);
        let config = Config::default();
        let mut resolver = Resolver::new(&tree, &config);

        let reference = ModuleName::from_dotted("pkg.util");
        let first = resolver.resolve(&reference, Path::new(""), true);
        let second = resolver.resolve(&reference, Path::new(""), true);
        assert_eq!(first, second);
        assert_eq!(first, Some(PathBuf::from("pkg/util.py")));
    }
}
