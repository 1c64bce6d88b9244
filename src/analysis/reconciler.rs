use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{
    analysis::{
        aggregator::Aggregator,
        tree::{TreeSnapshot, INIT_FILE},
    },
    config::Config,
    core::{log, LogLevel},
    domain::format_symbol_list,
    parser::{types::*, Parser},
};

/// A structurally unusable `__all__` declaration. Per-file and recoverable:
/// the file is skipped, the run continues, and the process exits non-zero.
#[derive(Debug, PartialEq, Error)]
pub enum ExportListError {
    #[error("multiple __all__ declarations")]
    MultipleDeclarations,

    #[error("__all__ is not a literal list of string constants")]
    NotALiteralList,
}

/// What one reconciliation pass did: which files were rewritten (root-relative
/// paths) and how many candidates had structural errors.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub modified: Vec<PathBuf>,
    pub failures: usize,
}

/// Compares each candidate module's declared export list against the names
/// actually imported from it and accessed on it, reporting discrepancies and
/// synthesizing missing declarations.
pub struct Reconciler<'a> {
    tree: &'a TreeSnapshot,
    config: &'a Config,
    aggregator: &'a Aggregator,
}

impl<'a> Reconciler<'a> {
    pub fn new(tree: &'a TreeSnapshot, config: &'a Config, aggregator: &'a Aggregator) -> Self {
        Reconciler {
            tree,
            config,
            aggregator,
        }
    }

    pub fn reconcile(&self) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        for rel in self.aggregator.candidates() {
            self.reconcile_file(&rel, &mut outcome);
        }
        outcome
    }

    fn reconcile_file(&self, rel: &Path, outcome: &mut ReconcileOutcome) {
        if self.config.is_excluded(rel) {
            return;
        }
        if let Some(top) = rel.components().next() {
            let top = top.as_os_str().to_string_lossy();
            if self.config.excludes_toplevel(&top) {
                return;
            }
        }

        let full = self.tree.root().join(rel);
        let text = match fs::read_to_string(&full) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("failed to read {}: {e}", rel.display());
                return;
            }
        };
        let ast = match Parser::from_text(&text).and_then(|mut p| p.parse()) {
            Ok(ast) => ast,
            Err(e) => {
                eprintln!("failed to parse {}: {e}", rel.display());
                return;
            }
        };

        let declared = match find_export_list(&ast) {
            Ok(declared) => declared,
            Err(e) => {
                eprintln!("{}: {e}", rel.display());
                outcome.failures += 1;
                return;
            }
        };
        let declared_set: FxHashSet<String> = declared
            .iter()
            .flatten()
            .cloned()
            .collect();

        let from_names = self.aggregator.from_imports(rel);
        let attr_names = self.aggregator.attr_access(rel);

        let mut required = declared_set.clone();
        if let Some(names) = from_names {
            let is_init = rel.file_name().is_some_and(|n| n == INIT_FILE);
            for name in names {
                // Package-shadow: a from-imported name that is itself a
                // sibling submodule is already reachable as a package
                // attribute and never belongs in __all__.
                if is_init && self.shadows_submodule(rel, name) {
                    log(LogLevel::Debug, || {
                        format!("skipped adding {name} to {} (submodule)", rel.display())
                    });
                    continue;
                }
                required.insert(name.clone());
            }
        }
        if let Some(names) = attr_names {
            required.extend(names.iter().cloned());
        }
        required.remove("*");
        if required.is_empty() {
            return;
        }

        if declared.is_some() {
            let contains = |names: Option<&FxHashSet<String>>, symbol: &str| {
                names.is_some_and(|s| s.contains(symbol))
            };
            let mut unused: Vec<&String> = declared_set
                .iter()
                .filter(|s| !contains(from_names, s) && !contains(attr_names, s))
                .collect();
            unused.sort();
            for symbol in unused {
                println!("{}: unused symbol {symbol} in __all__", rel.display());
            }
        }

        let mut additions: Vec<String> = required.difference(&declared_set).cloned().collect();
        if additions.is_empty() {
            return;
        }
        additions.sort();

        if declared.is_some() {
            // Never rewrite an existing declaration; suggest the edit.
            println!("{}", rel.display());
            println!("ADD to __all__: {}", format_symbol_list(&additions));
            println!();
        } else {
            let new_text = format!("__all__ = {}\n{text}", format_symbol_list(&additions));
            if let Err(e) = fs::write(&full, new_text) {
                eprintln!("failed to write {}: {e}", rel.display());
                outcome.failures += 1;
                return;
            }
            outcome.modified.push(rel.to_path_buf());
        }
    }

    fn shadows_submodule(&self, init_rel: &Path, name: &str) -> bool {
        let dir = init_rel.parent().unwrap_or_else(|| Path::new(""));
        let base = dir.join(name);
        self.tree.is_file(&base.with_extension("py")) || self.tree.is_dir(&base)
    }
}

/// Finds the module's top-level `__all__` declaration, if any, and its symbol
/// names. A second declaration, a chained assignment, a non-literal value, or
/// a non-string element is a structural error.
pub fn find_export_list(ast: &Ast) -> Result<Option<Vec<String>>, ExportListError> {
    let mut found: Option<Vec<String>> = None;
    for stmt in ast {
        let Statement::Assign { targets, value } = stmt else {
            continue;
        };
        let Some(Expr::Name(name)) = targets.first() else {
            continue;
        };
        if name != "__all__" {
            continue;
        }
        if found.is_some() {
            return Err(ExportListError::MultipleDeclarations);
        }
        if targets.len() != 1 {
            return Err(ExportListError::NotALiteralList);
        }
        let elements = match value {
            Expr::List(elements) | Expr::Tuple(elements) => elements,
            _ => return Err(ExportListError::NotALiteralList),
        };
        let mut names = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Expr::StringLiteral(symbol) => names.push(symbol.clone()),
                _ => return Err(ExportListError::NotALiteralList),
            }
        }
        found = Some(names);
    }
    Ok(found)
}

/// Fire-and-forget launch of an editor on every rewritten file. The command
/// comes from `$IDE`, falling back to a generic opener. Injected into the run
/// driver so tests and library callers can leave it out entirely.
#[derive(Debug, Clone)]
pub struct EditorHook {
    command: String,
}

impl EditorHook {
    pub fn from_env() -> Self {
        EditorHook {
            command: env::var("IDE").unwrap_or_else(|_| "xdg-open".to_string()),
        }
    }

    /// Spawns the editor with the absolute paths of `rel_paths` and does not
    /// wait for it. A launch failure is reported; the analysis already
    /// written to disk stands either way.
    pub fn open(&self, root: &Path, rel_paths: &[PathBuf]) {
        if rel_paths.is_empty() {
            return;
        }
        let mut cmd = Command::new(&self.command);
        for rel in rel_paths {
            cmd.arg(root.join(rel));
        }
        let spawned = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            eprintln!("failed to launch {}: {e}", self.command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{collector::FileUsage, tree::tests::fixture},
        config::Config,
    };
    use rustc_hash::FxHashMap;

    fn aggregate(from: &[(&str, &[&str])], attrs: &[(&str, &[&str])]) -> Aggregator {
        let mut from_imports: FxHashMap<PathBuf, rustc_hash::FxHashSet<String>> =
            FxHashMap::default();
        for (path, names) in from {
            from_imports.insert(
                PathBuf::from(path),
                names.iter().map(|n| n.to_string()).collect(),
            );
        }
        let mut attr_access = vec![];
        for (path, names) in attrs {
            for name in *names {
                attr_access.push((name.to_string(), PathBuf::from(path)));
            }
        }
        let mut aggregator = Aggregator::new();
        aggregator.absorb(FileUsage {
            from_imports,
            attr_access,
        });
        aggregator
    }

    fn parse_decls(source: &str) -> Result<Option<Vec<String>>, ExportListError> {
        let ast = Parser::from_text(source)
            .and_then(|mut p| p.parse())
            .expect("test source must parse");
        find_export_list(&ast)
    }

    #[test]
    fn finds_a_literal_declaration() {
        assert_eq!(
            parse_decls("__all__ = [\"a\", \"b\"]\nx = 1\n"),
            Ok(Some(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(
            parse_decls("__all__ = (\"a\",)\n"),
            Ok(Some(vec!["a".to_string()]))
        );
        assert_eq!(parse_decls("x = 1\n"), Ok(None));
    }

    #[test]
    fn malformed_declarations_are_errors() {
        assert_eq!(
            parse_decls("__all__ = [\"a\"]\n__all__ = [\"b\"]\n"),
            Err(ExportListError::MultipleDeclarations)
        );
        assert_eq!(
            parse_decls("__all__ = compute()\n"),
            Err(ExportListError::NotALiteralList)
        );
        assert_eq!(
            parse_decls("__all__ = [\"a\", name]\n"),
            Err(ExportListError::NotALiteralList)
        );
        assert_eq!(
            parse_decls("__all__ = names = [\"a\"]\n"),
            Err(ExportListError::NotALiteralList)
        );
    }

    #[test]
    fn synthesizes_a_sorted_declaration() {
        let (tmp, tree) = fixture(&["mod.py=value = 1\n"]);
        let config = Config::default();
        let aggregator = aggregate(&[("mod.py", &["b", "a"])], &[("mod.py", &["c"])]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert_eq!(outcome.modified, vec![PathBuf::from("mod.py")]);
        assert_eq!(outcome.failures, 0);

        let text = fs::read_to_string(tmp.path().join("mod.py")).unwrap();
        assert_eq!(text, "__all__ = [\"a\", \"b\", \"c\"]\nvalue = 1\n");
    }

    #[test]
    fn consistent_declaration_is_left_alone() {
        let source = "mod.py=__all__ = [\"a\", \"b\"]\n";
        let (tmp, tree) = fixture(&[source]);
        let config = Config::default();
        let aggregator = aggregate(&[("mod.py", &["a"])], &[("mod.py", &["b"])]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert!(outcome.modified.is_empty());
        assert_eq!(outcome.failures, 0);

        let text = fs::read_to_string(tmp.path().join("mod.py")).unwrap();
        assert_eq!(text, "__all__ = [\"a\", \"b\"]\n");
    }

    #[test]
    fn missing_names_are_suggested_not_rewritten() {
        let (tmp, tree) = fixture(&["mod.py=__all__ = [\"a\"]\n"]);
        let config = Config::default();
        let aggregator = aggregate(&[("mod.py", &["a", "b"])], &[]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert!(outcome.modified.is_empty());

        let text = fs::read_to_string(tmp.path().join("mod.py")).unwrap();
        assert_eq!(text, "__all__ = [\"a\"]\n");
    }

    #[test]
    fn unused_symbols_are_reported_without_removal() {
        let (tmp, tree) = fixture(&["mod.py=__all__ = [\"x\", \"y\"]\n"]);
        let config = Config::default();
        let aggregator = aggregate(&[("mod.py", &["x"])], &[]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert!(outcome.modified.is_empty());
        assert_eq!(outcome.failures, 0);

        let text = fs::read_to_string(tmp.path().join("mod.py")).unwrap();
        assert!(text.contains("\"y\""));
    }

    #[test]
    fn package_shadow_names_are_excluded() {
        let (tmp, tree) = fixture(&["pkg/__init__.py", "pkg/util.py", "pkg/sub/x.py"]);
        let config = Config::default();
        let aggregator = aggregate(&[("pkg/__init__.py", &["util", "sub", "helper"])], &[]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert_eq!(outcome.modified, vec![PathBuf::from("pkg/__init__.py")]);

        let text = fs::read_to_string(tmp.path().join("pkg/__init__.py")).unwrap();
        assert_eq!(text, "__all__ = [\"helper\"]\n");
    }

    #[test]
    fn malformed_file_is_skipped_and_counted() {
        let (tmp, tree) = fixture(&[
            "bad.py=__all__ = compute()\n",
            "good.py=x = 1\n",
        ]);
        let config = Config::default();
        let aggregator = aggregate(&[("bad.py", &["a"]), ("good.py", &["b"])], &[]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert_eq!(outcome.failures, 1);
        assert_eq!(outcome.modified, vec![PathBuf::from("good.py")]);

        let bad = fs::read_to_string(tmp.path().join("bad.py")).unwrap();
        assert_eq!(bad, "__all__ = compute()\n");
    }

    #[test]
    fn excluded_candidates_are_skipped() {
        let (tmp, tree) = fixture(&["gen/mod.py=x = 1\n", "vendor/mod.py=x = 1\n"]);
        let config = Config::for_tests(&["gen/"], &["vendor"]);
        let aggregator = aggregate(&[("gen/mod.py", &["a"]), ("vendor/mod.py", &["b"])], &[]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert!(outcome.modified.is_empty());

        let text = fs::read_to_string(tmp.path().join("gen/mod.py")).unwrap();
        assert_eq!(text, "x = 1\n");
    }

    #[test]
    fn wildcard_marker_is_discarded() {
        let (tmp, tree) = fixture(&["mod.py=x = 1\n"]);
        let config = Config::default();
        let aggregator = aggregate(&[("mod.py", &["*"])], &[]);

        let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
        assert!(outcome.modified.is_empty());

        let text = fs::read_to_string(tmp.path().join("mod.py")).unwrap();
        assert_eq!(text, "x = 1\n");
    }
}
