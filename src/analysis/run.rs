use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    analysis::{
        aggregator::Aggregator,
        collector::Collector,
        reconciler::{EditorHook, Reconciler},
        resolver::Resolver,
        tree::TreeSnapshot,
    },
    config::{Config, ConfigError},
    core::{log, LogLevel},
    parser::Parser,
};

/// Errors that abort a run before any analysis happens. Everything past
/// startup degrades per file instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot scan {0}: {1}")]
    Scan(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct RunOptions {
    pub scan_dir: PathBuf,
    /// Post-run hook for rewritten files; `None` disables it (tests, library
    /// callers).
    pub editor: Option<EditorHook>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub root: PathBuf,
    /// Root-relative paths of files whose export list was synthesized.
    pub modified: Vec<PathBuf>,
    /// Candidates with structural export-list errors; non-zero means the
    /// process should exit unsuccessfully.
    pub failures: usize,
}

/// One full batch: discover the root and config, snapshot the tree, collect
/// usage from every source file under the scan directory, reconcile, and
/// finally hand rewritten files to the editor hook.
pub fn run(options: &RunOptions) -> Result<RunOutcome, RunError> {
    let scan_dir = options
        .scan_dir
        .canonicalize()
        .map_err(|e| RunError::Scan(options.scan_dir.clone(), e))?;
    let (root, config) = Config::discover(&scan_dir)?;
    println!("Root Dir: {}", root.display());

    let tree = TreeSnapshot::build(&root).map_err(|e| RunError::Scan(root.clone(), e))?;
    let scan_rel = scan_dir
        .strip_prefix(&root)
        .unwrap_or_else(|_| Path::new(""))
        .to_path_buf();

    let mut resolver = Resolver::new(&tree, &config);
    let mut aggregator = Aggregator::new();
    for rel in tree.py_files() {
        if !rel.starts_with(&scan_rel) {
            continue;
        }
        if config.is_excluded(&rel) {
            continue;
        }
        let text = match fs::read_to_string(tree.root().join(&rel)) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("failed to read {}: {e}", rel.display());
                continue;
            }
        };
        let ast = match Parser::from_text(&text).and_then(|mut p| p.parse()) {
            Ok(ast) => ast,
            Err(e) => {
                eprintln!("failed to parse {}: {e}", rel.display());
                continue;
            }
        };
        log(LogLevel::Info, || format!("collected {}", rel.display()));
        let rel_dir = rel.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        aggregator.absorb(Collector::collect(&mut resolver, &rel_dir, &ast));
    }

    let outcome = Reconciler::new(&tree, &config, &aggregator).reconcile();
    if let Some(editor) = &options.editor {
        editor.open(tree.root(), &outcome.modified);
    }

    Ok(RunOutcome {
        root,
        modified: outcome.modified,
        failures: outcome.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tree::tests::fixture;

    fn run_in(dir: &Path) -> RunOutcome {
        run(&RunOptions {
            scan_dir: dir.to_path_buf(),
            editor: None,
        })
        .expect("run")
    }

    #[test]
    fn end_to_end_synthesis() {
        let (tmp, _tree) = fixture(&[
            "pyproject.toml=",
            "pkg/__init__.py=",
            "pkg/util.py=",
            "app.py=from pkg import helper\nfrom pkg.util import thing\nimport pkg as alias\nalias.extra\n",
        ]);

        let outcome = run_in(tmp.path());
        assert_eq!(outcome.failures, 0);
        assert_eq!(
            outcome.modified,
            vec![PathBuf::from("pkg/__init__.py"), PathBuf::from("pkg/util.py")]
        );

        let init = fs::read_to_string(tmp.path().join("pkg/__init__.py")).unwrap();
        assert_eq!(init, "__all__ = [\"extra\", \"helper\"]\n");
        let util = fs::read_to_string(tmp.path().join("pkg/util.py")).unwrap();
        assert_eq!(util, "__all__ = [\"thing\"]\n");
    }

    #[test]
    fn second_pass_is_idempotent() {
        let (tmp, _tree) = fixture(&[
            "pyproject.toml=",
            "pkg/__init__.py=",
            "app.py=from pkg import helper\n",
        ]);

        let first = run_in(tmp.path());
        assert_eq!(first.modified, vec![PathBuf::from("pkg/__init__.py")]);
        let after_first = fs::read_to_string(tmp.path().join("pkg/__init__.py")).unwrap();

        let second = run_in(tmp.path());
        assert!(second.modified.is_empty());
        assert_eq!(second.failures, 0);
        let after_second = fs::read_to_string(tmp.path().join("pkg/__init__.py")).unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn excluded_paths_are_not_collected() {
        let (tmp, _tree) = fixture(&[
            "pyproject.toml=[tool.exportsync]\nexclude = [\"gen/\"]\n",
            "pkg/__init__.py=",
            "gen/app.py=from pkg import helper\n",
        ]);

        let outcome = run_in(tmp.path());
        assert!(outcome.modified.is_empty());
        let init = fs::read_to_string(tmp.path().join("pkg/__init__.py")).unwrap();
        assert_eq!(init, "");
    }

    #[test]
    fn unparsable_file_does_not_block_the_run() {
        let (tmp, _tree) = fixture(&[
            "pyproject.toml=",
            "pkg/__init__.py=",
            "broken.py=def f(:\n",
            "app.py=from pkg import helper\n",
        ]);

        let outcome = run_in(tmp.path());
        assert_eq!(outcome.failures, 0);
        assert_eq!(outcome.modified, vec![PathBuf::from("pkg/__init__.py")]);
    }

    #[test]
    fn malformed_export_list_sets_failure_status() {
        let (tmp, _tree) = fixture(&[
            "pyproject.toml=",
            "mod.py=__all__ = compute()\n",
            "app.py=from mod import helper\n",
        ]);

        let outcome = run_in(tmp.path());
        assert_eq!(outcome.failures, 1);
        assert!(outcome.modified.is_empty());
    }

    #[test]
    fn missing_scan_dir_is_a_startup_error() {
        let result = run(&RunOptions {
            scan_dir: PathBuf::from("/definitely/not/a/real/dir"),
            editor: None,
        });
        assert!(matches!(result, Err(RunError::Scan(_, _))));
    }
}
